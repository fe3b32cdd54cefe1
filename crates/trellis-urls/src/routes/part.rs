use super::{AssembleOptions, Route};
use crate::{Params, Result, RouteMatch, RouteStack, RoutingError};
use tracing::trace;

/// Matches a base route and delegates the remainder to a child stack.
///
/// A part route succeeds on its own only when `may_terminate` is set and the
/// base route consumed the whole path. Otherwise one of the child routes has
/// to consume exactly the rest of the path; its match is merged into the base
/// match and tagged with the child's name.
#[derive(Debug)]
pub struct Part {
	route: Box<dyn Route>,
	may_terminate: bool,
	children: RouteStack,
}

impl Part {
	/// # Examples
	///
	/// ```
	/// use trellis_urls::{Literal, Part, Route, RouteStack, Segment};
	///
	/// let mut children = RouteStack::new();
	/// children.add_route("post", Segment::new("/:slug").unwrap());
	/// let blog = Part::new(Literal::new("/blog"), true, children);
	///
	/// let m = blog.match_path("/blog/hello", 0).unwrap();
	/// assert_eq!(m.matched_route_name(), Some("post"));
	/// assert_eq!(m.length(), 11);
	/// assert!(blog.match_path("/blog", 0).is_some());
	/// ```
	pub fn new(route: impl Route + 'static, may_terminate: bool, children: RouteStack) -> Self {
		Self::from_boxed(Box::new(route), may_terminate, children)
	}

	pub fn from_boxed(route: Box<dyn Route>, may_terminate: bool, children: RouteStack) -> Self {
		Self {
			route,
			may_terminate,
			children,
		}
	}

	pub fn may_terminate(&self) -> bool {
		self.may_terminate
	}

	pub fn children(&self) -> &RouteStack {
		&self.children
	}
}

impl Route for Part {
	fn match_path(&self, path: &str, offset: usize) -> Option<RouteMatch> {
		let mut base = self.route.match_path(path, offset)?;
		let next_offset = offset + base.length();

		if self.may_terminate && next_offset == path.len() {
			return Some(base);
		}

		for (name, child) in self.children.iter() {
			let Some(sub) = child.match_path(path, next_offset) else {
				continue;
			};
			if next_offset + sub.length() == path.len() {
				trace!(child = %name, "part route matched child");
				base.merge(sub);
				base.set_matched_route_name(name);
				return Some(base);
			}
		}

		None
	}

	fn assemble(&self, params: &Params, options: AssembleOptions<'_>) -> Result<String> {
		let Some(child_path) = options.child.filter(|c| !c.is_empty()) else {
			if !self.may_terminate {
				return Err(RoutingError::NonTerminating);
			}
			return self.route.assemble(
				params,
				AssembleOptions {
					child: None,
					has_child: options.has_child,
				},
			);
		};

		let (child_name, rest) = match child_path.split_once('/') {
			Some((head, tail)) => (head, Some(tail)),
			None => (child_path, None),
		};
		let child = self
			.children
			.get(child_name)
			.ok_or_else(|| RoutingError::UnknownRoute(child_name.to_string()))?;

		let mut url = self.route.assemble(
			params,
			AssembleOptions {
				child: None,
				has_child: true,
			},
		)?;
		url.push_str(&child.assemble(
			params,
			AssembleOptions {
				child: rest,
				has_child: options.has_child,
			},
		)?);
		Ok(url)
	}
}
