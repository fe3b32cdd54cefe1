//! Named, prioritized collection of routes.

use crate::routes::{AssembleOptions, Route};
use crate::{Params, Result, RouteMatch, RoutingError};
use trellis_http::Request;
use tracing::{debug, trace};

/// Priority given to routes added without an explicit one.
pub const DEFAULT_PRIORITY: i32 = 0;

#[derive(Debug)]
struct Entry {
	name: String,
	route: Box<dyn Route>,
	priority: i32,
}

/// Ordered set of named routes.
///
/// Routes are tried by descending priority; routes sharing a priority are
/// tried in the order they were added. Adding a route under an existing name
/// replaces it.
///
/// At the top level a route only matches when it consumes the whole path
/// after the base URL. Nested stacks inside [`Part`](crate::Part) routes are
/// walked by the part itself, which applies the same rule to the remainder.
#[derive(Debug, Default)]
pub struct RouteStack {
	entries: Vec<Entry>,
	base_url: String,
	default_params: Params,
}

impl RouteStack {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a route with [`DEFAULT_PRIORITY`].
	pub fn add_route(&mut self, name: impl Into<String>, route: impl Route + 'static) -> &mut Self {
		self.insert(name.into(), Box::new(route), DEFAULT_PRIORITY)
	}

	/// Adds a route that is tried before every route of lower priority.
	///
	/// # Examples
	///
	/// ```
	/// use trellis_urls::{Literal, RouteStack, Segment};
	///
	/// let mut stack = RouteStack::new();
	/// stack.add_route("generic", Segment::new("/:page").unwrap());
	/// stack.add_route_with_priority("about", Literal::new("/about"), 10);
	///
	/// let m = stack.match_path("/about").unwrap();
	/// assert_eq!(m.matched_route_name(), Some("about"));
	/// ```
	pub fn add_route_with_priority(
		&mut self,
		name: impl Into<String>,
		route: impl Route + 'static,
		priority: i32,
	) -> &mut Self {
		self.insert(name.into(), Box::new(route), priority)
	}

	/// Adds an already boxed route, as produced by configuration loading.
	pub fn add_boxed_route(
		&mut self,
		name: impl Into<String>,
		route: Box<dyn Route>,
		priority: i32,
	) -> &mut Self {
		self.insert(name.into(), route, priority)
	}

	fn insert(&mut self, name: String, route: Box<dyn Route>, priority: i32) -> &mut Self {
		if self.remove_route(&name).is_some() {
			debug!(route = %name, "replacing existing route");
		}
		// First entry that should come after the new one.
		let at = self
			.entries
			.iter()
			.position(|e| e.priority < priority)
			.unwrap_or(self.entries.len());
		self.entries.insert(
			at,
			Entry {
				name,
				route,
				priority,
			},
		);
		self
	}

	/// Removes a route, returning it if it was registered.
	pub fn remove_route(&mut self, name: &str) -> Option<Box<dyn Route>> {
		let index = self.entries.iter().position(|e| e.name == name)?;
		Some(self.entries.remove(index).route)
	}

	pub fn get(&self, name: &str) -> Option<&dyn Route> {
		self.entries
			.iter()
			.find(|e| e.name == name)
			.map(|e| e.route.as_ref())
	}

	pub fn has(&self, name: &str) -> bool {
		self.entries.iter().any(|e| e.name == name)
	}

	/// Routes in the order they are tried.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn Route)> {
		self.entries
			.iter()
			.map(|e| (e.name.as_str(), e.route.as_ref()))
	}

	/// Route names in the order they are tried.
	pub fn names(&self) -> Vec<&str> {
		self.entries.iter().map(|e| e.name.as_str()).collect()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Sets the prefix stripped before matching and prepended when assembling.
	///
	/// A trailing `/` is dropped so that `"/app/"` and `"/app"` behave alike.
	pub fn set_base_url(&mut self, base_url: impl Into<String>) -> &mut Self {
		let base_url = base_url.into();
		self.base_url = base_url.trim_end_matches('/').to_string();
		self
	}

	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	/// Sets parameters merged under the caller's parameters on every assembly.
	pub fn set_default_params(&mut self, params: Params) -> &mut Self {
		self.default_params = params;
		self
	}

	pub fn set_default_param(
		&mut self,
		name: impl Into<String>,
		value: impl Into<serde_json::Value>,
	) -> &mut Self {
		self.default_params.insert(name.into(), value.into());
		self
	}

	pub fn default_params(&self) -> &Params {
		&self.default_params
	}

	/// Matches a full path against the stack.
	///
	/// Returns the first route, in priority order, that consumes the entire
	/// path after the base URL. The returned match carries that route's name.
	///
	/// # Examples
	///
	/// ```
	/// use trellis_urls::{Literal, RouteStack};
	///
	/// let mut stack = RouteStack::new();
	/// stack.add_route("home", Literal::new("/"));
	///
	/// assert!(stack.match_path("/").is_some());
	/// // "/" is a prefix of "/other" but does not consume it.
	/// assert!(stack.match_path("/other").is_none());
	/// ```
	pub fn match_path(&self, path: &str) -> Option<RouteMatch> {
		let offset = if self.base_url.is_empty() {
			0
		} else if path.starts_with(&self.base_url) {
			self.base_url.len()
		} else {
			trace!(path, base_url = %self.base_url, "path outside base url");
			return None;
		};

		for entry in &self.entries {
			let Some(mut m) = entry.route.match_path(path, offset) else {
				continue;
			};
			if offset + m.length() == path.len() {
				m.set_matched_route_name(&entry.name);
				debug!(path, route = m.matched_route_name().unwrap_or_default(), "route matched");
				return Some(m);
			}
			trace!(path, route = %entry.name, "partial match ignored");
		}

		trace!(path, "no route matched");
		None
	}

	/// Matches the path component of a request.
	pub fn match_request(&self, request: &Request) -> Option<RouteMatch> {
		self.match_path(request.path())
	}

	/// Builds a URL for the route named `name`.
	///
	/// `name` may address nested routes with `/`, e.g. `"blog/post"`.
	/// The stack's default parameters fill in anything `params` leaves out.
	///
	/// # Errors
	///
	/// [`RoutingError::UnknownRoute`] when any component of `name` is not
	/// registered, or the error of the route that failed to assemble.
	pub fn assemble(&self, name: &str, params: &Params) -> Result<String> {
		let (head, rest) = match name.split_once('/') {
			Some((head, tail)) => (head, Some(tail)),
			None => (name, None),
		};
		let route = self
			.get(head)
			.ok_or_else(|| RoutingError::UnknownRoute(head.to_string()))?;

		let mut merged = self.default_params.clone();
		merged.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));

		let path = route.assemble(
			&merged,
			AssembleOptions {
				child: rest,
				has_child: false,
			},
		)?;
		Ok(format!("{}{path}", self.base_url))
	}
}
