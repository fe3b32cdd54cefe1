//! Result of applying a route to a path.

use crate::Params;
use serde_json::Value;

/// Separator placed between route names of nested matches.
pub const ROUTE_NAME_SEPARATOR: &str = "/";

/// Parameters, consumed length and route name produced by a successful match.
///
/// A match is created by a [`Route`](crate::Route) and afterwards only touched
/// by the stack and part routes that compose it. Two operations combine names
/// differently and both behaviours are kept as they are:
///
/// - [`set_matched_route_name`](Self::set_matched_route_name) prepends the new
///   name to an existing one (`"outer/inner"` when `"inner"` was set first).
/// - [`merge`](Self::merge) replaces the name with the other match's name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteMatch {
	params: Params,
	length: usize,
	matched_route_name: Option<String>,
}

impl RouteMatch {
	/// Creates a match from its parameters and consumed length.
	///
	/// # Examples
	///
	/// ```
	/// use trellis_urls::{Params, RouteMatch};
	///
	/// let m = RouteMatch::new(Params::new(), 4);
	/// assert_eq!(m.length(), 4);
	/// assert_eq!(m.matched_route_name(), None);
	/// ```
	pub fn new(params: Params, length: usize) -> Self {
		Self {
			params,
			length,
			matched_route_name: None,
		}
	}

	/// Records the name of the route that produced this match.
	///
	/// The first call sets the name; later calls prepend `name` followed by
	/// [`ROUTE_NAME_SEPARATOR`], so names read outer-to-inner once a stack
	/// tags a match already tagged by a nested stack.
	///
	/// # Examples
	///
	/// ```
	/// use trellis_urls::{Params, RouteMatch};
	///
	/// let mut m = RouteMatch::new(Params::new(), 0);
	/// m.set_matched_route_name("post");
	/// m.set_matched_route_name("blog");
	/// assert_eq!(m.matched_route_name(), Some("blog/post"));
	/// ```
	pub fn set_matched_route_name(&mut self, name: &str) -> &mut Self {
		self.matched_route_name = Some(match self.matched_route_name.take() {
			None => name.to_string(),
			Some(existing) => format!("{name}{ROUTE_NAME_SEPARATOR}{existing}"),
		});
		self
	}

	/// Folds `other` into this match.
	///
	/// Parameters are unioned with `other` winning on collisions, lengths are
	/// summed, and the matched route name becomes `other`'s name, even when
	/// `other` carries none.
	pub fn merge(&mut self, other: RouteMatch) -> &mut Self {
		self.params.extend(other.params);
		self.length += other.length;
		self.matched_route_name = other.matched_route_name;
		self
	}

	pub fn length(&self) -> usize {
		self.length
	}

	pub fn params(&self) -> &Params {
		&self.params
	}

	pub fn matched_route_name(&self) -> Option<&str> {
		self.matched_route_name.as_deref()
	}

	pub fn param(&self, name: &str) -> Option<&Value> {
		self.params.get(name)
	}

	/// String view of a parameter; numbers and booleans are rendered.
	pub fn param_str(&self, name: &str) -> Option<String> {
		self.params.get(name).and_then(crate::routes::value_to_string)
	}

	pub fn param_or(&self, name: &str, default: Value) -> Value {
		self.params.get(name).cloned().unwrap_or(default)
	}

	pub fn set_param(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
		self.params.insert(name.into(), value.into());
		self
	}

	pub fn into_params(self) -> Params {
		self.params
	}
}
