use super::{AssembleOptions, Route, remainder};
use crate::{Params, Result, RouteMatch};

/// Matches an exact string prefix.
#[derive(Debug, Clone)]
pub struct Literal {
	route: String,
	defaults: Params,
}

impl Literal {
	/// # Examples
	///
	/// ```
	/// use trellis_urls::{Literal, Route};
	///
	/// let route = Literal::new("/about");
	/// let m = route.match_path("/about/team", 0).unwrap();
	/// assert_eq!(m.length(), 6);
	/// assert!(route.match_path("/contact", 0).is_none());
	/// ```
	pub fn new(route: impl Into<String>) -> Self {
		Self {
			route: route.into(),
			defaults: Params::new(),
		}
	}

	pub fn with_defaults(mut self, defaults: Params) -> Self {
		self.defaults = defaults;
		self
	}

	pub fn route(&self) -> &str {
		&self.route
	}
}

impl Route for Literal {
	fn match_path(&self, path: &str, offset: usize) -> Option<RouteMatch> {
		let rest = remainder(path, offset)?;
		if !rest.starts_with(&self.route) {
			return None;
		}
		Some(RouteMatch::new(self.defaults.clone(), self.route.len()))
	}

	fn assemble(&self, _params: &Params, options: AssembleOptions<'_>) -> Result<String> {
		options.ensure_leaf()?;
		Ok(self.route.clone())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	#[case("/", "/", 0, Some(1))]
	#[case("/foo", "/foo", 0, Some(4))]
	#[case("/foo", "/foo/bar", 0, Some(4))]
	#[case("/bar", "/foo/bar", 4, Some(4))]
	#[case("/foo", "/fo", 0, None)]
	#[case("/foo", "/bar", 0, None)]
	fn test_prefix_matching(
		#[case] route: &str,
		#[case] path: &str,
		#[case] offset: usize,
		#[case] expected: Option<usize>,
	) {
		let m = Literal::new(route).match_path(path, offset);

		assert_eq!(m.map(|m| m.length()), expected);
	}

	#[rstest]
	fn test_defaults_become_params() {
		// Arrange
		let mut defaults = Params::new();
		defaults.insert("controller".into(), json!("index"));
		let route = Literal::new("/").with_defaults(defaults);

		// Act
		let m = route.match_path("/", 0).unwrap();

		// Assert
		assert_eq!(m.param("controller"), Some(&json!("index")));
	}

	#[rstest]
	fn test_assemble_returns_literal() {
		let url = Literal::new("/about")
			.assemble(&Params::new(), AssembleOptions::default())
			.unwrap();

		assert_eq!(url, "/about");
	}
}
