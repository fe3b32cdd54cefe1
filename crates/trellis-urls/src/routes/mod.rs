//! Route variants.
//!
//! Every route implements [`Route`]: a pure prefix matcher over the request
//! path plus the inverse assembly operation. Routes never require that the
//! whole path is consumed; the owning [`RouteStack`](crate::RouteStack) or
//! [`Part`] decides that.

mod literal;
mod part;
mod regex;
mod segment;
mod wildcard;

pub use self::regex::Regex;
pub use literal::Literal;
pub use part::Part;
pub use segment::Segment;
pub use wildcard::Wildcard;

use crate::{Params, Result, RouteMatch, RoutingError};
use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use serde_json::Value;
use std::fmt;

/// Options passed down while assembling a URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssembleOptions<'a> {
	/// Remaining `/`-separated child route path, consumed by part routes.
	pub child: Option<&'a str>,
	/// Whether a child route will be appended after this one.
	pub has_child: bool,
}

impl AssembleOptions<'_> {
	/// Fails when a child route was requested from a route that has none.
	pub fn ensure_leaf(&self) -> Result<()> {
		match self.child.filter(|c| !c.is_empty()) {
			Some(child) => Err(RoutingError::UnknownRoute(child.to_string())),
			None => Ok(()),
		}
	}
}

/// A rule mapping URL structure to named parameters.
pub trait Route: Send + Sync + fmt::Debug {
	/// Attempts to match a prefix of `path[offset..]`.
	///
	/// Returns `None` when the route does not apply. The returned match's
	/// length counts bytes consumed from `offset`.
	fn match_path(&self, path: &str, offset: usize) -> Option<RouteMatch>;

	/// Rebuilds the path fragment this route matches from `params`.
	fn assemble(&self, params: &Params, options: AssembleOptions<'_>) -> Result<String>;
}

/// Characters escaped when writing a parameter value into a path segment.
const SEGMENT: &AsciiSet = &CONTROLS
	.add(b' ')
	.add(b'"')
	.add(b'#')
	.add(b'%')
	.add(b'/')
	.add(b'<')
	.add(b'>')
	.add(b'?')
	.add(b'[')
	.add(b'\\')
	.add(b']')
	.add(b'^')
	.add(b'`')
	.add(b'{')
	.add(b'|')
	.add(b'}');

pub(crate) fn encode(value: &str) -> String {
	utf8_percent_encode(value, SEGMENT).to_string()
}

pub(crate) fn decode(value: &str) -> String {
	percent_decode_str(value).decode_utf8_lossy().into_owned()
}

/// Renders a scalar parameter as path text. Arrays, objects and null have no
/// path form.
pub fn value_to_string(value: &Value) -> Option<String> {
	match value {
		Value::String(s) => Some(s.clone()),
		Value::Number(n) => Some(n.to_string()),
		Value::Bool(b) => Some(b.to_string()),
		Value::Null | Value::Array(_) | Value::Object(_) => None,
	}
}

/// Slice of `path` starting at `offset`, if `offset` is a valid boundary.
pub(crate) fn remainder(path: &str, offset: usize) -> Option<&str> {
	path.get(offset..)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	#[case("plain", "plain")]
	#[case("a b", "a%20b")]
	#[case("a/b", "a%2Fb")]
	#[case("caf\u{e9}", "caf%C3%A9")]
	fn test_encode(#[case] raw: &str, #[case] expected: &str) {
		assert_eq!(encode(raw), expected);
	}

	#[rstest]
	fn test_decode_reverses_encode() {
		assert_eq!(decode("a%20b%2Fc"), "a b/c");
	}

	#[rstest]
	#[case(json!("x"), Some("x"))]
	#[case(json!(7), Some("7"))]
	#[case(json!(true), Some("true"))]
	#[case(json!(null), None)]
	#[case(json!([1]), None)]
	fn test_value_to_string(#[case] value: Value, #[case] expected: Option<&str>) {
		assert_eq!(value_to_string(&value).as_deref(), expected);
	}

	#[rstest]
	fn test_remainder_rejects_non_boundary() {
		assert_eq!(remainder("é", 1), None);
		assert_eq!(remainder("/ab", 1), Some("ab"));
		assert_eq!(remainder("/ab", 3), Some(""));
	}

	#[rstest]
	#[case(None, Ok(()))]
	#[case(Some(""), Ok(()))]
	#[case(Some("nope"), Err(RoutingError::UnknownRoute("nope".into())))]
	fn test_ensure_leaf(#[case] child: Option<&str>, #[case] expected: Result<()>) {
		let options = AssembleOptions {
			child,
			has_child: false,
		};

		assert_eq!(options.ensure_leaf(), expected);
	}
}
