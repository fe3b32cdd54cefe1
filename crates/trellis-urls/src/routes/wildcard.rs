use super::{AssembleOptions, Route, decode, encode, remainder, value_to_string};
use crate::{Params, Result, RouteMatch, RoutingError};
use serde_json::Value;

/// Consumes the rest of the path as key/value pairs.
///
/// With the default delimiters `/foo/bar/baz/qux` yields
/// `{foo: "bar", baz: "qux"}`. A trailing key without a value is ignored.
#[derive(Debug, Clone)]
pub struct Wildcard {
	key_value_delimiter: String,
	param_delimiter: String,
	defaults: Params,
}

impl Wildcard {
	pub fn new() -> Self {
		Self::with_delimiters("/", "/")
	}

	/// # Examples
	///
	/// ```
	/// use trellis_urls::{Route, Wildcard};
	/// use serde_json::json;
	///
	/// let route = Wildcard::with_delimiters("=", "/");
	/// let m = route.match_path("/sort=asc/page=2", 0).unwrap();
	/// assert_eq!(m.param("sort"), Some(&json!("asc")));
	/// assert_eq!(m.param("page"), Some(&json!("2")));
	/// ```
	pub fn with_delimiters(
		key_value_delimiter: impl Into<String>,
		param_delimiter: impl Into<String>,
	) -> Self {
		Self {
			key_value_delimiter: key_value_delimiter.into(),
			param_delimiter: param_delimiter.into(),
			defaults: Params::new(),
		}
	}

	pub fn with_defaults(mut self, defaults: Params) -> Self {
		self.defaults = defaults;
		self
	}
}

impl Default for Wildcard {
	fn default() -> Self {
		Self::new()
	}
}

impl Route for Wildcard {
	fn match_path(&self, path: &str, offset: usize) -> Option<RouteMatch> {
		let rest = remainder(path, offset)?;
		let pieces: Vec<&str> = rest.split(self.param_delimiter.as_str()).collect();

		// Must start with the delimiter and must not end with it.
		if pieces.len() > 1 && (!pieces[0].is_empty() || pieces.last() == Some(&"")) {
			return None;
		}
		if pieces.len() == 1 && !pieces[0].is_empty() {
			return None;
		}

		let mut params = self.defaults.clone();
		if self.key_value_delimiter == self.param_delimiter {
			let mut i = 1;
			while i + 1 < pieces.len() {
				params.insert(decode(pieces[i]), Value::String(decode(pieces[i + 1])));
				i += 2;
			}
		} else {
			for piece in pieces.iter().skip(1) {
				if let Some((key, value)) = piece.split_once(self.key_value_delimiter.as_str()) {
					params.insert(decode(key), Value::String(decode(value)));
				}
			}
		}

		Some(RouteMatch::new(params, rest.len()))
	}

	fn assemble(&self, params: &Params, options: AssembleOptions<'_>) -> Result<String> {
		options.ensure_leaf()?;
		let mut merged = self.defaults.clone();
		merged.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
		if merged.is_empty() {
			return Ok(String::new());
		}

		let mut keys: Vec<&String> = merged.keys().collect();
		keys.sort();

		let mut out = String::new();
		for key in keys {
			let value = value_to_string(&merged[key])
				.ok_or_else(|| RoutingError::InvalidParameter(key.clone()))?;
			out.push_str(&self.param_delimiter);
			out.push_str(&encode(key));
			out.push_str(&self.key_value_delimiter);
			out.push_str(&encode(&value));
		}
		Ok(out)
	}
}
