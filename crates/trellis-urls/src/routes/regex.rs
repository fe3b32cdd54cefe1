use super::{AssembleOptions, Route, decode, encode, remainder, value_to_string};
use crate::{Params, Result, RouteMatch, RoutingError};
use serde_json::Value;

/// Matches a user-supplied regular expression with named captures.
///
/// Assembly uses a separate `spec` string where `%name%` is replaced by the
/// encoded parameter value.
#[derive(Debug, Clone)]
pub struct Regex {
	source: String,
	regex: regex::Regex,
	spec: String,
	defaults: Params,
}

impl Regex {
	/// # Examples
	///
	/// ```
	/// use trellis_urls::{Params, Regex, Route};
	/// use serde_json::json;
	///
	/// let route = Regex::new(r"/blog/(?P<id>[0-9]+)(\.(?P<format>json|html))?", "/blog/%id%.%format%").unwrap();
	/// let m = route.match_path("/blog/17.json", 0).unwrap();
	/// assert_eq!(m.param("id"), Some(&json!("17")));
	/// assert_eq!(m.param("format"), Some(&json!("json")));
	/// ```
	///
	/// # Errors
	///
	/// Returns [`RoutingError::InvalidPattern`] if the expression does not compile.
	pub fn new(regex: &str, spec: impl Into<String>) -> Result<Self> {
		let compiled =
			regex::Regex::new(&format!("^(?:{regex})")).map_err(|e| RoutingError::InvalidPattern {
				pattern: regex.to_string(),
				message: e.to_string(),
			})?;
		Ok(Self {
			source: regex.to_string(),
			regex: compiled,
			spec: spec.into(),
			defaults: Params::new(),
		})
	}

	pub fn with_defaults(mut self, defaults: Params) -> Self {
		self.defaults = defaults;
		self
	}

	pub fn source(&self) -> &str {
		&self.source
	}
}

impl Route for Regex {
	fn match_path(&self, path: &str, offset: usize) -> Option<RouteMatch> {
		let rest = remainder(path, offset)?;
		let captures = self.regex.captures(rest)?;
		let whole = captures.get(0)?;

		let mut params = self.defaults.clone();
		for name in self.regex.capture_names().flatten() {
			if let Some(value) = captures.name(name) {
				params.insert(name.to_string(), Value::String(decode(value.as_str())));
			}
		}

		Some(RouteMatch::new(params, whole.end()))
	}

	fn assemble(&self, params: &Params, options: AssembleOptions<'_>) -> Result<String> {
		options.ensure_leaf()?;
		let mut merged = self.defaults.clone();
		merged.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));

		let mut url = String::with_capacity(self.spec.len());
		let mut rest = self.spec.as_str();
		while let Some(start) = rest.find('%') {
			url.push_str(&rest[..start]);
			let after = &rest[start + 1..];
			let Some(end) = after.find('%') else {
				url.push_str(&rest[start..]);
				rest = "";
				break;
			};
			let name = &after[..end];
			let value = merged
				.get(name)
				.ok_or_else(|| RoutingError::MissingParameter {
					route: self.spec.clone(),
					parameter: name.to_string(),
				})?;
			let text =
				value_to_string(value).ok_or_else(|| RoutingError::InvalidParameter(name.to_string()))?;
			url.push_str(&encode(&text));
			rest = &after[end + 1..];
		}
		url.push_str(rest);
		Ok(url)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	fn route() -> Regex {
		Regex::new(r"/blog/(?P<id>[0-9]+)\.(?P<format>json|html)", "/blog/%id%.%format%").unwrap()
	}

	#[rstest]
	fn test_named_captures_become_params() {
		let m = route().match_path("/blog/5.html", 0).unwrap();

		assert_eq!(m.param("id"), Some(&json!("5")));
		assert_eq!(m.param("format"), Some(&json!("html")));
		assert_eq!(m.length(), 12);
	}

	#[rstest]
	fn test_match_is_anchored_at_offset() {
		assert!(route().match_path("/x/blog/5.html", 0).is_none());
		assert!(route().match_path("/x/blog/5.html", 2).is_some());
	}

	#[rstest]
	fn test_invalid_regex_is_rejected() {
		assert!(matches!(
			Regex::new("(unclosed", ""),
			Err(RoutingError::InvalidPattern { .. })
		));
	}

	#[rstest]
	fn test_assemble_fills_spec() {
		// Arrange
		let mut params = Params::new();
		params.insert("id".into(), json!(9));
		params.insert("format".into(), json!("json"));

		// Act
		let url = route().assemble(&params, AssembleOptions::default()).unwrap();

		// Assert
		assert_eq!(url, "/blog/9.json");
	}

	#[rstest]
	fn test_assemble_missing_parameter() {
		let mut params = Params::new();
		params.insert("id".into(), json!(9));

		let err = route()
			.assemble(&params, AssembleOptions::default())
			.unwrap_err();

		assert!(matches!(err, RoutingError::MissingParameter { parameter, .. } if parameter == "format"));
	}
}
