use crate::{HttpError, Result};
use bytes::Bytes;
use hyper::header::{HeaderName, HeaderValue};
use hyper::{HeaderMap, Method, Uri, Version};
use std::collections::HashMap;

/// HTTP request as seen by the router and controllers.
#[derive(Debug, Clone)]
pub struct Request {
	pub method: Method,
	pub uri: Uri,
	pub version: Version,
	pub headers: HeaderMap,
	pub body: Bytes,
}

impl Request {
	/// Creates a request from already-parsed parts.
	pub fn new(method: Method, uri: Uri, version: Version, headers: HeaderMap, body: Bytes) -> Self {
		Self {
			method,
			uri,
			version,
			headers,
			body,
		}
	}

	/// Starts a request builder.
	///
	/// # Examples
	///
	/// ```
	/// use trellis_http::Request;
	/// use hyper::Method;
	///
	/// let request = Request::builder()
	///     .method(Method::POST)
	///     .uri("/users")
	///     .header("content-type", "application/json")
	///     .body("{}")
	///     .build()
	///     .unwrap();
	/// assert_eq!(request.method, Method::POST);
	/// assert_eq!(request.header("content-type"), Some("application/json"));
	/// ```
	pub fn builder() -> RequestBuilder {
		RequestBuilder::default()
	}

	/// Shorthand for a `GET` request to `uri`.
	pub fn get(uri: &str) -> Result<Self> {
		Self::builder().uri(uri).build()
	}

	/// Path component of the request URI, without the query string.
	pub fn path(&self) -> &str {
		self.uri.path()
	}

	/// Raw query string, if any.
	pub fn query_string(&self) -> Option<&str> {
		self.uri.query()
	}

	/// Decoded query parameters. Later duplicates overwrite earlier ones.
	pub fn query_params(&self) -> HashMap<String, String> {
		self.uri
			.query()
			.and_then(|q| serde_urlencoded::from_str::<Vec<(String, String)>>(q).ok())
			.map(|pairs| pairs.into_iter().collect())
			.unwrap_or_default()
	}

	/// A single decoded query parameter.
	pub fn query_param(&self, name: &str) -> Option<String> {
		self.query_params().remove(name)
	}

	/// Header value as a string, when it is valid visible ASCII.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(name).and_then(|v| v.to_str().ok())
	}
}

impl Default for Request {
	fn default() -> Self {
		Self::new(
			Method::GET,
			Uri::from_static("/"),
			Version::HTTP_11,
			HeaderMap::new(),
			Bytes::new(),
		)
	}
}

/// Builder for [`Request`].
#[derive(Debug, Default)]
pub struct RequestBuilder {
	method: Option<Method>,
	uri: Option<String>,
	version: Option<Version>,
	headers: Vec<(String, String)>,
	body: Bytes,
}

impl RequestBuilder {
	pub fn method(mut self, method: Method) -> Self {
		self.method = Some(method);
		self
	}

	pub fn uri(mut self, uri: impl Into<String>) -> Self {
		self.uri = Some(uri.into());
		self
	}

	pub fn version(mut self, version: Version) -> Self {
		self.version = Some(version);
		self
	}

	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));
		self
	}

	pub fn body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	/// Parses the URI and headers and produces the request.
	///
	/// # Errors
	///
	/// Returns [`HttpError::InvalidUri`] or [`HttpError::InvalidHeader`] when
	/// the supplied text cannot be parsed.
	pub fn build(self) -> Result<Request> {
		let raw = self.uri.unwrap_or_else(|| "/".to_string());
		let uri = raw.parse::<Uri>().map_err(|e| HttpError::InvalidUri {
			uri: raw.clone(),
			message: e.to_string(),
		})?;

		let mut headers = HeaderMap::new();
		for (name, value) in self.headers {
			let header_name = HeaderName::from_bytes(name.as_bytes())
				.map_err(|_| HttpError::InvalidHeader(name.clone()))?;
			let header_value =
				HeaderValue::from_str(&value).map_err(|_| HttpError::InvalidHeader(name.clone()))?;
			headers.append(header_name, header_value);
		}

		Ok(Request {
			method: self.method.unwrap_or(Method::GET),
			uri,
			version: self.version.unwrap_or(Version::HTTP_11),
			headers,
			body: self.body,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_builder_defaults_to_get_root() {
		// Act
		let request = Request::builder().build().unwrap();

		// Assert
		assert_eq!(request.method, Method::GET);
		assert_eq!(request.path(), "/");
		assert!(request.query_string().is_none());
	}

	#[rstest]
	fn test_query_params_are_decoded() {
		// Arrange
		let request = Request::get("/search?q=hello%20world&page=3").unwrap();

		// Act
		let params = request.query_params();

		// Assert
		assert_eq!(params.get("q").map(String::as_str), Some("hello world"));
		assert_eq!(params.get("page").map(String::as_str), Some("3"));
	}

	#[rstest]
	fn test_invalid_uri_is_rejected() {
		// Act
		let result = Request::builder().uri("/bad path").build();

		// Assert
		assert!(matches!(result, Err(HttpError::InvalidUri { .. })));
	}

	#[rstest]
	fn test_invalid_header_is_rejected() {
		// Act
		let result = Request::builder().header("bad header", "x").build();

		// Assert
		assert!(matches!(result, Err(HttpError::InvalidHeader(name)) if name == "bad header"));
	}
}
