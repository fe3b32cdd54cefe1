use crate::{HttpError, Result};
use bytes::Bytes;
use hyper::header::{CONTENT_TYPE, HeaderName, HeaderValue, LOCATION};
use hyper::{HeaderMap, StatusCode};
use serde::Serialize;

/// HTTP response produced by controllers, plugins and listeners.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: Bytes,
}

impl Response {
	/// Creates an empty response with the given status.
	///
	/// # Examples
	///
	/// ```
	/// use trellis_http::Response;
	/// use hyper::StatusCode;
	///
	/// let response = Response::new(StatusCode::ACCEPTED);
	/// assert_eq!(response.status, StatusCode::ACCEPTED);
	/// assert!(response.body.is_empty());
	/// ```
	pub fn new(status: StatusCode) -> Self {
		Self {
			status,
			headers: HeaderMap::new(),
			body: Bytes::new(),
		}
	}

	pub fn ok() -> Self {
		Self::new(StatusCode::OK)
	}

	pub fn not_found() -> Self {
		Self::new(StatusCode::NOT_FOUND)
	}

	pub fn internal_server_error() -> Self {
		Self::new(StatusCode::INTERNAL_SERVER_ERROR)
	}

	/// `302 Found` pointing at `location`.
	///
	/// # Examples
	///
	/// ```
	/// use trellis_http::Response;
	/// use hyper::StatusCode;
	///
	/// let response = Response::found("/login");
	/// assert_eq!(response.status, StatusCode::FOUND);
	/// assert_eq!(response.location(), Some("/login"));
	/// ```
	pub fn found(location: impl AsRef<str>) -> Self {
		Self::new(StatusCode::FOUND).with_location(location.as_ref())
	}

	pub fn with_status(mut self, status: StatusCode) -> Self {
		self.status = status;
		self
	}

	pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	/// Adds a header. Names or values that are not valid HTTP are skipped.
	pub fn with_header(mut self, name: &str, value: &str) -> Self {
		if let (Ok(name), Ok(value)) = (
			HeaderName::from_bytes(name.as_bytes()),
			HeaderValue::from_str(value),
		) {
			self.headers.insert(name, value);
		}
		self
	}

	/// Sets the `Location` header.
	pub fn with_location(mut self, location: &str) -> Self {
		if let Ok(value) = HeaderValue::from_str(location) {
			self.headers.insert(LOCATION, value);
		}
		self
	}

	/// Serializes `data` as the JSON body and sets `Content-Type`.
	///
	/// # Errors
	///
	/// Returns [`HttpError::Serialization`] if `data` cannot be serialized.
	pub fn with_json<T: Serialize>(mut self, data: &T) -> Result<Self> {
		let json = serde_json::to_vec(data).map_err(|e| HttpError::Serialization(e.to_string()))?;
		self.body = Bytes::from(json);
		self.headers
			.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		Ok(self)
	}

	/// Value of the `Location` header, if present.
	pub fn location(&self) -> Option<&str> {
		self.headers.get(LOCATION).and_then(|v| v.to_str().ok())
	}

	pub fn is_redirect(&self) -> bool {
		self.status.is_redirection()
	}
}

impl Default for Response {
	fn default() -> Self {
		Self::ok()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_default_response_is_empty_ok() {
		let response = Response::default();

		assert_eq!(response.status, StatusCode::OK);
		assert!(response.headers.is_empty());
		assert!(response.body.is_empty());
	}

	#[rstest]
	fn test_with_json_sets_content_type() {
		// Act
		let response = Response::ok().with_json(&json!({"ok": true})).unwrap();

		// Assert
		assert_eq!(
			response.headers.get(CONTENT_TYPE).unwrap(),
			"application/json"
		);
		assert_eq!(response.body, Bytes::from(r#"{"ok":true}"#));
	}

	#[rstest]
	fn test_invalid_header_value_is_skipped() {
		let response = Response::ok().with_header("x-trace", "bad\nvalue");

		assert!(response.headers.get("x-trace").is_none());
	}

	#[rstest]
	fn test_found_is_redirect() {
		let response = Response::found("/next");

		assert!(response.is_redirect());
		assert_eq!(response.location(), Some("/next"));
	}
}
