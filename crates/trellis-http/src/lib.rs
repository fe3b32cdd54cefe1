//! # Trellis HTTP
//!
//! Request and response types consumed by the routing and dispatch crates.
//!
//! These types are deliberately narrow: the dispatch core only needs the
//! method, the path, query parameters, headers (notably `Location`), the
//! status code and a body.
//!
//! ```
//! use trellis_http::{Request, Response};
//! use hyper::{Method, StatusCode};
//!
//! let request = Request::builder()
//!     .method(Method::GET)
//!     .uri("/blog/2024?page=2")
//!     .build()
//!     .unwrap();
//! assert_eq!(request.path(), "/blog/2024");
//! assert_eq!(request.query_param("page").as_deref(), Some("2"));
//!
//! let response = Response::found("/login");
//! assert_eq!(response.status, StatusCode::FOUND);
//! assert_eq!(response.location(), Some("/login"));
//! ```

pub mod request;
pub mod response;

pub use request::{Request, RequestBuilder};
pub use response::Response;

pub use hyper::{HeaderMap, Method, StatusCode};

use thiserror::Error;

/// Result type for request/response construction.
pub type Result<T> = std::result::Result<T, HttpError>;

/// Errors raised while building requests or responses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum HttpError {
	/// The URI could not be parsed.
	#[error("invalid URI '{uri}': {message}")]
	InvalidUri {
		/// Raw URI text.
		uri: String,
		/// Parser message.
		message: String,
	},

	/// A header name or value was rejected.
	#[error("invalid header '{0}'")]
	InvalidHeader(String),

	/// A body could not be serialized.
	#[error("serialization error: {0}")]
	Serialization(String),
}
