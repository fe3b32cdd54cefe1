//! Facade error type.

use thiserror::Error;
use trellis_dispatch::DispatchError;
use trellis_http::HttpError;
use trellis_urls::RoutingError;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the `trellis` facade.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
	#[error("File error: {0}")]
	File(String),

	#[error("Parse error: {0}")]
	Parse(String),

	#[error("Validation error: {0}")]
	Validation(String),

	#[error("Unsupported configuration format: {0}")]
	UnsupportedFormat(String),

	#[error("Logging error: {0}")]
	Logging(String),

	#[error(transparent)]
	Routing(#[from] RoutingError),

	#[error(transparent)]
	Dispatch(#[from] DispatchError),

	#[error(transparent)]
	Http(#[from] HttpError),
}
