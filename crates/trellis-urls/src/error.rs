//! Routing error types.
//!
//! A failed match is not an error; these variants cover configuration and
//! URL assembly failures only.

use thiserror::Error;

/// Result type for routing operations.
pub type Result<T> = std::result::Result<T, RoutingError>;

/// Errors raised while building routes or assembling URLs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum RoutingError {
	/// No route is registered under the requested name.
	#[error("route with name \"{0}\" not found")]
	UnknownRoute(String),

	/// A required placeholder had neither a value nor a default.
	#[error("missing parameter \"{parameter}\" for route \"{route}\"")]
	MissingParameter {
		/// Route (template or name) being assembled.
		route: String,
		/// Name of the missing placeholder.
		parameter: String,
	},

	/// A parameter value cannot be written into a path.
	#[error("parameter \"{0}\" has a value that cannot be used in a path")]
	InvalidParameter(String),

	/// A part route was assembled without naming a child and may not terminate.
	#[error("part route may not terminate")]
	NonTerminating,

	/// A route template or pattern failed to compile.
	#[error("invalid route pattern \"{pattern}\": {message}")]
	InvalidPattern {
		/// Offending template or regex.
		pattern: String,
		/// Compiler or parser message.
		message: String,
	},

	/// A route definition is structurally invalid.
	#[error("invalid route configuration: {0}")]
	InvalidConfig(String),
}
