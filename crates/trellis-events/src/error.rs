//! Event manager errors.

use thiserror::Error;

/// Result type for event manager operations.
pub type Result<T> = std::result::Result<T, EventError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum EventError {
	/// Listeners must be attached to a named event (or `*`).
	#[error("event name must not be empty")]
	EmptyEventName,

	/// Shared listeners must be attached under an identifier (or `*`).
	#[error("identifier must not be empty")]
	EmptyIdentifier,
}
