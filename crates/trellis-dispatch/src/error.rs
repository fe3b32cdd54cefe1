//! Dispatch error types.

use thiserror::Error;
use trellis_events::EventError;
use trellis_http::HttpError;
use trellis_urls::RoutingError;

/// Result type for dispatch operations.
pub type Result<T> = std::result::Result<T, DispatchError>;

/// Errors raised while resolving or running controllers.
///
/// A request that matches no route or names an unregistered controller is
/// not an error at the [`Application`](crate::Application) level; it is
/// recorded on the event and answered with a 404.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum DispatchError {
	/// No controller is registered under the name.
	#[error("controller \"{0}\" is not registered")]
	ControllerNotFound(String),

	/// The resolved instance cannot be dispatched.
	#[error("controller \"{name}\" is invalid: {reason}")]
	InvalidController {
		/// Name the controller was requested under.
		name: String,
		/// What the instance lacks.
		reason: String,
	},

	/// No plugin is registered under the name.
	#[error("plugin \"{0}\" is not registered")]
	PluginNotFound(String),

	/// The dispatch event carries no route match.
	#[error("missing route match; unable to determine the action")]
	MissingRouteMatch,

	/// A collaborator required by the operation is not available.
	#[error("{0}")]
	Runtime(String),

	/// An action handler failed.
	#[error("action \"{action}\" failed: {message}")]
	Action {
		/// Action token from the route match.
		action: String,
		/// Failure description.
		message: String,
	},

	#[error(transparent)]
	Routing(#[from] RoutingError),

	#[error(transparent)]
	Http(#[from] HttpError),

	#[error(transparent)]
	Event(#[from] EventError),
}
