//! The per-request event passed through every MVC listener.

use crate::error::DispatchError;
use serde_json::{Map, Value};
use std::sync::Arc;
use trellis_events::Event;
use trellis_http::{Request, Response};
use trellis_urls::{RouteMatch, RouteStack};

pub const EVENT_BOOTSTRAP: &str = "bootstrap";
pub const EVENT_ROUTE: &str = "route";
pub const EVENT_DISPATCH: &str = "dispatch";
pub const EVENT_DISPATCH_ERROR: &str = "dispatch.error";
pub const EVENT_FINISH: &str = "finish";

pub const ERROR_ROUTER_NO_MATCH: &str = "error-router-no-match";
pub const ERROR_CONTROLLER_NOT_FOUND: &str = "error-controller-not-found";
pub const ERROR_EXCEPTION: &str = "error-exception";

/// What a listener or action produced.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ActionResult {
	/// A complete response; dispatch stops here.
	Response(Response),
	/// Data for an outer layer to render.
	Value(Value),
	#[default]
	Empty,
}

impl ActionResult {
	pub fn is_response(&self) -> bool {
		matches!(self, Self::Response(_))
	}

	pub fn as_response(&self) -> Option<&Response> {
		match self {
			Self::Response(response) => Some(response),
			_ => None,
		}
	}

	pub fn as_value(&self) -> Option<&Value> {
		match self {
			Self::Value(value) => Some(value),
			_ => None,
		}
	}
}

impl From<Response> for ActionResult {
	fn from(response: Response) -> Self {
		Self::Response(response)
	}
}

impl From<Value> for ActionResult {
	fn from(value: Value) -> Self {
		Self::Value(value)
	}
}

/// Return type of every MVC listener.
pub type DispatchOutcome = Result<ActionResult, DispatchError>;

/// Stop predicate for MVC triggers: a response or an error ends the trigger.
pub fn short_circuits(outcome: &DispatchOutcome) -> bool {
	match outcome {
		Ok(result) => result.is_response(),
		Err(_) => true,
	}
}

/// Request-scoped state shared by the route, dispatch and finish listeners.
#[derive(Debug, Clone, Default)]
pub struct MvcEvent {
	name: String,
	target: Option<String>,
	request: Request,
	response: Response,
	route_match: Option<RouteMatch>,
	router: Option<Arc<RouteStack>>,
	result: Option<ActionResult>,
	error: Option<String>,
	exception: Option<DispatchError>,
	params: Map<String, Value>,
	stopped: bool,
}

impl MvcEvent {
	pub fn new(request: Request, response: Response) -> Self {
		Self {
			request,
			response,
			..Self::default()
		}
	}

	pub fn target(&self) -> Option<&str> {
		self.target.as_deref()
	}

	pub fn set_target(&mut self, target: impl Into<String>) {
		self.target = Some(target.into());
	}

	pub fn request(&self) -> &Request {
		&self.request
	}

	pub fn set_request(&mut self, request: Request) {
		self.request = request;
	}

	pub fn response(&self) -> &Response {
		&self.response
	}

	pub fn response_mut(&mut self) -> &mut Response {
		&mut self.response
	}

	pub fn set_response(&mut self, response: Response) {
		self.response = response;
	}

	pub fn take_response(&mut self) -> Response {
		std::mem::take(&mut self.response)
	}

	pub fn route_match(&self) -> Option<&RouteMatch> {
		self.route_match.as_ref()
	}

	pub fn route_match_mut(&mut self) -> Option<&mut RouteMatch> {
		self.route_match.as_mut()
	}

	pub fn set_route_match(&mut self, route_match: Option<RouteMatch>) {
		self.route_match = route_match;
	}

	pub fn router(&self) -> Option<&Arc<RouteStack>> {
		self.router.as_ref()
	}

	pub fn set_router(&mut self, router: Arc<RouteStack>) {
		self.router = Some(router);
	}

	pub fn result(&self) -> Option<&ActionResult> {
		self.result.as_ref()
	}

	pub fn set_result(&mut self, result: ActionResult) {
		self.result = Some(result);
	}

	pub fn take_result(&mut self) -> Option<ActionResult> {
		self.result.take()
	}

	/// Error marker such as [`ERROR_CONTROLLER_NOT_FOUND`].
	pub fn error(&self) -> Option<&str> {
		self.error.as_deref()
	}

	pub fn set_error(&mut self, error: impl Into<String>) {
		self.error = Some(error.into());
	}

	pub fn is_error(&self) -> bool {
		self.error.is_some()
	}

	pub fn exception(&self) -> Option<&DispatchError> {
		self.exception.as_ref()
	}

	pub fn set_exception(&mut self, exception: DispatchError) {
		self.exception = Some(exception);
	}

	pub fn take_exception(&mut self) -> Option<DispatchError> {
		self.exception.take()
	}

	pub fn params(&self) -> &Map<String, Value> {
		&self.params
	}

	pub fn param(&self, name: &str) -> Option<&Value> {
		self.params.get(name)
	}

	pub fn set_param(&mut self, name: impl Into<String>, value: Value) {
		self.params.insert(name.into(), value);
	}
}

impl Event for MvcEvent {
	fn name(&self) -> &str {
		&self.name
	}

	fn set_name(&mut self, name: &str) {
		self.name = name.to_string();
	}

	fn stop_propagation(&mut self, flag: bool) {
		self.stopped = flag;
	}

	fn propagation_is_stopped(&self) -> bool {
		self.stopped
	}
}
