//! Default listeners of the front controller.

use crate::controller_manager::ControllerManager;
use crate::error::{DispatchError, Result};
use crate::mvc_event::{
	ActionResult, DispatchOutcome, ERROR_CONTROLLER_NOT_FOUND, ERROR_EXCEPTION, ERROR_ROUTER_NO_MATCH,
	MvcEvent,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, trace, warn};
use trellis_http::StatusCode;

/// Route match parameter naming the module a controller belongs to.
pub const MODULE_NAMESPACE: &str = "__NAMESPACE__";

/// Route match parameter holding the controller name before the module
/// route listener qualified it.
pub const ORIGINAL_CONTROLLER: &str = "__CONTROLLER__";

/// Controller name used when the route match does not name one.
pub const DEFAULT_CONTROLLER: &str = "not-found";

/// Separator between a module namespace and a controller name.
pub const NAMESPACE_SEPARATOR: &str = "::";

/// Matches the request against the router bound to the event.
///
/// A request no route matches is marked with [`ERROR_ROUTER_NO_MATCH`] and a
/// 404 response; it is not an error.
pub fn route(event: &mut MvcEvent) -> DispatchOutcome {
	let router = event
		.router()
		.cloned()
		.ok_or_else(|| DispatchError::Runtime("no router is bound to the event".to_string()))?;

	match router.match_request(event.request()) {
		Some(route_match) => {
			trace!(
				route = route_match.matched_route_name().unwrap_or_default(),
				"route match bound to event"
			);
			event.set_route_match(Some(route_match));
		}
		None => {
			debug!(path = event.request().path(), "no route matched");
			event.set_error(ERROR_ROUTER_NO_MATCH);
			event.response_mut().status = StatusCode::NOT_FOUND;
		}
	}
	Ok(ActionResult::Empty)
}

/// Qualifies the matched controller with its module namespace.
///
/// When the route match carries [`MODULE_NAMESPACE`], `controller` becomes
/// `<namespace>::<Controller>` (dash-separated names are camel-cased) and
/// the original name is kept under [`ORIGINAL_CONTROLLER`]. Controllers that
/// already start with the namespace are left alone.
pub fn module_route(event: &mut MvcEvent) -> DispatchOutcome {
	let Some(route_match) = event.route_match_mut() else {
		return Ok(ActionResult::Empty);
	};
	let (Some(controller), Some(namespace)) =
		(route_match.param_str("controller"), route_match.param_str(MODULE_NAMESPACE))
	else {
		return Ok(ActionResult::Empty);
	};
	if controller.is_empty() || namespace.is_empty() || controller.starts_with(&namespace) {
		return Ok(ActionResult::Empty);
	}

	let qualified = format!("{namespace}{NAMESPACE_SEPARATOR}{}", camel_case(&controller));
	trace!(controller = %controller, qualified = %qualified, "qualifying controller");
	route_match.set_param(ORIGINAL_CONTROLLER, controller);
	route_match.set_param("controller", qualified);
	Ok(ActionResult::Empty)
}

fn camel_case(name: &str) -> String {
	name.split('-')
		.filter(|word| !word.is_empty())
		.map(|word| {
			let mut chars = word.chars();
			match chars.next() {
				Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
				None => String::new(),
			}
		})
		.collect()
}

/// Resolves the matched controller through the registry and dispatches it.
#[derive(Debug, Clone)]
pub struct DispatchListener {
	controllers: Arc<ControllerManager>,
}

impl DispatchListener {
	pub fn new(controllers: Arc<ControllerManager>) -> Self {
		Self { controllers }
	}

	/// Dispatches the controller named by the route match.
	///
	/// Unknown controllers are marked with [`ERROR_CONTROLLER_NOT_FOUND`]
	/// and a 404 response; errors raised by the controller are marked with
	/// [`ERROR_EXCEPTION`] and kept on the event. A registered controller
	/// that cannot be dispatched is returned as an error.
	pub fn on_dispatch(&self, event: &mut MvcEvent) -> DispatchOutcome {
		let name = event
			.route_match()
			.ok_or(DispatchError::MissingRouteMatch)?
			.param_str("controller")
			.unwrap_or_else(|| DEFAULT_CONTROLLER.to_string());

		if !self.controllers.has(&name) {
			warn!(controller = %name, "controller not found");
			event.set_error(ERROR_CONTROLLER_NOT_FOUND);
			event.set_param("controller", Value::String(name));
			event.response_mut().status = StatusCode::NOT_FOUND;
			return Ok(ActionResult::Empty);
		}

		let mut controller = self.controllers.get(&name)?;
		if let Some(aware) = controller.as_application_event_aware() {
			aware.set_event(event.clone());
		}

		let outcome = self.run(&name, controller.as_mut(), event)?;
		if let Some(aware) = controller.as_application_event_aware()
			&& let Some(inner) = aware.event()
		{
			event.set_route_match(inner.route_match().cloned());
		}

		match outcome {
			Ok(result) => {
				event.set_result(result.clone());
				Ok(result)
			}
			Err(err) => {
				warn!(controller = %name, error = %err, "controller failed");
				event.set_error(ERROR_EXCEPTION);
				event.set_param("controller", Value::String(name));
				event.set_exception(err);
				Ok(ActionResult::Empty)
			}
		}
	}

	/// Runs the controller. The outer error is a registry failure, the
	/// inner result is what the controller produced.
	fn run(
		&self,
		name: &str,
		controller: &mut dyn crate::controller_manager::ControllerInstance,
		event: &mut MvcEvent,
	) -> Result<DispatchOutcome> {
		let dispatchable = controller
			.as_dispatchable_mut()
			.ok_or_else(|| DispatchError::InvalidController {
				name: name.to_string(),
				reason: "instance lost its dispatch capability".to_string(),
			})?;

		trace!(controller = %name, "dispatching");
		let outcome = dispatchable.dispatch(event.request().clone(), Some(event.response().clone()));
		if let Some(response) = dispatchable.response() {
			event.set_response(response.clone());
		}
		Ok(outcome)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;
	use trellis_http::{Request, Response};
	use trellis_urls::{Params, RouteMatch, RouteStack, Segment};

	fn event_with_params(params: serde_json::Value) -> MvcEvent {
		let params: Params = serde_json::from_value(params).unwrap();
		let mut event = MvcEvent::new(Request::default(), Response::ok());
		event.set_route_match(Some(RouteMatch::new(params, 0)));
		event
	}

	#[rstest]
	fn test_route_sets_match() {
		// Arrange
		let mut router = RouteStack::new();
		router.add_route("post", Segment::new("/post/:id").unwrap());
		let mut event = MvcEvent::new(Request::get("/post/7").unwrap(), Response::ok());
		event.set_router(Arc::new(router));

		// Act
		route(&mut event).unwrap();

		// Assert
		let route_match = event.route_match().unwrap();
		assert_eq!(route_match.matched_route_name(), Some("post"));
		assert_eq!(route_match.param("id"), Some(&json!("7")));
		assert!(!event.is_error());
	}

	#[rstest]
	fn test_route_without_match_marks_error() {
		let mut event = MvcEvent::new(Request::get("/missing").unwrap(), Response::ok());
		event.set_router(Arc::new(RouteStack::new()));

		let result = route(&mut event).unwrap();

		assert_eq!(result, ActionResult::Empty);
		assert_eq!(event.error(), Some(ERROR_ROUTER_NO_MATCH));
		assert_eq!(event.response().status, StatusCode::NOT_FOUND);
	}

	#[rstest]
	fn test_route_without_router_fails() {
		let mut event = MvcEvent::default();

		assert!(matches!(route(&mut event), Err(DispatchError::Runtime(_))));
	}

	#[rstest]
	#[case(json!({"controller": "index", "__NAMESPACE__": "blog"}), "blog::Index", Some("index"))]
	#[case(json!({"controller": "post-admin", "__NAMESPACE__": "blog"}), "blog::PostAdmin", Some("post-admin"))]
	#[case(json!({"controller": "blog::Index", "__NAMESPACE__": "blog"}), "blog::Index", None)]
	#[case(json!({"controller": "index"}), "index", None)]
	fn test_module_route(
		#[case] params: serde_json::Value,
		#[case] controller: &str,
		#[case] original: Option<&str>,
	) {
		// Arrange
		let mut event = event_with_params(params);

		// Act
		module_route(&mut event).unwrap();

		// Assert
		let route_match = event.route_match().unwrap();
		assert_eq!(route_match.param_str("controller").as_deref(), Some(controller));
		assert_eq!(route_match.param_str(ORIGINAL_CONTROLLER).as_deref(), original);
	}

	#[rstest]
	fn test_dispatch_unknown_controller_marks_error() {
		let listener = DispatchListener::new(Arc::new(ControllerManager::new()));
		let mut event = event_with_params(json!({"controller": "ghost"}));

		let result = listener.on_dispatch(&mut event).unwrap();

		assert_eq!(result, ActionResult::Empty);
		assert_eq!(event.error(), Some(ERROR_CONTROLLER_NOT_FOUND));
		assert_eq!(event.param("controller"), Some(&json!("ghost")));
		assert_eq!(event.response().status, StatusCode::NOT_FOUND);
	}

	#[rstest]
	fn test_dispatch_without_route_match_fails() {
		let listener = DispatchListener::new(Arc::new(ControllerManager::new()));
		let mut event = MvcEvent::default();

		assert_eq!(listener.on_dispatch(&mut event), Err(DispatchError::MissingRouteMatch));
	}
}
