//! Front controller.

use crate::controller::{MvcEventManager, SharedMvcEvents};
use crate::controller_manager::ControllerManager;
use crate::error::Result;
use crate::listeners::{DispatchListener, module_route, route};
use crate::mvc_event::{
	ActionResult, DispatchOutcome, EVENT_BOOTSTRAP, EVENT_DISPATCH, EVENT_DISPATCH_ERROR, EVENT_FINISH,
	EVENT_ROUTE, MvcEvent, short_circuits,
};
use std::sync::Arc;
use tracing::{debug, warn};
use trellis_events::{DEFAULT_LISTENER_PRIORITY, ResponseCollection};
use trellis_http::{Request, Response};
use trellis_urls::RouteStack;

/// Identifier of the application's event manager.
pub const APPLICATION_IDENTIFIER: &str = "Application";

/// Runs requests through `route`, `dispatch` and `finish`.
///
/// A listener returning a response from `route` or `dispatch` ends the
/// cycle early with that response. When routing or dispatch marks an error
/// on the event, `dispatch.error` is triggered before `finish`.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use trellis_dispatch::{ActionController, ActionResult, Application, ControllerManager};
/// use trellis_http::{Request, Response, StatusCode};
/// use trellis_urls::{Params, RouteStack, Segment};
///
/// let mut defaults = Params::new();
/// defaults.insert("controller".to_string(), json!("hello"));
/// defaults.insert("action".to_string(), json!("greet"));
///
/// let mut router = RouteStack::new();
/// router.add_route(
///     "greet",
///     Segment::with_options("/hello/:name", Default::default(), defaults).unwrap(),
/// );
///
/// let mut controllers = ControllerManager::new();
/// controllers.register_controller(
///     "hello",
///     ActionController::new(()).action("greet", |_, ctx| {
///         let name = ctx.param("name").unwrap_or_default();
///         Ok(ActionResult::Response(Response::ok().with_body(format!("hello {name}"))))
///     }),
/// );
///
/// let app = Application::new(router, controllers);
/// let response = app.run(Request::get("/hello/ada").unwrap()).unwrap();
/// assert_eq!(response.body, "hello ada");
///
/// let response = app.run(Request::get("/nowhere").unwrap()).unwrap();
/// assert_eq!(response.status, StatusCode::NOT_FOUND);
/// ```
#[derive(Debug)]
pub struct Application {
	router: Arc<RouteStack>,
	controllers: Arc<ControllerManager>,
	events: Arc<MvcEventManager>,
}

impl Application {
	/// Builds the application and attaches the route and dispatch listeners.
	///
	/// Shared listeners configured on `controllers` also apply to the
	/// application's own events.
	pub fn new(router: RouteStack, controllers: ControllerManager) -> Self {
		let router = Arc::new(router);
		let controllers = Arc::new(controllers);
		let events = Arc::new(MvcEventManager::with_identifiers([APPLICATION_IDENTIFIER]));
		if let Some(shared) = controllers.shared_events() {
			events.set_shared_manager(Arc::clone(shared));
		}

		let app = Self {
			router,
			controllers,
			events,
		};
		app.attach_default_listeners();
		app
	}

	fn attach_default_listeners(&self) {
		let dispatcher = DispatchListener::new(Arc::clone(&self.controllers));
		let attached = self
			.events
			.attach_with_priority(EVENT_ROUTE, DEFAULT_LISTENER_PRIORITY, route)
			.and_then(|_| {
				self.events
					.attach_with_priority(EVENT_DISPATCH, DEFAULT_LISTENER_PRIORITY, move |event| {
						dispatcher.on_dispatch(event)
					})
			});
		if let Err(err) = attached {
			warn!(error = %err, "could not attach default listeners");
		}
	}

	/// Adds the listener that qualifies controllers with the matched module
	/// namespace. It runs after routing.
	pub fn with_module_route_listener(self) -> Self {
		if let Err(err) = self.events.attach_with_priority(EVENT_ROUTE, -1, module_route) {
			warn!(error = %err, "could not attach module route listener");
		}
		self
	}

	pub fn router(&self) -> &Arc<RouteStack> {
		&self.router
	}

	pub fn controllers(&self) -> &Arc<ControllerManager> {
		&self.controllers
	}

	pub fn events(&self) -> &Arc<MvcEventManager> {
		&self.events
	}

	pub fn shared_events(&self) -> Option<Arc<SharedMvcEvents>> {
		self.events.shared_manager()
	}

	/// Triggers `bootstrap` once the application is assembled.
	pub fn bootstrap(&self) -> ResponseCollection<DispatchOutcome> {
		let mut event = self.new_event(Request::default());
		self.events.trigger(EVENT_BOOTSTRAP, &mut event)
	}

	fn new_event(&self, request: Request) -> MvcEvent {
		let mut event = MvcEvent::new(request, Response::ok());
		event.set_router(Arc::clone(&self.router));
		event.set_target(APPLICATION_IDENTIFIER);
		event
	}

	/// Handles one request.
	///
	/// A request that matches no route, or whose route names an unknown
	/// controller, ends in a 404 response rather than an error.
	///
	/// # Errors
	///
	/// Errors returned by listeners, and controller errors that no
	/// `dispatch.error` listener turned into a response.
	pub fn run(&self, request: Request) -> Result<Response> {
		let mut event = self.new_event(request);
		debug!(method = %event.request().method, path = event.request().path(), "handling request");

		let routed = self.events.trigger_until(EVENT_ROUTE, &mut event, short_circuits);
		if Self::apply_short_circuit(&mut event, routed)? {
			return Ok(self.complete(event));
		}
		if event.is_error() {
			return self.complete_with_error(event);
		}

		let dispatched = self.events.trigger_until(EVENT_DISPATCH, &mut event, short_circuits);
		if Self::apply_short_circuit(&mut event, dispatched)? {
			return Ok(self.complete(event));
		}
		if event.is_error() {
			return self.complete_with_error(event);
		}

		Ok(self.complete(event))
	}

	/// Adopts the response of a trigger that a listener stopped.
	///
	/// Returns whether the event now holds the final response.
	fn apply_short_circuit(event: &mut MvcEvent, responses: ResponseCollection<DispatchOutcome>) -> Result<bool> {
		if !responses.stopped() {
			return Ok(false);
		}
		match responses.into_last() {
			Some(Ok(ActionResult::Response(response))) => {
				event.set_response(response);
				Ok(true)
			}
			Some(Err(err)) => Err(err),
			_ => Ok(false),
		}
	}

	fn complete_with_error(&self, mut event: MvcEvent) -> Result<Response> {
		debug!(error = event.error().unwrap_or_default(), "dispatch error");
		let responses = self.events.trigger_until(EVENT_DISPATCH_ERROR, &mut event, short_circuits);
		let handled = Self::apply_short_circuit(&mut event, responses)?;
		if !handled && let Some(exception) = event.take_exception() {
			return Err(exception);
		}
		Ok(self.complete(event))
	}

	fn complete(&self, mut event: MvcEvent) -> Response {
		self.events.trigger(EVENT_FINISH, &mut event);
		event.take_response()
	}
}
