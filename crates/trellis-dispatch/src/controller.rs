//! Dispatchable controllers.
//!
//! [`AbstractController`] wraps a [`Controller`] with an event manager: each
//! call to [`Dispatchable::dispatch`] triggers [`EVENT_DISPATCH`], and the
//! controller's own [`Controller::on_dispatch`] is one listener among others.
//! A listener with a higher priority that returns a response short-circuits
//! the controller entirely.

use crate::controller_manager::ControllerInstance;
use crate::error::{DispatchError, Result};
use crate::mvc_event::{ActionResult, DispatchOutcome, EVENT_DISPATCH, MvcEvent, short_circuits};
use crate::plugins::{Plugin, PluginCall, PluginManager, PluginManagerAware, PluginOptions};
use crate::service::{ServiceLocator, ServiceLocatorAware};
use parking_lot::RwLock;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use trellis_events::{DEFAULT_LISTENER_PRIORITY, EventManager, SharedEventManager};
use trellis_http::{Request, Response};
use tracing::{trace, warn};

/// Event manager type used throughout the MVC layer.
pub type MvcEventManager = EventManager<MvcEvent, DispatchOutcome>;

/// Shared listener registry for MVC event managers.
pub type SharedMvcEvents = SharedEventManager<MvcEvent, DispatchOutcome>;

/// Appended to every method name derived from an action token.
pub const ACTION_SUFFIX: &str = "Action";

/// Derives the handler method name for an action token.
///
/// The token is split on `.`, `-`, `_` and whitespace; every word gets an
/// upper-case first letter, the words are joined without separators, the
/// first letter of the result is lower-cased and [`ACTION_SUFFIX`] is
/// appended. Letters after the first of each word are kept as they are.
///
/// # Examples
///
/// ```
/// use trellis_dispatch::method_from_action;
///
/// assert_eq!(method_from_action("foo.bar-baz_qux"), "fooBarBazQuxAction");
/// assert_eq!(method_from_action("index"), "indexAction");
/// ```
pub fn method_from_action(action: &str) -> String {
	let mut joined = String::with_capacity(action.len());
	for word in action.split(|c: char| matches!(c, '.' | '-' | '_') || c.is_whitespace()) {
		let mut chars = word.chars();
		if let Some(first) = chars.next() {
			joined.extend(first.to_uppercase());
			joined.push_str(chars.as_str());
		}
	}

	let mut chars = joined.chars();
	let mut method: String = match chars.next() {
		Some(first) => first.to_lowercase().chain(chars).collect(),
		None => String::new(),
	};
	method.push_str(ACTION_SUFFIX);
	method
}

/// Something that turns a request into a result.
pub trait Dispatchable: Send + Sync {
	/// Dispatches a request. A default response is created when `response`
	/// is `None`.
	///
	/// Returns the short-circuiting response when a listener produced one,
	/// otherwise whatever the controller's handler produced.
	fn dispatch(&mut self, request: Request, response: Option<Response>) -> Result<ActionResult>;

	/// Response bound by the most recent dispatch, including changes made by
	/// listeners and plugins.
	fn response(&self) -> Option<&Response> {
		None
	}
}

/// Capability of controllers that own an event manager.
pub trait EventManagerAware {
	fn set_event_manager(&mut self, events: Arc<MvcEventManager>);

	/// Returns the event manager, creating a private one on first use.
	fn event_manager(&mut self) -> Arc<MvcEventManager>;
}

/// Capability of controllers that accept the application's event, and with
/// it the route match and router for the current request.
pub trait InjectApplicationEvent {
	fn set_event(&mut self, event: MvcEvent);

	fn event(&self) -> Option<&MvcEvent>;
}

/// Collaborators available to a controller while it handles a request.
#[derive(Clone, Default)]
pub struct ControllerContext {
	plugins: Option<Arc<PluginManager>>,
	services: Option<Arc<dyn ServiceLocator>>,
}

impl ControllerContext {
	pub fn new(plugins: Option<Arc<PluginManager>>, services: Option<Arc<dyn ServiceLocator>>) -> Self {
		Self { plugins, services }
	}

	pub fn plugins(&self) -> Option<&Arc<PluginManager>> {
		self.plugins.as_ref()
	}

	pub fn services(&self) -> Option<&Arc<dyn ServiceLocator>> {
		self.services.as_ref()
	}

	fn require_plugins(&self, name: &str) -> Result<&Arc<PluginManager>> {
		self.plugins
			.as_ref()
			.ok_or_else(|| DispatchError::PluginNotFound(name.to_string()))
	}

	/// Looks up a shared plugin.
	pub fn plugin(&self, name: &str) -> Result<Arc<dyn Plugin>> {
		self.require_plugins(name)?.get(name)
	}

	/// Builds a fresh plugin configured with `options`.
	pub fn plugin_with_options(&self, name: &str, options: &PluginOptions) -> Result<Arc<dyn Plugin>> {
		self.require_plugins(name)?.get_with_options(name, options)
	}

	pub fn plugin_as<T: Plugin>(&self, name: &str) -> Result<Arc<T>> {
		self.require_plugins(name)?.get_as::<T>(name)
	}

	/// Calls a plugin by name: invokable plugins run, others are returned.
	pub fn call(&self, name: &str, event: &mut MvcEvent, args: &[Value]) -> Result<PluginCall> {
		self.require_plugins(name)?.call(name, event, args)
	}

	pub fn service_as<T: Any + Send + Sync>(&self, id: &str) -> Option<Arc<T>> {
		self.services.as_ref()?.get_as::<T>(id)
	}
}

impl fmt::Debug for ControllerContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ControllerContext")
			.field("plugins", &self.plugins)
			.field("services", &self.services.is_some())
			.finish()
	}
}

/// Request handling logic of a controller.
pub trait Controller: Send + Sync + 'static {
	/// Handles the dispatch event. The returned value becomes the event's
	/// result.
	fn on_dispatch(&self, event: &mut MvcEvent, context: &ControllerContext) -> DispatchOutcome;

	/// Name used as the event target and as an event manager identifier.
	fn controller_name(&self) -> &'static str {
		std::any::type_name::<Self>()
	}

	/// Additional identifier shared listeners can subscribe to.
	fn event_identifier(&self) -> Option<&'static str> {
		None
	}
}

/// Event-driven dispatch around a [`Controller`].
///
/// # Examples
///
/// ```
/// use trellis_dispatch::{
///     AbstractController, ActionResult, Controller, ControllerContext, DispatchOutcome,
///     Dispatchable, EventManagerAware, MvcEvent,
/// };
/// use trellis_http::{Request, Response};
///
/// struct Hello;
///
/// impl Controller for Hello {
///     fn on_dispatch(&self, _event: &mut MvcEvent, _context: &ControllerContext) -> DispatchOutcome {
///         Ok(ActionResult::Value(serde_json::json!("hello")))
///     }
/// }
///
/// let mut controller = AbstractController::new(Hello);
/// let result = controller.dispatch(Request::default(), None).unwrap();
/// assert_eq!(result, ActionResult::Value(serde_json::json!("hello")));
///
/// // A higher-priority listener returning a response wins.
/// controller
///     .event_manager()
///     .attach_with_priority("dispatch", 100, |_| Ok(ActionResult::Response(Response::not_found())))
///     .unwrap();
/// let result = controller.dispatch(Request::default(), None).unwrap();
/// assert_eq!(result, ActionResult::Response(Response::not_found()));
/// ```
pub struct AbstractController<C: Controller> {
	controller: Arc<C>,
	context: Arc<RwLock<ControllerContext>>,
	events: Option<Arc<MvcEventManager>>,
	event: Option<MvcEvent>,
}

impl<C: Controller> AbstractController<C> {
	pub fn new(controller: C) -> Self {
		Self {
			controller: Arc::new(controller),
			context: Arc::new(RwLock::new(ControllerContext::default())),
			events: None,
			event: None,
		}
	}

	pub fn controller(&self) -> &C {
		&self.controller
	}

	/// Identifiers given to the event manager so that shared listeners can
	/// target this controller.
	pub fn identifiers(&self) -> Vec<String> {
		let name = self.controller.controller_name();
		let mut identifiers = vec![
			"Dispatchable".to_string(),
			"AbstractController".to_string(),
			name.to_string(),
		];
		if let Some(identifier) = self.controller.event_identifier() {
			identifiers.push(identifier.to_string());
		}
		if let Some((namespace, _)) = name.split_once("::") {
			identifiers.push(namespace.to_string());
		}
		identifiers
	}

	/// Plugin manager, created with the built-in plugins on first use.
	pub fn plugins(&self) -> Arc<PluginManager> {
		if let Some(plugins) = self.context.read().plugins() {
			return Arc::clone(plugins);
		}
		let mut context = self.context.write();
		Arc::clone(
			context
				.plugins
				.get_or_insert_with(|| Arc::new(PluginManager::new())),
		)
	}

	pub fn plugin(&self, name: &str) -> Result<Arc<dyn Plugin>> {
		self.plugins().get(name)
	}

	pub fn service_locator(&self) -> Option<Arc<dyn ServiceLocator>> {
		self.context.read().services().cloned()
	}

	fn attach_default_listeners(&self, events: &MvcEventManager) {
		let controller = Arc::clone(&self.controller);
		let context = Arc::clone(&self.context);
		let attached = events.attach_with_priority(EVENT_DISPATCH, DEFAULT_LISTENER_PRIORITY, move |event| {
			let context = context.read().clone();
			let outcome = controller.on_dispatch(event, &context);
			if let Ok(result) = &outcome {
				event.set_result(result.clone());
			}
			outcome
		});
		if let Err(err) = attached {
			warn!(error = %err, "could not attach dispatch listener");
		}
	}
}

impl<C: Controller> Dispatchable for AbstractController<C> {
	fn dispatch(&mut self, request: Request, response: Option<Response>) -> Result<ActionResult> {
		let events = self.event_manager();
		self.plugins();

		let mut event = self.event.take().unwrap_or_default();
		event.set_request(request);
		event.set_response(response.unwrap_or_default());
		event.set_target(self.controller.controller_name());

		let responses = events.trigger_until(EVENT_DISPATCH, &mut event, short_circuits);
		let outcome = if responses.stopped() {
			trace!(controller = self.controller.controller_name(), "dispatch short-circuited");
			responses.into_last().unwrap_or(Ok(ActionResult::Empty))
		} else {
			Ok(event.result().cloned().unwrap_or_default())
		};

		self.event = Some(event);
		outcome
	}

	fn response(&self) -> Option<&Response> {
		self.event.as_ref().map(MvcEvent::response)
	}
}

impl<C: Controller> EventManagerAware for AbstractController<C> {
	fn set_event_manager(&mut self, events: Arc<MvcEventManager>) {
		events.set_identifiers(self.identifiers());
		self.attach_default_listeners(&events);
		self.events = Some(events);
	}

	fn event_manager(&mut self) -> Arc<MvcEventManager> {
		if let Some(events) = &self.events {
			return Arc::clone(events);
		}
		let events = Arc::new(MvcEventManager::new());
		self.set_event_manager(Arc::clone(&events));
		events
	}
}

impl<C: Controller> InjectApplicationEvent for AbstractController<C> {
	fn set_event(&mut self, event: MvcEvent) {
		self.event = Some(event);
	}

	fn event(&self) -> Option<&MvcEvent> {
		self.event.as_ref()
	}
}

impl<C: Controller> ServiceLocatorAware for AbstractController<C> {
	fn set_service_locator(&mut self, services: Arc<dyn ServiceLocator>) {
		self.context.write().services = Some(services);
	}
}

impl<C: Controller> PluginManagerAware for AbstractController<C> {
	fn set_plugin_manager(&mut self, plugins: Arc<PluginManager>) {
		self.context.write().plugins = Some(plugins);
	}
}

impl<C: Controller> ControllerInstance for AbstractController<C> {
	fn controller_name(&self) -> &str {
		self.controller.controller_name()
	}

	fn as_any(&self) -> &dyn Any {
		self
	}

	fn as_dispatchable(&self) -> Option<&dyn Dispatchable> {
		Some(self)
	}

	fn as_dispatchable_mut(&mut self) -> Option<&mut dyn Dispatchable> {
		Some(self)
	}

	fn as_event_manager_aware(&mut self) -> Option<&mut dyn EventManagerAware> {
		Some(self)
	}

	fn as_service_locator_aware(&mut self) -> Option<&mut dyn ServiceLocatorAware> {
		Some(self)
	}

	fn as_plugin_manager_aware(&mut self) -> Option<&mut dyn PluginManagerAware> {
		Some(self)
	}

	fn as_application_event_aware(&mut self) -> Option<&mut dyn InjectApplicationEvent> {
		Some(self)
	}
}

impl<C: Controller> fmt::Debug for AbstractController<C> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AbstractController")
			.field("controller", &self.controller.controller_name())
			.field("events", &self.events)
			.finish()
	}
}
