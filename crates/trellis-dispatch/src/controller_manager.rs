//! Controller registry.
//!
//! Only names registered here resolve to controllers. Every lookup builds a
//! fresh instance, runs the user initializers, injects the registry's
//! collaborators and finally checks that the instance can be dispatched.

use crate::controller::{
	AbstractController, Controller, Dispatchable, EventManagerAware, InjectApplicationEvent,
	MvcEventManager, SharedMvcEvents,
};
use crate::error::{DispatchError, Result};
use crate::plugins::{PluginManager, PluginManagerAware};
use crate::service::{ServiceLocator, ServiceLocatorAware};
use indexmap::IndexMap;
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// A resolved controller and the capabilities it exposes.
///
/// Each accessor returns `None` unless the instance has that capability.
/// The registry refuses instances without [`Dispatchable`].
pub trait ControllerInstance: Send + Sync + 'static {
	fn controller_name(&self) -> &str;

	fn as_any(&self) -> &dyn Any;

	fn as_dispatchable(&self) -> Option<&dyn Dispatchable> {
		None
	}

	fn as_dispatchable_mut(&mut self) -> Option<&mut dyn Dispatchable> {
		None
	}

	fn as_event_manager_aware(&mut self) -> Option<&mut dyn EventManagerAware> {
		None
	}

	fn as_service_locator_aware(&mut self) -> Option<&mut dyn ServiceLocatorAware> {
		None
	}

	fn as_plugin_manager_aware(&mut self) -> Option<&mut dyn PluginManagerAware> {
		None
	}

	fn as_application_event_aware(&mut self) -> Option<&mut dyn InjectApplicationEvent> {
		None
	}
}

impl fmt::Debug for dyn ControllerInstance {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ControllerInstance")
			.field("name", &self.controller_name())
			.field("dispatchable", &self.as_dispatchable().is_some())
			.finish()
	}
}

/// Builds a controller instance.
pub type ControllerFactory = Arc<dyn Fn(&ControllerManager) -> Box<dyn ControllerInstance> + Send + Sync>;

/// Runs against every freshly built controller, before collaborators are
/// injected.
pub type ControllerInitializer = Arc<dyn Fn(&mut dyn ControllerInstance, &ControllerManager) + Send + Sync>;

/// Registry of controller factories.
///
/// Registration takes `&mut self` and happens while the application is
/// assembled; lookups take `&self` and are safe to run concurrently.
#[derive(Default)]
pub struct ControllerManager {
	factories: IndexMap<String, ControllerFactory>,
	aliases: HashMap<String, String>,
	initializers: Vec<ControllerInitializer>,
	services: Option<Arc<dyn ServiceLocator>>,
	shared_events: Option<Arc<SharedMvcEvents>>,
	plugins: Option<Arc<PluginManager>>,
}

impl ControllerManager {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a factory under `name`, replacing any previous one.
	pub fn register<F, T>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
	where
		F: Fn(&ControllerManager) -> T + Send + Sync + 'static,
		T: ControllerInstance,
	{
		let name = name.into();
		debug!(controller = %name, "registering controller");
		let factory: ControllerFactory =
			Arc::new(move |manager: &ControllerManager| -> Box<dyn ControllerInstance> {
				Box::new(factory(manager))
			});
		self.factories.insert(name, factory);
		self
	}

	/// Registers a controller that is cloned into a new
	/// [`AbstractController`] on every lookup.
	pub fn register_controller<C>(&mut self, name: impl Into<String>, controller: C) -> &mut Self
	where
		C: Controller + Clone,
	{
		self.register(name, move |_| AbstractController::new(controller.clone()))
	}

	pub fn set_alias(&mut self, alias: impl Into<String>, target: impl Into<String>) -> &mut Self {
		self.aliases.insert(alias.into(), target.into());
		self
	}

	pub fn add_initializer<F>(&mut self, initializer: F) -> &mut Self
	where
		F: Fn(&mut dyn ControllerInstance, &ControllerManager) + Send + Sync + 'static,
	{
		self.initializers.push(Arc::new(initializer));
		self
	}

	pub fn set_service_locator(&mut self, services: Arc<dyn ServiceLocator>) -> &mut Self {
		self.services = Some(services);
		self
	}

	pub fn service_locator(&self) -> Option<&Arc<dyn ServiceLocator>> {
		self.services.as_ref()
	}

	/// Shared listeners handed to every controller's event manager.
	pub fn set_shared_events(&mut self, shared: Arc<SharedMvcEvents>) -> &mut Self {
		self.shared_events = Some(shared);
		self
	}

	pub fn shared_events(&self) -> Option<&Arc<SharedMvcEvents>> {
		self.shared_events.as_ref()
	}

	/// Plugin manager shared by every controller. Without one, each
	/// controller creates its own on first use.
	pub fn set_plugin_manager(&mut self, plugins: Arc<PluginManager>) -> &mut Self {
		self.plugins = Some(plugins);
		self
	}

	pub fn plugin_manager(&self) -> Option<&Arc<PluginManager>> {
		self.plugins.as_ref()
	}

	/// Follows aliases to a registered name. Cycles end at the first
	/// repeated name.
	pub fn resolve_alias(&self, name: &str) -> String {
		let mut current = name.to_string();
		let mut seen = HashSet::new();
		while let Some(target) = self.aliases.get(&current) {
			if !seen.insert(current.clone()) {
				warn!(alias = %name, "alias cycle");
				break;
			}
			current = target.clone();
		}
		current
	}

	pub fn has(&self, name: &str) -> bool {
		self.factories.contains_key(&self.resolve_alias(name))
	}

	/// Registered names in registration order.
	pub fn names(&self) -> Vec<&str> {
		self.factories.keys().map(String::as_str).collect()
	}

	/// Builds the controller registered under `name` (or an alias of it).
	///
	/// # Errors
	///
	/// [`DispatchError::ControllerNotFound`] for unregistered names,
	/// [`DispatchError::InvalidController`] when the built instance is not
	/// dispatchable.
	pub fn get(&self, name: &str) -> Result<Box<dyn ControllerInstance>> {
		let canonical = self.resolve_alias(name);
		let factory = self
			.factories
			.get(&canonical)
			.ok_or_else(|| DispatchError::ControllerNotFound(name.to_string()))?;

		debug!(controller = %canonical, "building controller");
		let mut instance = factory(self);
		for initializer in &self.initializers {
			initializer(instance.as_mut(), self);
		}
		self.inject(instance.as_mut());
		self.validate(name, instance.as_ref())?;
		Ok(instance)
	}

	/// Checks that `instance` can be dispatched.
	pub fn validate(&self, name: &str, instance: &dyn ControllerInstance) -> Result<()> {
		if instance.as_dispatchable().is_some() {
			return Ok(());
		}
		warn!(controller = %name, "controller is not dispatchable");
		Err(DispatchError::InvalidController {
			name: name.to_string(),
			reason: format!("{} does not implement Dispatchable", instance.controller_name()),
		})
	}

	/// Hands the registry's collaborators to the capabilities the instance
	/// exposes: service locator, then event manager, then plugin manager.
	fn inject(&self, instance: &mut dyn ControllerInstance) {
		if let Some(services) = &self.services
			&& let Some(aware) = instance.as_service_locator_aware()
		{
			aware.set_service_locator(Arc::clone(services));
		}

		if let Some(aware) = instance.as_event_manager_aware() {
			let events = MvcEventManager::new();
			if let Some(shared) = &self.shared_events {
				events.set_shared_manager(Arc::clone(shared));
			}
			aware.set_event_manager(Arc::new(events));
		}

		if let Some(plugins) = &self.plugins
			&& let Some(aware) = instance.as_plugin_manager_aware()
		{
			aware.set_plugin_manager(Arc::clone(plugins));
		}
	}
}

impl fmt::Debug for ControllerManager {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ControllerManager")
			.field("controllers", &self.names())
			.field("aliases", &self.aliases)
			.field("initializers", &self.initializers.len())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::controller::ControllerContext;
	use crate::mvc_event::{ActionResult, DispatchOutcome, EVENT_DISPATCH, MvcEvent};
	use crate::service::ServiceManager;
	use parking_lot::Mutex;
	use rstest::{fixture, rstest};
	use serde_json::json;
	use trellis_http::{Request, Response};

	#[derive(Clone)]
	struct Greeter;

	impl Controller for Greeter {
		fn on_dispatch(&self, _event: &mut MvcEvent, context: &ControllerContext) -> DispatchOutcome {
			let greeting = context
				.service_as::<String>("greeting")
				.map_or_else(|| "none".to_string(), |s| s.to_string());
			Ok(ActionResult::Value(json!(greeting)))
		}
	}

	struct Inert;

	impl ControllerInstance for Inert {
		fn controller_name(&self) -> &str {
			"Inert"
		}

		fn as_any(&self) -> &dyn Any {
			self
		}
	}

	#[fixture]
	fn manager() -> ControllerManager {
		let services = ServiceManager::new();
		services.set_service("greeting", String::from("hello"));

		let mut manager = ControllerManager::new();
		manager
			.register_controller("greeter", Greeter)
			.register("inert", |_| Inert)
			.set_alias("hi", "greeter")
			.set_service_locator(Arc::new(services));
		manager
	}

	#[rstest]
	fn test_get_unknown_name_fails(manager: ControllerManager) {
		let err = manager.get("nope").unwrap_err();

		assert_eq!(err, DispatchError::ControllerNotFound("nope".into()));
	}

	#[rstest]
	fn test_get_rejects_non_dispatchable(manager: ControllerManager) {
		let err = manager.get("inert").unwrap_err();

		assert!(matches!(err, DispatchError::InvalidController { ref name, .. } if name == "inert"));
	}

	#[rstest]
	fn test_get_injects_service_locator(manager: ControllerManager) {
		// Arrange
		let mut controller = manager.get("greeter").unwrap();

		// Act
		let result = controller
			.as_dispatchable_mut()
			.unwrap()
			.dispatch(Request::default(), None)
			.unwrap();

		// Assert
		assert_eq!(result, ActionResult::Value(json!("hello")));
	}

	#[rstest]
	fn test_alias_resolves_to_registered_controller(manager: ControllerManager) {
		assert!(manager.has("hi"));
		assert!(manager.get("hi").is_ok());
	}

	#[rstest]
	fn test_alias_cycle_is_not_found() {
		let mut manager = ControllerManager::new();
		manager.set_alias("a", "b").set_alias("b", "a");

		assert!(!manager.has("a"));
		assert!(matches!(manager.get("a"), Err(DispatchError::ControllerNotFound(_))));
	}

	#[rstest]
	fn test_every_lookup_builds_a_new_instance(manager: ControllerManager) {
		let first = manager.get("greeter").unwrap();
		let second = manager.get("greeter").unwrap();

		assert!(!std::ptr::eq(first.as_any(), second.as_any()));
	}

	#[rstest]
	fn test_initializers_run_before_injection(mut manager: ControllerManager) {
		// Arrange
		let seen = Arc::new(Mutex::new(Vec::new()));
		let log = Arc::clone(&seen);
		manager.add_initializer(move |instance, _| {
			log.lock().push(instance.controller_name().to_string());
			if let Some(aware) = instance.as_event_manager_aware() {
				// Replaced by the injector afterwards.
				aware.set_event_manager(Arc::new(MvcEventManager::new()));
			}
		});

		// Act
		manager.get("greeter").unwrap();
		let _ = manager.get("inert");

		// Assert
		assert_eq!(seen.lock().len(), 2);
		assert!(seen.lock()[1].contains("Inert"));
	}

	#[rstest]
	fn test_shared_events_reach_controllers(mut manager: ControllerManager) {
		// Arrange
		let shared = Arc::new(SharedMvcEvents::new());
		shared
			.attach("AbstractController", EVENT_DISPATCH, 100, |_| {
				Ok(ActionResult::Response(Response::not_found()))
			})
			.unwrap();
		manager.set_shared_events(shared);
		let mut controller = manager.get("greeter").unwrap();

		// Act
		let result = controller
			.as_dispatchable_mut()
			.unwrap()
			.dispatch(Request::default(), None)
			.unwrap();

		// Assert
		assert_eq!(result, ActionResult::Response(Response::not_found()));
	}

	#[rstest]
	fn test_shared_plugin_manager_is_injected(mut manager: ControllerManager) {
		let plugins = Arc::new(PluginManager::new());
		manager.set_plugin_manager(Arc::clone(&plugins));

		let controller = manager.get("greeter").unwrap();
		let concrete = controller
			.as_any()
			.downcast_ref::<AbstractController<Greeter>>()
			.unwrap();

		assert!(Arc::ptr_eq(&concrete.plugins(), &plugins));
	}
}
