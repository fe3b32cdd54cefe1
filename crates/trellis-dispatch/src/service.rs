//! Service lookup used to hand cross-cutting collaborators to controllers.

use parking_lot::RwLock;
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// A type-erased service instance.
pub type Service = Arc<dyn Any + Send + Sync>;

/// Builds a service. The manager is passed so factories can pull their own
/// dependencies.
pub type ServiceFactory = Arc<dyn Fn(&ServiceManager) -> Service + Send + Sync>;

/// Lookup of services by identifier.
pub trait ServiceLocator: Send + Sync {
	fn get(&self, id: &str) -> Option<Service>;

	fn has(&self, id: &str) -> bool;
}

impl<'a> dyn ServiceLocator + 'a {
	/// Looks up a service and downcasts it to `T`.
	///
	/// Returns `None` when the service is missing or of another type.
	pub fn get_as<T: Any + Send + Sync>(&self, id: &str) -> Option<Arc<T>> {
		self.get(id).and_then(|service| service.downcast::<T>().ok())
	}
}

/// Capability of controllers that accept a [`ServiceLocator`].
pub trait ServiceLocatorAware {
	fn set_service_locator(&mut self, services: Arc<dyn ServiceLocator>);
}

/// Registry of service instances and factories.
///
/// Factory-built services are shared (built once and cached) unless marked
/// otherwise with [`set_shared`](Self::set_shared).
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use trellis_dispatch::{ServiceLocator, ServiceManager};
///
/// let services = ServiceManager::new();
/// services.set_factory("greeting", |_| Arc::new(String::from("hello")));
/// services.set_alias("hello", "greeting");
///
/// let locator: &dyn ServiceLocator = &services;
/// assert_eq!(*locator.get_as::<String>("hello").unwrap(), "hello");
/// assert!(locator.get_as::<u32>("greeting").is_none());
/// ```
#[derive(Default)]
pub struct ServiceManager {
	instances: RwLock<HashMap<String, Service>>,
	factories: RwLock<HashMap<String, ServiceFactory>>,
	aliases: RwLock<HashMap<String, String>>,
	unshared: RwLock<HashSet<String>>,
}

impl ServiceManager {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a ready-made instance.
	pub fn set_service<T: Any + Send + Sync>(&self, id: impl Into<String>, service: T) {
		self.instances.write().insert(id.into(), Arc::new(service));
	}

	pub fn set_factory<F>(&self, id: impl Into<String>, factory: F)
	where
		F: Fn(&ServiceManager) -> Service + Send + Sync + 'static,
	{
		self.factories.write().insert(id.into(), Arc::new(factory));
	}

	pub fn set_alias(&self, alias: impl Into<String>, target: impl Into<String>) {
		self.aliases.write().insert(alias.into(), target.into());
	}

	/// Whether the factory for `id` caches its instance.
	pub fn set_shared(&self, id: impl Into<String>, shared: bool) {
		let id = id.into();
		let mut unshared = self.unshared.write();
		if shared {
			unshared.remove(&id);
		} else {
			unshared.insert(id);
		}
	}

	/// Follows aliases to the registered name. Alias cycles end at the
	/// first repeated name.
	fn resolve(&self, id: &str) -> String {
		let aliases = self.aliases.read();
		let mut current = id.to_string();
		let mut seen = HashSet::new();
		while let Some(target) = aliases.get(&current) {
			if !seen.insert(current.clone()) {
				break;
			}
			current = target.clone();
		}
		current
	}
}

impl ServiceLocator for ServiceManager {
	fn get(&self, id: &str) -> Option<Service> {
		let id = self.resolve(id);
		if let Some(service) = self.instances.read().get(&id) {
			return Some(Arc::clone(service));
		}

		let factory = self.factories.read().get(&id).cloned()?;
		trace!(service = %id, "building service");
		let service = factory(self);
		if !self.unshared.read().contains(&id) {
			self.instances.write().insert(id, Arc::clone(&service));
		}
		Some(service)
	}

	fn has(&self, id: &str) -> bool {
		let id = self.resolve(id);
		self.instances.read().contains_key(&id) || self.factories.read().contains_key(&id)
	}
}

impl fmt::Debug for ServiceManager {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut ids: Vec<String> = self.instances.read().keys().cloned().collect();
		ids.extend(self.factories.read().keys().cloned());
		ids.sort();
		ids.dedup();
		f.debug_struct("ServiceManager").field("services", &ids).finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::sync::atomic::{AtomicUsize, Ordering};

	#[rstest]
	fn test_shared_factory_runs_once() {
		// Arrange
		let services = ServiceManager::new();
		let calls = Arc::new(AtomicUsize::new(0));
		let counter = Arc::clone(&calls);
		services.set_factory("config", move |_| {
			counter.fetch_add(1, Ordering::SeqCst);
			Arc::new(42u32)
		});

		// Act
		let first = services.get("config").unwrap();
		let second = services.get("config").unwrap();

		// Assert
		assert!(Arc::ptr_eq(&first, &second));
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[rstest]
	fn test_unshared_factory_builds_every_time() {
		let services = ServiceManager::new();
		services.set_factory("id", |_| Arc::new(String::from("x")));
		services.set_shared("id", false);

		let first = services.get("id").unwrap();
		let second = services.get("id").unwrap();

		assert!(!Arc::ptr_eq(&first, &second));
	}

	#[rstest]
	fn test_factory_can_resolve_dependencies() {
		// Arrange
		let services = ServiceManager::new();
		services.set_service("base", 20u32);
		services.set_factory("derived", |sm| {
			let locator: &dyn ServiceLocator = sm;
			let base = locator.get_as::<u32>("base").map_or(0, |b| *b);
			Arc::new(base + 1)
		});
		let locator: &dyn ServiceLocator = &services;

		// Act
		let derived = locator.get_as::<u32>("derived");

		// Assert
		assert_eq!(derived.as_deref(), Some(&21));
	}

	#[rstest]
	fn test_alias_cycle_does_not_hang() {
		let services = ServiceManager::new();
		services.set_alias("a", "b");
		services.set_alias("b", "a");

		assert!(!services.has("a"));
		assert!(services.get("a").is_none());
	}
}
