use super::{Params, Plugin, PluginCall, Redirect, Url};
use crate::error::{DispatchError, Result};
use crate::mvc_event::MvcEvent;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Construction options passed to a plugin factory.
pub type PluginOptions = Map<String, Value>;

pub type PluginFactory = Arc<dyn Fn(&PluginOptions) -> Result<Arc<dyn Plugin>> + Send + Sync>;

/// Normalizes a plugin name: lower case, without `-`, `_`, spaces or path
/// separators. `"Redirect"`, `"re-direct"` and `"RE_DIRECT"` are one plugin.
///
/// # Examples
///
/// ```
/// use trellis_dispatch::plugins::canonicalize;
///
/// assert_eq!(canonicalize("FlashMessenger"), "flashmessenger");
/// assert_eq!(canonicalize("flash_messenger"), "flashmessenger");
/// assert_eq!(canonicalize("flash-messenger"), "flashmessenger");
/// ```
pub fn canonicalize(name: &str) -> String {
	name.chars()
		.filter(|c| !matches!(c, '-' | '_' | ' ' | '\\' | '/'))
		.flat_map(char::to_lowercase)
		.collect()
}

/// Capability of controllers that accept a [`PluginManager`].
pub trait PluginManagerAware {
	fn set_plugin_manager(&mut self, plugins: Arc<PluginManager>);
}

/// Registry of controller plugins looked up by (canonicalized) name.
///
/// Plugins obtained through [`get`](Self::get) are built once and shared.
/// Passing options through [`get_with_options`](Self::get_with_options)
/// always builds a fresh, unshared instance.
pub struct PluginManager {
	factories: RwLock<HashMap<String, PluginFactory>>,
	aliases: RwLock<HashMap<String, String>>,
	instances: RwLock<HashMap<String, Arc<dyn Plugin>>>,
}

impl PluginManager {
	/// Creates a registry holding the built-in `params`, `url` and `redirect`
	/// plugins.
	pub fn new() -> Self {
		let manager = Self::empty();
		manager.register_factory("params", |_| Ok(Arc::new(Params) as Arc<dyn Plugin>));
		manager.register_factory("url", |_| Ok(Arc::new(Url) as Arc<dyn Plugin>));
		manager.register_factory("redirect", |_| Ok(Arc::new(Redirect) as Arc<dyn Plugin>));
		manager
	}

	/// Creates a registry without any plugins.
	pub fn empty() -> Self {
		Self {
			factories: RwLock::new(HashMap::new()),
			aliases: RwLock::new(HashMap::new()),
			instances: RwLock::new(HashMap::new()),
		}
	}

	pub fn register_factory<F>(&self, name: &str, factory: F)
	where
		F: Fn(&PluginOptions) -> Result<Arc<dyn Plugin>> + Send + Sync + 'static,
	{
		let name = canonicalize(name);
		self.instances.write().remove(&name);
		self.factories.write().insert(name, Arc::new(factory));
	}

	/// Registers a ready-made shared instance.
	pub fn register_instance(&self, name: &str, plugin: impl Plugin) {
		self.instances
			.write()
			.insert(canonicalize(name), Arc::new(plugin));
	}

	pub fn set_alias(&self, alias: &str, target: &str) {
		self.aliases
			.write()
			.insert(canonicalize(alias), canonicalize(target));
	}

	fn resolve(&self, name: &str) -> String {
		let aliases = self.aliases.read();
		let mut current = canonicalize(name);
		let mut seen = HashSet::new();
		while let Some(target) = aliases.get(&current) {
			if !seen.insert(current.clone()) {
				break;
			}
			current = target.clone();
		}
		current
	}

	pub fn has(&self, name: &str) -> bool {
		let name = self.resolve(name);
		self.instances.read().contains_key(&name) || self.factories.read().contains_key(&name)
	}

	/// Returns the shared instance of a plugin, building it on first use.
	///
	/// # Errors
	///
	/// [`DispatchError::PluginNotFound`] for unknown names, or the factory's
	/// own error.
	pub fn get(&self, name: &str) -> Result<Arc<dyn Plugin>> {
		let canonical = self.resolve(name);
		if let Some(plugin) = self.instances.read().get(&canonical) {
			return Ok(Arc::clone(plugin));
		}

		let plugin = self.build(name, &canonical, &PluginOptions::new())?;
		let mut instances = self.instances.write();
		// A concurrent caller may have built it first; keep a single instance.
		let shared = instances
			.entry(canonical)
			.or_insert_with(|| Arc::clone(&plugin));
		Ok(Arc::clone(shared))
	}

	/// Builds a new, unshared instance configured with `options`.
	pub fn get_with_options(&self, name: &str, options: &PluginOptions) -> Result<Arc<dyn Plugin>> {
		let canonical = self.resolve(name);
		self.build(name, &canonical, options)
	}

	fn build(&self, name: &str, canonical: &str, options: &PluginOptions) -> Result<Arc<dyn Plugin>> {
		let factory = self
			.factories
			.read()
			.get(canonical)
			.cloned()
			.ok_or_else(|| DispatchError::PluginNotFound(name.to_string()))?;
		debug!(plugin = %canonical, "building plugin");
		factory(options)
	}

	/// Returns a plugin downcast to its concrete type.
	///
	/// # Examples
	///
	/// ```
	/// use trellis_dispatch::plugins::{PluginManager, Redirect};
	///
	/// let plugins = PluginManager::new();
	/// let redirect = plugins.get_as::<Redirect>("Redirect").unwrap();
	/// # let _ = redirect;
	/// assert!(plugins.get_as::<Redirect>("url").is_err());
	/// ```
	pub fn get_as<T: Plugin>(&self, name: &str) -> Result<Arc<T>> {
		self.get(name)?.into_any().downcast::<T>().map_err(|_| {
			DispatchError::Runtime(format!(
				"plugin \"{name}\" is not a {}",
				std::any::type_name::<T>()
			))
		})
	}

	/// Calls a plugin by name.
	///
	/// Invokable plugins are invoked with `args` and their value returned;
	/// any other plugin is returned as an instance.
	pub fn call(&self, name: &str, event: &mut MvcEvent, args: &[Value]) -> Result<PluginCall> {
		let plugin = self.get(name)?;
		let invoked = match plugin.as_invokable() {
			Some(invokable) => Some(invokable.invoke(event, args)?),
			None => None,
		};
		Ok(match invoked {
			Some(value) => {
				trace!(plugin = name, "plugin invoked");
				PluginCall::Invoked(value)
			}
			None => PluginCall::Instance(plugin),
		})
	}
}

impl Default for PluginManager {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for PluginManager {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut names: Vec<String> = self.factories.read().keys().cloned().collect();
		names.extend(self.instances.read().keys().cloned());
		names.sort();
		names.dedup();
		f.debug_struct("PluginManager").field("plugins", &names).finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::plugins::Invokable;
	use rstest::{fixture, rstest};
	use serde_json::json;
	use std::any::Any;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use trellis_http::{Request, Response};
	use trellis_urls::{Params as RouteParams, RouteMatch};

	#[derive(Debug)]
	struct Counter(usize);

	impl Plugin for Counter {
		fn as_any(&self) -> &dyn Any {
			self
		}

		fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
			self
		}
	}

	struct Echo;

	impl Invokable for Echo {
		fn invoke(&self, _event: &mut MvcEvent, args: &[Value]) -> Result<Value> {
			Ok(Value::Array(args.to_vec()))
		}
	}

	impl Plugin for Echo {
		fn as_invokable(&self) -> Option<&dyn Invokable> {
			Some(self)
		}

		fn as_any(&self) -> &dyn Any {
			self
		}

		fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
			self
		}
	}

	#[fixture]
	fn event() -> MvcEvent {
		let mut params = RouteParams::new();
		params.insert("id".into(), json!("7"));
		let mut event = MvcEvent::new(Request::default(), Response::ok());
		event.set_route_match(Some(RouteMatch::new(params, 0)));
		event
	}

	#[rstest]
	#[case("params")]
	#[case("Params")]
	#[case("PARAMS")]
	#[case("pa-ra_ms")]
	fn test_lookup_is_case_and_separator_insensitive(#[case] name: &str) {
		assert!(PluginManager::new().has(name));
	}

	#[rstest]
	fn test_unknown_plugin() {
		let err = PluginManager::new().get("nope").unwrap_err();

		assert_eq!(err, DispatchError::PluginNotFound("nope".into()));
	}

	#[rstest]
	fn test_plugin_debug_reports_invokable() {
		let plugins = PluginManager::new();

		let url = plugins.get("url").unwrap();
		let redirect = plugins.get("redirect").unwrap();

		assert_eq!(format!("{url:?}"), "Plugin { invokable: true, .. }");
		assert_eq!(format!("{redirect:?}"), "Plugin { invokable: false, .. }");
	}

	#[rstest]
	fn test_shared_unless_options_given() {
		// Arrange
		let plugins = PluginManager::empty();
		let builds = Arc::new(AtomicUsize::new(0));
		let counter = Arc::clone(&builds);
		plugins.register_factory("counter", move |options| {
			let n = counter.fetch_add(1, Ordering::SeqCst);
			let start = options.get("start").and_then(Value::as_u64).unwrap_or(0) as usize;
			Ok(Arc::new(Counter(start + n)) as Arc<dyn Plugin>)
		});
		let mut options = PluginOptions::new();
		options.insert("start".into(), json!(100));

		// Act
		let a = plugins.get("counter").unwrap();
		let b = plugins.get("counter").unwrap();
		let c = plugins.get_with_options("counter", &options).unwrap();

		// Assert
		assert!(Arc::ptr_eq(&a, &b));
		assert_eq!(builds.load(Ordering::SeqCst), 2);
		assert_eq!(c.as_any().downcast_ref::<Counter>().map(|c| c.0), Some(101));
	}

	#[rstest]
	fn test_call_invokes_invokable_plugins(mut event: MvcEvent) {
		let plugins = PluginManager::empty();
		plugins.register_instance("echo", Echo);

		let call = plugins.call("echo", &mut event, &[json!(1), json!("two")]).unwrap();

		assert_eq!(call.into_value(), Some(json!([1, "two"])));
	}

	#[rstest]
	fn test_call_returns_non_invokable_instance(mut event: MvcEvent) {
		let plugins = PluginManager::new();

		let call = plugins.call("redirect", &mut event, &[]).unwrap();

		let instance = call.into_instance().unwrap();
		assert!(instance.as_any().downcast_ref::<Redirect>().is_some());
	}

	#[rstest]
	fn test_call_params_reads_route(mut event: MvcEvent) {
		let plugins = PluginManager::new();

		let call = plugins.call("params", &mut event, &[json!("id")]).unwrap();

		assert_eq!(call.into_value(), Some(json!("7")));
	}

	#[rstest]
	fn test_alias_resolves_to_target() {
		let plugins = PluginManager::new();
		plugins.set_alias("go_to", "redirect");

		assert!(plugins.get_as::<Redirect>("GoTo").is_ok());
	}
}
