//! Controller plugins.
//!
//! A plugin is a named helper a controller looks up at dispatch time. Plugins
//! that implement [`Invokable`] can be called directly by name through
//! [`PluginManager::call`]; the others are returned as instances and used
//! through their own methods.

mod manager;
mod params;
mod redirect;
mod url;

pub use manager::{PluginFactory, PluginManager, PluginManagerAware, PluginOptions, canonicalize};
pub use params::Params;
pub use redirect::Redirect;
pub use url::Url;

use crate::error::Result;
use crate::mvc_event::MvcEvent;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A controller helper registered with a [`PluginManager`].
pub trait Plugin: Send + Sync + 'static {
	/// Returns the callable face of the plugin, if it has one.
	fn as_invokable(&self) -> Option<&dyn Invokable> {
		None
	}

	fn as_any(&self) -> &dyn Any;

	fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl fmt::Debug for dyn Plugin {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Plugin")
			.field("invokable", &self.as_invokable().is_some())
			.finish_non_exhaustive()
	}
}

/// Plugins that can be called by name with positional arguments.
pub trait Invokable {
	fn invoke(&self, event: &mut MvcEvent, args: &[Value]) -> Result<Value>;
}

/// Outcome of [`PluginManager::call`].
pub enum PluginCall {
	/// The plugin was invokable and returned this value.
	Invoked(Value),
	/// The plugin is not invokable; here it is.
	Instance(Arc<dyn Plugin>),
}

impl PluginCall {
	pub fn into_value(self) -> Option<Value> {
		match self {
			Self::Invoked(value) => Some(value),
			Self::Instance(_) => None,
		}
	}

	pub fn into_instance(self) -> Option<Arc<dyn Plugin>> {
		match self {
			Self::Invoked(_) => None,
			Self::Instance(plugin) => Some(plugin),
		}
	}
}

impl fmt::Debug for PluginCall {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Invoked(value) => f.debug_tuple("Invoked").field(value).finish(),
			Self::Instance(plugin) => f.debug_tuple("Instance").field(plugin).finish(),
		}
	}
}
