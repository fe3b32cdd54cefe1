//! Application configuration.
//!
//! An [`ApplicationConfig`] describes the router, controller aliases and
//! logging of an application. Controllers themselves are code and are
//! registered on a [`ControllerManager`] before the configuration is
//! applied.
//!
//! ```toml
//! [router]
//! base_url = "/app"
//!
//! [router.routes.home]
//! type = "literal"
//! route = "/"
//! defaults = { controller = "index", action = "index" }
//!
//! [controllers]
//! module_routes = true
//! aliases = { index = "site::Index" }
//!
//! [logging]
//! level = "debug"
//! format = "compact"
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;
use trellis_dispatch::{Application, ControllerManager};
use trellis_urls::RouterConfig;

/// Controller registry settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControllersConfig {
	/// Alias name to registered controller name.
	#[serde(default)]
	pub aliases: HashMap<String, String>,
	/// Qualify matched controllers with the route's `__NAMESPACE__`.
	#[serde(default)]
	pub module_routes: bool,
}

/// Output format of the fmt subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
	#[default]
	Full,
	Compact,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
	/// `EnvFilter` directives such as `info` or `trellis_urls=trace`. When
	/// empty, `RUST_LOG` is used.
	pub level: String,
	pub format: LogFormat,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			format: LogFormat::default(),
		}
	}
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
	pub router: RouterConfig,
	pub controllers: ControllersConfig,
	pub logging: LoggingConfig,
}

impl ApplicationConfig {
	pub fn from_toml_str(contents: &str) -> Result<Self> {
		toml::from_str(contents).map_err(|e| Error::Parse(format!("TOML parse error: {}", e)))
	}

	/// Loads the configuration from a `.toml` or `.json` file.
	pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
		let path = path.into();
		let contents = std::fs::read_to_string(&path)
			.map_err(|e| Error::File(format!("Failed to read {}: {}", path.display(), e)))?;

		match path.extension().and_then(|s| s.to_str()) {
			Some("toml") => Self::from_toml_str(&contents),
			Some("json") => serde_json::from_str(&contents)
				.map_err(|e| Error::Parse(format!("JSON parse error: {}", e))),
			_ => Err(Error::UnsupportedFormat(
				"Supported formats: .toml, .json".to_string(),
			)),
		}
	}

	/// Builds an [`Application`] from this configuration and the registered
	/// controllers.
	///
	/// # Errors
	///
	/// Routes that do not compile, and aliases that name no registered
	/// controller.
	pub fn build_application(&self, mut controllers: ControllerManager) -> Result<Application> {
		let router = self.router.build()?;

		for (alias, target) in &self.controllers.aliases {
			if !controllers.has(target) {
				return Err(Error::Validation(format!(
					"controller alias \"{alias}\" points to unregistered controller \"{target}\""
				)));
			}
			controllers.set_alias(alias.clone(), target.clone());
		}

		debug!(
			routes = router.len(),
			controllers = controllers.names().len(),
			"building application"
		);
		let app = Application::new(router, controllers);
		Ok(if self.controllers.module_routes {
			app.with_module_route_listener()
		} else {
			app
		})
	}
}
