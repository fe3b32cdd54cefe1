//! # Trellis
//!
//! Routing and controller dispatch for Rust web applications.
//!
//! Trellis maps request paths to named routes, resolves the controller the
//! route names from an explicit registry, and dispatches it through a
//! prioritized event manager that lets listeners answer a request before
//! the controller does.
//!
//! ## Crates
//!
//! - [`urls`]: route matching and URL assembly
//! - [`events`]: prioritized events with short-circuiting triggers
//! - [`dispatch`]: controllers, plugins, the controller registry and the
//!   front controller
//! - [`http`]: the request and response types
//!
//! ## Quick Example
//!
//! ```
//! use trellis::prelude::*;
//!
//! let config = ApplicationConfig::from_toml_str(r#"
//! [router.routes.home]
//! type = "literal"
//! route = "/"
//! defaults = { controller = "home", action = "index" }
//! "#).unwrap();
//!
//! let mut controllers = ControllerManager::new();
//! controllers.register_controller(
//!     "home",
//!     ActionController::new(()).action("index", |_, _| {
//!         Ok(ActionResult::Response(Response::ok().with_body("hello")))
//!     }),
//! );
//!
//! let app = config.build_application(controllers).unwrap();
//! let response = app.run(Request::get("/").unwrap()).unwrap();
//! assert_eq!(response.body, "hello");
//! ```

pub mod config;
pub mod error;
pub mod logging;

pub use trellis_dispatch as dispatch;
pub use trellis_events as events;
pub use trellis_http as http;
pub use trellis_urls as urls;

pub use config::{ApplicationConfig, ControllersConfig, LogFormat, LoggingConfig};
pub use error::{Error, Result};

/// Commonly used types.
pub mod prelude {
	pub use crate::config::{ApplicationConfig, LoggingConfig};
	pub use crate::error::Error;
	pub use trellis_dispatch::{
		AbstractController, ActionContext, ActionController, ActionResult, Application, Controller,
		ControllerContext, ControllerManager, DispatchError, DispatchOutcome, Dispatchable, MvcEvent,
		PluginManager, ServiceLocator, ServiceManager,
	};
	pub use trellis_events::{Event, EventManager, SharedEventManager};
	pub use trellis_http::{Request, Response, StatusCode};
	pub use trellis_urls::{Literal, Params, Part, Regex, RouteMatch, RouteStack, RouterConfig, Segment, Wildcard};
}
