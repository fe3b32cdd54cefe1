//! # Trellis Dispatch
//!
//! Controllers and the request cycle around them.
//!
//! ## Overview
//!
//! - [`Application`] runs a request through the `route`, `dispatch` and
//!   `finish` events, answering unmatched routes and unknown controllers
//!   with a 404.
//! - [`ControllerManager`] resolves controller names from an explicit
//!   allow-list of factories, injects collaborators and rejects instances
//!   that cannot be dispatched.
//! - [`AbstractController`] dispatches a [`Controller`] through its own event
//!   manager so listeners can intercept the request before the controller
//!   sees it.
//! - [`ActionController`] maps the route match's `action` parameter to
//!   handler functions using [`method_from_action`].
//! - [`plugins`] provides the plugin registry and the built-in `params`,
//!   `url` and `redirect` plugins.
//!
//! ## Example
//!
//! ```
//! use serde_json::json;
//! use trellis_dispatch::{ActionController, ActionResult, Application, ControllerManager};
//! use trellis_http::{Request, Response};
//! use trellis_urls::{Literal, Params, RouteStack};
//!
//! let mut defaults = Params::new();
//! defaults.insert("controller".to_string(), json!("index"));
//! defaults.insert("action".to_string(), json!("index"));
//!
//! let mut router = RouteStack::new();
//! router.add_route("home", Literal::new("/").with_defaults(defaults));
//!
//! let mut controllers = ControllerManager::new();
//! controllers.register_controller(
//!     "index",
//!     ActionController::new(()).action("index", |_, _| {
//!         Ok(ActionResult::Response(Response::ok().with_body("welcome")))
//!     }),
//! );
//!
//! let app = Application::new(router, controllers);
//! let response = app.run(Request::get("/").unwrap()).unwrap();
//! assert_eq!(response.body, "welcome");
//! ```

pub mod action_controller;
pub mod application;
pub mod controller;
pub mod controller_manager;
pub mod error;
pub mod listeners;
pub mod mvc_event;
pub mod plugins;
pub mod service;

pub use action_controller::{ActionContext, ActionController, ActionHandler, NOT_FOUND_ACTION};
pub use application::{APPLICATION_IDENTIFIER, Application};
pub use controller::{
	ACTION_SUFFIX, AbstractController, Controller, ControllerContext, Dispatchable, EventManagerAware,
	InjectApplicationEvent, MvcEventManager, SharedMvcEvents, method_from_action,
};
pub use controller_manager::{ControllerFactory, ControllerInitializer, ControllerInstance, ControllerManager};
pub use error::{DispatchError, Result};
pub use listeners::{DispatchListener, MODULE_NAMESPACE, ORIGINAL_CONTROLLER};
pub use mvc_event::{
	ActionResult, DispatchOutcome, ERROR_CONTROLLER_NOT_FOUND, ERROR_EXCEPTION, ERROR_ROUTER_NO_MATCH,
	EVENT_BOOTSTRAP, EVENT_DISPATCH, EVENT_DISPATCH_ERROR, EVENT_FINISH, EVENT_ROUTE, MvcEvent,
	short_circuits,
};
pub use plugins::{Invokable, Plugin, PluginCall, PluginManager, PluginManagerAware};
pub use service::{Service, ServiceFactory, ServiceLocator, ServiceLocatorAware, ServiceManager};
