//! # Trellis URLs
//!
//! Route matching and URL assembly.
//!
//! A [`RouteStack`] holds named routes ordered by priority. Matching a path
//! yields a [`RouteMatch`] with the parameters the route extracted and the
//! name of the route (nested names joined with `/`). The same stack turns a
//! route name and parameters back into a path.
//!
//! ## Route types
//!
//! - [`Literal`]: exact prefix.
//! - [`Segment`]: `/posts/:id[/:page]` templates with constraints and defaults.
//! - [`Wildcard`]: trailing key/value pairs.
//! - [`Regex`]: named-capture regular expressions with a printf-like spec for assembly.
//! - [`Part`]: a route with child routes.
//!
//! ## Example
//!
//! ```
//! use trellis_urls::{Literal, Params, RouteStack, Segment};
//! use serde_json::json;
//!
//! let mut defaults = Params::new();
//! defaults.insert("param".to_string(), json!(1));
//!
//! let mut router = RouteStack::new();
//! router.add_route("home", Literal::new("/"));
//! router.add_route(
//!     "sub",
//!     Segment::with_options("/foo/:param", Default::default(), defaults).unwrap(),
//! );
//!
//! let m = router.match_path("/foo/bar").unwrap();
//! assert_eq!(m.matched_route_name(), Some("sub"));
//! assert_eq!(m.param("param"), Some(&json!("bar")));
//!
//! assert_eq!(router.assemble("sub", &Params::new()).unwrap(), "/foo/1");
//! ```

pub mod config;
pub mod error;
pub mod route_match;
pub mod routes;
pub mod stack;

use std::collections::HashMap;

pub use config::{RouteDefinition, RouteSpec, RouterConfig};
pub use error::{Result, RoutingError};
pub use route_match::{ROUTE_NAME_SEPARATOR, RouteMatch};
pub use routes::{AssembleOptions, Literal, Part, Regex, Route, Segment, Wildcard, value_to_string};
pub use stack::{DEFAULT_PRIORITY, RouteStack};

/// Route parameters keyed by name.
pub type Params = HashMap<String, serde_json::Value>;
