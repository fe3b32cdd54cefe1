//! Declarative route definitions.
//!
//! A router can be described in any serde format. Definitions with
//! `child_routes` become [`Part`] routes wrapping their own route.
//!
//! ```
//! use trellis_urls::RouterConfig;
//!
//! let config: RouterConfig = serde_json::from_value(serde_json::json!({
//!     "routes": {
//!         "home": { "type": "literal", "route": "/", "defaults": { "controller": "index" } },
//!         "blog": {
//!             "type": "literal",
//!             "route": "/blog",
//!             "may_terminate": true,
//!             "child_routes": {
//!                 "post": { "type": "segment", "route": "/:slug" }
//!             }
//!         }
//!     }
//! }))
//! .unwrap();
//!
//! let router = config.build().unwrap();
//! let m = router.match_path("/blog/hello").unwrap();
//! assert_eq!(m.matched_route_name(), Some("blog/post"));
//! ```

use crate::routes::{Literal, Part, Regex, Route, Segment, Wildcard};
use crate::{Params, Result, RouteStack, RoutingError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

fn default_delimiter() -> String {
	"/".to_string()
}

/// A single route, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RouteSpec {
	Literal {
		route: String,
		#[serde(default)]
		defaults: Params,
	},
	Segment {
		route: String,
		#[serde(default)]
		constraints: HashMap<String, String>,
		#[serde(default)]
		defaults: Params,
	},
	Wildcard {
		#[serde(default = "default_delimiter")]
		key_value_delimiter: String,
		#[serde(default = "default_delimiter")]
		param_delimiter: String,
		#[serde(default)]
		defaults: Params,
	},
	Regex {
		regex: String,
		spec: String,
		#[serde(default)]
		defaults: Params,
	},
}

impl RouteSpec {
	/// Compiles the described route.
	///
	/// # Errors
	///
	/// Returns [`RoutingError::InvalidPattern`] when a template or regex does
	/// not compile.
	pub fn build(&self) -> Result<Box<dyn Route>> {
		Ok(match self {
			Self::Literal { route, defaults } => {
				Box::new(Literal::new(route.clone()).with_defaults(defaults.clone()))
			}
			Self::Segment {
				route,
				constraints,
				defaults,
			} => Box::new(Segment::with_options(
				route,
				constraints.clone(),
				defaults.clone(),
			)?),
			Self::Wildcard {
				key_value_delimiter,
				param_delimiter,
				defaults,
			} => Box::new(
				Wildcard::with_delimiters(key_value_delimiter.clone(), param_delimiter.clone())
					.with_defaults(defaults.clone()),
			),
			Self::Regex {
				regex,
				spec,
				defaults,
			} => Box::new(Regex::new(regex, spec.clone())?.with_defaults(defaults.clone())),
		})
	}
}

/// A named route entry: its spec plus stack placement and children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDefinition {
	#[serde(flatten)]
	pub spec: RouteSpec,
	#[serde(default)]
	pub priority: i32,
	#[serde(default)]
	pub may_terminate: bool,
	#[serde(default, skip_serializing_if = "IndexMap::is_empty")]
	pub child_routes: IndexMap<String, RouteDefinition>,
}

impl RouteDefinition {
	pub fn new(spec: RouteSpec) -> Self {
		Self {
			spec,
			priority: 0,
			may_terminate: false,
			child_routes: IndexMap::new(),
		}
	}

	pub fn build(&self) -> Result<Box<dyn Route>> {
		let route = self.spec.build()?;
		if self.child_routes.is_empty() {
			if self.may_terminate {
				return Err(RoutingError::InvalidConfig(
					"may_terminate requires child_routes".to_string(),
				));
			}
			return Ok(route);
		}

		let mut children = RouteStack::new();
		for (name, child) in &self.child_routes {
			children.add_boxed_route(name.clone(), child.build()?, child.priority);
		}
		Ok(Box::new(Part::from_boxed(route, self.may_terminate, children)))
	}
}

/// Top-level router description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouterConfig {
	#[serde(default)]
	pub base_url: String,
	#[serde(default)]
	pub default_params: Params,
	#[serde(default)]
	pub routes: IndexMap<String, RouteDefinition>,
}

impl RouterConfig {
	/// Builds a [`RouteStack`] from the definitions, in declaration order.
	///
	/// # Errors
	///
	/// Fails on the first route that does not compile.
	pub fn build(&self) -> Result<RouteStack> {
		let mut stack = RouteStack::new();
		stack
			.set_base_url(self.base_url.clone())
			.set_default_params(self.default_params.clone());
		for (name, definition) in &self.routes {
			let route = definition.build().map_err(|e| match e {
				RoutingError::InvalidConfig(message) => {
					RoutingError::InvalidConfig(format!("route \"{name}\": {message}"))
				}
				other => other,
			})?;
			stack.add_boxed_route(name.clone(), route, definition.priority);
		}
		debug!(routes = stack.len(), "router built from configuration");
		Ok(stack)
	}
}
