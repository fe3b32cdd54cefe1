use super::{Invokable, Plugin};
use crate::error::{DispatchError, Result};
use crate::mvc_event::MvcEvent;
use serde_json::{Map, Value};
use std::any::Any;
use std::sync::Arc;

/// Reads request data: route parameters, query parameters and headers.
///
/// Invoked by name, `params(name, default)` reads a route parameter and
/// `params()` returns every route parameter as an object.
#[derive(Debug, Default, Clone, Copy)]
pub struct Params;

impl Params {
	/// A route parameter, or `default` when absent.
	pub fn from_route(&self, event: &MvcEvent, name: &str, default: Value) -> Value {
		event
			.route_match()
			.and_then(|m| m.param(name))
			.cloned()
			.unwrap_or(default)
	}

	/// Every route parameter; an empty object without a route match.
	pub fn all_from_route(&self, event: &MvcEvent) -> Value {
		let params: Map<String, Value> = event
			.route_match()
			.map(|m| {
				m.params()
					.iter()
					.map(|(k, v)| (k.clone(), v.clone()))
					.collect()
			})
			.unwrap_or_default();
		Value::Object(params)
	}

	/// A query-string parameter, or `default` when absent.
	pub fn from_query(&self, event: &MvcEvent, name: &str, default: Value) -> Value {
		event
			.request()
			.query_param(name)
			.map(Value::String)
			.unwrap_or(default)
	}

	pub fn all_from_query(&self, event: &MvcEvent) -> Value {
		Value::Object(
			event
				.request()
				.query_params()
				.into_iter()
				.map(|(k, v)| (k, Value::String(v)))
				.collect(),
		)
	}

	pub fn from_header(&self, event: &MvcEvent, name: &str) -> Option<String> {
		event.request().header(name).map(str::to_string)
	}
}

impl Invokable for Params {
	fn invoke(&self, event: &mut MvcEvent, args: &[Value]) -> Result<Value> {
		match args.first() {
			None | Some(Value::Null) => Ok(self.all_from_route(event)),
			Some(Value::String(name)) => {
				let default = args.get(1).cloned().unwrap_or(Value::Null);
				Ok(self.from_route(event, name, default))
			}
			Some(other) => Err(DispatchError::Runtime(format!(
				"params plugin expects a parameter name, got {other}"
			))),
		}
	}
}

impl Plugin for Params {
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
