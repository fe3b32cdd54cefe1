use super::{Invokable, Plugin};
use crate::error::{DispatchError, Result};
use crate::listeners::{MODULE_NAMESPACE, ORIGINAL_CONTROLLER};
use crate::mvc_event::MvcEvent;
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;
use trellis_urls::Params as RouteParams;

/// Builds URLs through the router bound to the event.
///
/// Invoked by name as `url(route, params, reuse_matched_params)`; every
/// argument is optional.
#[derive(Debug, Default, Clone, Copy)]
pub struct Url;

impl Url {
	/// Assembles `route` (or the matched route when `None`).
	///
	/// With `reuse_matched_params`, the current route match's parameters are
	/// used as defaults for `params`. A controller name rewritten by the
	/// module route listener is restored first.
	///
	/// # Errors
	///
	/// [`DispatchError::Runtime`] when no router is bound, or when `route`
	/// is `None` and there is no named route match; routing errors from the
	/// assembly itself.
	pub fn from_route(
		&self,
		event: &MvcEvent,
		route: Option<&str>,
		params: &RouteParams,
		reuse_matched_params: bool,
	) -> Result<String> {
		let router = event
			.router()
			.ok_or_else(|| DispatchError::Runtime("no router is bound to the event".to_string()))?;

		let name = match route {
			Some(name) => name.to_string(),
			None => event
				.route_match()
				.ok_or_else(|| DispatchError::Runtime("no route match is present".to_string()))?
				.matched_route_name()
				.ok_or_else(|| {
					DispatchError::Runtime("route match does not carry a route name".to_string())
				})?
				.to_string(),
		};

		let mut merged = RouteParams::new();
		if reuse_matched_params && let Some(route_match) = event.route_match() {
			merged.extend(route_match.params().iter().map(|(k, v)| (k.clone(), v.clone())));
			if let Some(original) = merged.remove(ORIGINAL_CONTROLLER) {
				merged.insert("controller".to_string(), original);
			}
			merged.remove(MODULE_NAMESPACE);
		}
		merged.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));

		Ok(router.assemble(&name, &merged)?)
	}
}

impl Invokable for Url {
	fn invoke(&self, event: &mut MvcEvent, args: &[Value]) -> Result<Value> {
		let route = match args.first() {
			None | Some(Value::Null) => None,
			Some(Value::String(name)) => Some(name.as_str()),
			Some(other) => {
				return Err(DispatchError::Runtime(format!(
					"url plugin expects a route name, got {other}"
				)));
			}
		};
		let params: RouteParams = match args.get(1) {
			Some(Value::Object(map)) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
			_ => RouteParams::new(),
		};
		let reuse = args.get(2).and_then(Value::as_bool).unwrap_or(false);

		self.from_route(event, route, &params, reuse)
			.map(Value::String)
	}
}

impl Plugin for Url {
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

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::{fixture, rstest};
	use serde_json::json;
	use trellis_http::{Request, Response};
	use trellis_urls::{RouteStack, Segment};

	#[fixture]
	fn event() -> MvcEvent {
		let mut router = RouteStack::new();
		router.add_route("post", Segment::new("/posts/:id[/:format]").unwrap());
		let router = Arc::new(router);
		let route_match = router.match_path("/posts/7/json").unwrap();

		let mut event = MvcEvent::new(Request::default(), Response::ok());
		event.set_router(router);
		event.set_route_match(Some(route_match));
		event
	}

	#[rstest]
	fn test_from_named_route(event: MvcEvent) {
		let mut params = RouteParams::new();
		params.insert("id".into(), json!(3));

		let url = Url.from_route(&event, Some("post"), &params, false).unwrap();

		assert_eq!(url, "/posts/3");
	}

	#[rstest]
	fn test_reuses_matched_route_and_params(event: MvcEvent) {
		// Arrange
		let mut params = RouteParams::new();
		params.insert("id".into(), json!(9));

		// Act
		let url = Url.from_route(&event, None, &params, true).unwrap();

		// Assert
		assert_eq!(url, "/posts/9/json");
	}

	#[rstest]
	fn test_requires_router() {
		let event = MvcEvent::default();

		let err = Url
			.from_route(&event, Some("post"), &RouteParams::new(), false)
			.unwrap_err();

		assert!(matches!(err, DispatchError::Runtime(_)));
	}

	#[rstest]
	fn test_invoke(mut event: MvcEvent) {
		let value = Url
			.invoke(&mut event, &[json!("post"), json!({"id": 1, "format": "xml"})])
			.unwrap();

		assert_eq!(value, json!("/posts/1/xml"));
	}
}
