//! Controllers that map the route match's `action` parameter to handlers.

use crate::controller::{Controller, ControllerContext, method_from_action};
use crate::error::{DispatchError, Result};
use crate::mvc_event::{ActionResult, DispatchOutcome, MvcEvent};
use crate::plugins::{Plugin, PluginCall, Redirect, Url};
use serde_json::{Value, json};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use trellis_http::{Request, Response, StatusCode};
use trellis_urls::RouteMatch;

/// Action used when the route match names none.
pub const NOT_FOUND_ACTION: &str = "not-found";

/// Handler registered for one action.
pub type ActionHandler<S> = Arc<dyn Fn(&S, &mut ActionContext<'_>) -> DispatchOutcome + Send + Sync>;

/// What an action handler can reach while it runs.
pub struct ActionContext<'a> {
	event: &'a mut MvcEvent,
	context: &'a ControllerContext,
}

impl<'a> ActionContext<'a> {
	pub fn new(event: &'a mut MvcEvent, context: &'a ControllerContext) -> Self {
		Self { event, context }
	}

	pub fn event(&self) -> &MvcEvent {
		&*self.event
	}

	pub fn event_mut(&mut self) -> &mut MvcEvent {
		self.event
	}

	pub fn request(&self) -> &Request {
		self.event.request()
	}

	pub fn response_mut(&mut self) -> &mut Response {
		self.event.response_mut()
	}

	pub fn route_match(&self) -> Option<&RouteMatch> {
		self.event.route_match()
	}

	/// Route parameter as a string.
	pub fn param(&self, name: &str) -> Option<String> {
		self.event.route_match()?.param_str(name)
	}

	pub fn context(&self) -> &ControllerContext {
		self.context
	}

	pub fn plugin(&self, name: &str) -> Result<Arc<dyn Plugin>> {
		self.context.plugin(name)
	}

	/// Calls a plugin by name with positional arguments.
	pub fn call(&mut self, name: &str, args: &[Value]) -> Result<PluginCall> {
		self.context.call(name, self.event, args)
	}

	pub fn service<T: Any + Send + Sync>(&self, id: &str) -> Option<Arc<T>> {
		self.context.service_as::<T>(id)
	}

	/// Redirect response to a named route.
	pub fn redirect_to_route(&mut self, route: &str, params: &trellis_urls::Params) -> Result<Response> {
		let redirect = self.context.plugin_as::<Redirect>("redirect")?;
		redirect.to_route(self.event, Some(route), params, false)
	}

	pub fn redirect_to_url(&mut self, url: &str) -> Result<Response> {
		let redirect = self.context.plugin_as::<Redirect>("redirect")?;
		Ok(redirect.to_url(self.event, url))
	}

	/// URL of a named route, reusing the matched parameters when asked.
	pub fn url(&self, route: Option<&str>, params: &trellis_urls::Params, reuse: bool) -> Result<String> {
		let url = self.context.plugin_as::<Url>("url")?;
		url.from_route(&*self.event, route, params, reuse)
	}
}

impl fmt::Debug for ActionContext<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ActionContext")
			.field("event", &self.event)
			.field("context", &self.context)
			.finish_non_exhaustive()
	}
}

/// A controller built from per-action handlers over shared state `S`.
///
/// Handlers are stored under the method name derived from the action token,
/// so `"list-posts"`, `"list_posts"` and `"list.posts"` all address
/// `listPostsAction`. A request for an unregistered action gets
/// the `not-found` handler when one is registered, otherwise
/// [`ActionController::not_found_action`].
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use trellis_dispatch::{AbstractController, ActionController, ActionResult, Dispatchable, InjectApplicationEvent, MvcEvent};
/// use trellis_http::Request;
/// use trellis_urls::{Params, RouteMatch};
///
/// let controller = ActionController::new(()).action("say-hello", |_, _| {
///     Ok(ActionResult::Value(json!("hello")))
/// });
///
/// let mut params = Params::new();
/// params.insert("action".to_string(), json!("say_hello"));
/// let mut event = MvcEvent::default();
/// event.set_route_match(Some(RouteMatch::new(params, 0)));
///
/// let mut controller = AbstractController::new(controller);
/// controller.set_event(event);
/// let result = controller.dispatch(Request::default(), None).unwrap();
/// assert_eq!(result, ActionResult::Value(json!("hello")));
/// ```
pub struct ActionController<S> {
	state: Arc<S>,
	actions: HashMap<String, ActionHandler<S>>,
}

impl<S: Send + Sync + 'static> ActionController<S> {
	pub fn new(state: S) -> Self {
		Self {
			state: Arc::new(state),
			actions: HashMap::new(),
		}
	}

	/// Registers `handler` for `action`.
	pub fn action<F>(mut self, action: &str, handler: F) -> Self
	where
		F: Fn(&S, &mut ActionContext<'_>) -> DispatchOutcome + Send + Sync + 'static,
	{
		self.actions.insert(method_from_action(action), Arc::new(handler));
		self
	}

	pub fn state(&self) -> &S {
		&self.state
	}

	pub fn has_action(&self, action: &str) -> bool {
		self.actions.contains_key(&method_from_action(action))
	}

	/// Method names of the registered actions, sorted.
	pub fn methods(&self) -> Vec<&str> {
		let mut methods: Vec<&str> = self.actions.keys().map(String::as_str).collect();
		methods.sort_unstable();
		methods
	}

	/// Answers an unknown action: 404 status, `action` rewritten to
	/// `not-found`, and a page-not-found body.
	pub fn not_found_action(event: &mut MvcEvent) -> DispatchOutcome {
		event.response_mut().status = StatusCode::NOT_FOUND;
		if let Some(route_match) = event.route_match_mut() {
			route_match.set_param("action", NOT_FOUND_ACTION);
		}
		Ok(ActionResult::Value(json!({ "content": "Page not found" })))
	}
}

impl<S> Clone for ActionController<S> {
	fn clone(&self) -> Self {
		Self {
			state: Arc::clone(&self.state),
			actions: self.actions.clone(),
		}
	}
}

impl<S: Send + Sync + 'static> Controller for ActionController<S> {
	fn on_dispatch(&self, event: &mut MvcEvent, context: &ControllerContext) -> DispatchOutcome {
		let action = event
			.route_match()
			.ok_or(DispatchError::MissingRouteMatch)?
			.param_str("action")
			.unwrap_or_else(|| NOT_FOUND_ACTION.to_string());
		let method = method_from_action(&action);

		let handler = match self.actions.get(&method) {
			Some(handler) => handler,
			None => {
				debug!(action = %action, method = %method, "action not found");
				match self.actions.get(&method_from_action(NOT_FOUND_ACTION)) {
					Some(handler) => handler,
					None => return Self::not_found_action(event),
				}
			}
		};

		debug!(action = %action, method = %method, "running action");
		let mut action_context = ActionContext::new(event, context);
		handler(&*self.state, &mut action_context)
	}

	fn controller_name(&self) -> &'static str {
		std::any::type_name::<S>()
	}

	fn event_identifier(&self) -> Option<&'static str> {
		Some("ActionController")
	}
}

impl<S> fmt::Debug for ActionController<S> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut methods: Vec<&String> = self.actions.keys().collect();
		methods.sort_unstable();
		f.debug_struct("ActionController")
			.field("state", &std::any::type_name::<S>())
			.field("actions", &methods)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::controller::{AbstractController, Dispatchable, InjectApplicationEvent};
	use rstest::{fixture, rstest};
	use std::sync::atomic::{AtomicUsize, Ordering};
	use trellis_urls::{Literal, Params, RouteStack};

	#[derive(Default)]
	struct Blog {
		views: AtomicUsize,
	}

	#[fixture]
	fn blog() -> ActionController<Blog> {
		ActionController::new(Blog::default())
			.action("index", |blog, _| {
				let views = blog.views.fetch_add(1, Ordering::SeqCst) + 1;
				Ok(ActionResult::Value(json!({ "views": views })))
			})
			.action("show-post", |_, ctx| {
				let id = ctx.param("id").unwrap_or_default();
				Ok(ActionResult::Value(json!({ "id": id })))
			})
			.action("go-home", |_, ctx| {
				let response = ctx.redirect_to_route("home", &Params::new())?;
				Ok(ActionResult::Response(response))
			})
	}

	fn dispatch_with(controller: ActionController<Blog>, params: serde_json::Value) -> (Result<ActionResult>, MvcEvent) {
		let params: Params = serde_json::from_value(params).unwrap();
		let mut router = RouteStack::new();
		router.add_route("home", Literal::new("/"));
		let mut event = MvcEvent::default();
		event.set_route_match(Some(RouteMatch::new(params, 0)));
		event.set_router(Arc::new(router));

		let mut controller = AbstractController::new(controller);
		controller.set_event(event);
		let result = controller.dispatch(Request::default(), None);
		let event = controller.event().cloned().unwrap();
		(result, event)
	}

	#[rstest]
	fn test_dispatches_to_derived_method(blog: ActionController<Blog>) {
		// Act
		let (result, _) = dispatch_with(blog, json!({ "action": "show_post", "id": "42" }));

		// Assert
		assert_eq!(result.unwrap(), ActionResult::Value(json!({ "id": "42" })));
	}

	#[rstest]
	fn test_state_is_shared_between_clones(blog: ActionController<Blog>) {
		let copy = blog.clone();

		dispatch_with(blog, json!({ "action": "index" })).0.unwrap();
		let (result, _) = dispatch_with(copy, json!({ "action": "index" }));

		assert_eq!(result.unwrap(), ActionResult::Value(json!({ "views": 2 })));
	}

	#[rstest]
	#[case(json!({ "action": "delete" }))]
	#[case(json!({}))]
	fn test_unknown_action_is_not_found(blog: ActionController<Blog>, #[case] params: serde_json::Value) {
		// Act
		let (result, event) = dispatch_with(blog, params);

		// Assert
		assert_eq!(
			result.unwrap(),
			ActionResult::Value(json!({ "content": "Page not found" }))
		);
		assert_eq!(event.response().status, StatusCode::NOT_FOUND);
		assert_eq!(
			event.route_match().and_then(|m| m.param_str("action")).as_deref(),
			Some(NOT_FOUND_ACTION)
		);
	}

	#[rstest]
	fn test_registered_not_found_action_wins(blog: ActionController<Blog>) {
		let blog = blog.action("not-found", |_, _| Ok(ActionResult::Value(json!("custom"))));

		let (result, _) = dispatch_with(blog, json!({ "action": "missing" }));

		assert_eq!(result.unwrap(), ActionResult::Value(json!("custom")));
	}

	#[rstest]
	fn test_missing_route_match_fails(blog: ActionController<Blog>) {
		let mut controller = AbstractController::new(blog);

		let err = controller.dispatch(Request::default(), None).unwrap_err();

		assert_eq!(err, DispatchError::MissingRouteMatch);
	}

	#[rstest]
	fn test_redirect_action_short_circuits(blog: ActionController<Blog>) {
		let (result, event) = dispatch_with(blog, json!({ "action": "go-home" }));

		let result = result.unwrap();
		assert_eq!(result.as_response().and_then(Response::location), Some("/"));
		assert_eq!(event.response().status, StatusCode::FOUND);
	}

	#[rstest]
	fn test_methods_and_identifier(blog: ActionController<Blog>) {
		assert_eq!(blog.methods(), vec!["goHomeAction", "indexAction", "showPostAction"]);
		assert!(blog.has_action("show.post"));
		assert_eq!(blog.event_identifier(), Some("ActionController"));
		assert!(blog.controller_name().ends_with("Blog"));
	}
}
