use super::{Plugin, Url};
use crate::error::Result;
use crate::mvc_event::MvcEvent;
use std::any::Any;
use std::sync::Arc;
use trellis_http::{Response, StatusCode};
use trellis_urls::Params as RouteParams;
use tracing::debug;

/// Turns the event's response into a `302 Found` redirect.
///
/// Each method updates the event's response and also returns it, so an
/// action can hand it straight back to short-circuit dispatch.
#[derive(Debug, Default, Clone, Copy)]
pub struct Redirect;

impl Redirect {
	/// Redirects to an assembled route.
	///
	/// # Errors
	///
	/// Fails like [`Url::from_route`], notably when no router is bound.
	pub fn to_route(
		&self,
		event: &mut MvcEvent,
		route: Option<&str>,
		params: &RouteParams,
		reuse_matched_params: bool,
	) -> Result<Response> {
		let url = Url.from_route(event, route, params, reuse_matched_params)?;
		Ok(self.to_url(event, &url))
	}

	pub fn to_url(&self, event: &mut MvcEvent, url: &str) -> Response {
		debug!(location = url, "redirecting");
		let response = event
			.take_response()
			.with_status(StatusCode::FOUND)
			.with_location(url);
		event.set_response(response.clone());
		response
	}

	/// Redirects to the current route with the current parameters.
	pub fn refresh(&self, event: &mut MvcEvent) -> Result<Response> {
		self.to_route(event, None, &RouteParams::new(), true)
	}
}

impl Plugin for Redirect {
	fn as_any(&self) -> &dyn Any {
		self
	}

	fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
		self
	}
}
