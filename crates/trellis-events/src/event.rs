//! Event payloads passed to listeners.

use serde_json::{Map, Value};

/// An event carried through an [`EventManager`](crate::EventManager) trigger.
///
/// The manager sets the name before listeners run and reads the propagation
/// flag after each one.
pub trait Event {
	fn name(&self) -> &str;

	fn set_name(&mut self, name: &str);

	/// Requests (or cancels) that no further listeners run.
	fn stop_propagation(&mut self, flag: bool);

	fn propagation_is_stopped(&self) -> bool;
}

/// Event with a free-form target and JSON parameters.
///
/// # Examples
///
/// ```
/// use trellis_events::{Event, GenericEvent};
/// use serde_json::json;
///
/// let mut event = GenericEvent::new("user.created").with_param("id", json!(7));
/// assert_eq!(event.param("id"), Some(&json!(7)));
///
/// event.stop_propagation(true);
/// assert!(event.propagation_is_stopped());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenericEvent {
	name: String,
	target: Option<String>,
	params: Map<String, Value>,
	stopped: bool,
}

impl GenericEvent {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			..Self::default()
		}
	}

	pub fn with_target(mut self, target: impl Into<String>) -> Self {
		self.target = Some(target.into());
		self
	}

	pub fn with_param(mut self, name: impl Into<String>, value: Value) -> Self {
		self.params.insert(name.into(), value);
		self
	}

	pub fn target(&self) -> Option<&str> {
		self.target.as_deref()
	}

	pub fn params(&self) -> &Map<String, Value> {
		&self.params
	}

	pub fn param(&self, name: &str) -> Option<&Value> {
		self.params.get(name)
	}

	pub fn set_param(&mut self, name: impl Into<String>, value: Value) {
		self.params.insert(name.into(), value);
	}
}

impl Event for GenericEvent {
	fn name(&self) -> &str {
		&self.name
	}

	fn set_name(&mut self, name: &str) {
		self.name = name.to_string();
	}

	fn stop_propagation(&mut self, flag: bool) {
		self.stopped = flag;
	}

	fn propagation_is_stopped(&self) -> bool {
		self.stopped
	}
}
