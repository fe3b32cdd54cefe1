//! Integration tests for trigger ordering and short-circuit behaviour.

use rstest::rstest;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use trellis_events::{Event, EventManager, GenericEvent, SharedEventManager};

#[derive(Debug, Clone, PartialEq)]
enum Outcome {
	Value(&'static str),
	Response(&'static str),
}

fn is_response(outcome: &Outcome) -> bool {
	matches!(outcome, Outcome::Response(_))
}

#[rstest]
fn test_stop_predicate_ends_trigger_on_first_response() {
	// Arrange
	let events: EventManager<GenericEvent, Outcome> = EventManager::new();
	let third_calls = Arc::new(AtomicUsize::new(0));
	let counter = Arc::clone(&third_calls);
	events
		.attach_with_priority("dispatch", 10, |_| Outcome::Value("l1"))
		.unwrap();
	events
		.attach_with_priority("dispatch", 1, |_| Outcome::Response("l2"))
		.unwrap();
	events
		.attach_with_priority("dispatch", 0, move |_| {
			counter.fetch_add(1, Ordering::SeqCst);
			Outcome::Response("l3")
		})
		.unwrap();

	// Act
	let responses = events.trigger_until("dispatch", &mut GenericEvent::default(), is_response);

	// Assert
	assert!(responses.stopped());
	assert_eq!(responses.first(), Some(&Outcome::Value("l1")));
	assert_eq!(responses.last(), Some(&Outcome::Response("l2")));
	assert_eq!(third_calls.load(Ordering::SeqCst), 0);
}

#[rstest]
fn test_trigger_without_match_runs_everything() {
	let events: EventManager<GenericEvent, Outcome> = EventManager::new();
	events.attach("dispatch", |_| Outcome::Value("a")).unwrap();
	events.attach("dispatch", |_| Outcome::Value("b")).unwrap();

	let responses = events.trigger_until("dispatch", &mut GenericEvent::default(), is_response);

	assert!(!responses.stopped());
	assert_eq!(responses.len(), 2);
	assert!(!responses.contains(is_response));
}

#[rstest]
fn test_listeners_share_the_mutable_event() {
	// Arrange
	let events: EventManager<GenericEvent> = EventManager::new();
	events
		.attach_with_priority("save", 2, |e| e.set_param("step", json!(1)))
		.unwrap();
	events
		.attach_with_priority("save", 1, |e| {
			let step = e.param("step").and_then(|v| v.as_i64()).unwrap_or_default();
			e.set_param("step", json!(step + 1));
		})
		.unwrap();
	let mut event = GenericEvent::new("ignored").with_target("post");

	// Act
	events.trigger("save", &mut event);

	// Assert
	assert_eq!(event.name(), "save");
	assert_eq!(event.target(), Some("post"));
	assert_eq!(event.param("step"), Some(&json!(2)));
}

#[rstest]
fn test_shared_listener_can_short_circuit_local_ones() {
	// Arrange
	let shared = Arc::new(SharedEventManager::new());
	shared
		.attach("Controller", "dispatch", 50, |_| Outcome::Response("shared"))
		.unwrap();
	let events: EventManager<GenericEvent, Outcome> =
		EventManager::with_identifiers(["Dispatchable", "Controller"]);
	events.set_shared_manager(shared);
	events.attach("dispatch", |_| Outcome::Value("local")).unwrap();

	// Act
	let responses = events.trigger_until("dispatch", &mut GenericEvent::default(), is_response);

	// Assert
	assert!(responses.stopped());
	assert_eq!(responses.len(), 1);
	assert_eq!(responses.into_last(), Some(Outcome::Response("shared")));
}
