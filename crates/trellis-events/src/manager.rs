//! Prioritized listener registry and trigger loop.

use crate::error::{EventError, Result};
use crate::event::Event;
use crate::response_collection::ResponseCollection;
use crate::shared::SharedEventManager;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

/// Event name (and shared identifier) that matches every event.
pub const WILDCARD: &str = "*";

/// Priority given to listeners attached without an explicit one.
pub const DEFAULT_LISTENER_PRIORITY: i32 = 1;

/// A listener callback. Listeners may mutate the event and return a value
/// that is collected into the trigger's [`ResponseCollection`].
pub type ListenerFn<E, V> = Arc<dyn Fn(&mut E) -> V + Send + Sync>;

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Handle returned by `attach`, used to detach the listener later.
///
/// Ids increase with every attachment across all managers, so they also
/// encode registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
	pub(crate) fn next() -> Self {
		Self(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed))
	}
}

impl fmt::Display for ListenerId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "listener#{}", self.0)
	}
}

pub(crate) struct ListenerEntry<E, V> {
	pub(crate) id: ListenerId,
	pub(crate) priority: i32,
	pub(crate) listener: ListenerFn<E, V>,
}

impl<E, V> Clone for ListenerEntry<E, V> {
	fn clone(&self) -> Self {
		Self {
			id: self.id,
			priority: self.priority,
			listener: Arc::clone(&self.listener),
		}
	}
}

/// Sorts entries into trigger order: higher priority first, then
/// registration order.
pub(crate) fn sort_for_trigger<E, V>(entries: &mut [ListenerEntry<E, V>]) {
	entries.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.id.cmp(&b.id)));
}

/// Event bus with priority-ordered listeners and short-circuiting triggers.
///
/// Listeners attached to [`WILDCARD`] run for every event. When a
/// [`SharedEventManager`] is set, its listeners registered under any of this
/// manager's identifiers are merged in by priority.
///
/// Listener lists are copied out before a trigger runs, so listeners may
/// attach or detach other listeners without deadlocking; the change applies
/// from the next trigger.
pub struct EventManager<E, V = ()> {
	identifiers: RwLock<Vec<String>>,
	events: RwLock<IndexMap<String, Vec<ListenerEntry<E, V>>>>,
	shared: RwLock<Option<Arc<SharedEventManager<E, V>>>>,
}

impl<E: Event, V> EventManager<E, V> {
	pub fn new() -> Self {
		Self {
			identifiers: RwLock::new(Vec::new()),
			events: RwLock::new(IndexMap::new()),
			shared: RwLock::new(None),
		}
	}

	/// Creates a manager answering to `identifiers` for shared listeners.
	pub fn with_identifiers<I, S>(identifiers: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let manager = Self::new();
		manager.set_identifiers(identifiers);
		manager
	}

	pub fn identifiers(&self) -> Vec<String> {
		self.identifiers.read().clone()
	}

	/// Replaces the identifier list.
	pub fn set_identifiers<I, S>(&self, identifiers: I)
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut list: Vec<String> = Vec::new();
		for identifier in identifiers {
			let identifier = identifier.into();
			if !list.contains(&identifier) {
				list.push(identifier);
			}
		}
		*self.identifiers.write() = list;
	}

	/// Appends identifiers that are not present yet.
	pub fn add_identifiers<I, S>(&self, identifiers: I)
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut list = self.identifiers.write();
		for identifier in identifiers {
			let identifier = identifier.into();
			if !list.contains(&identifier) {
				list.push(identifier);
			}
		}
	}

	pub fn set_shared_manager(&self, shared: Arc<SharedEventManager<E, V>>) {
		*self.shared.write() = Some(shared);
	}

	pub fn shared_manager(&self) -> Option<Arc<SharedEventManager<E, V>>> {
		self.shared.read().clone()
	}

	pub fn unset_shared_manager(&self) {
		*self.shared.write() = None;
	}

	/// Attaches a listener at [`DEFAULT_LISTENER_PRIORITY`].
	pub fn attach<F>(&self, event: &str, listener: F) -> Result<ListenerId>
	where
		F: Fn(&mut E) -> V + Send + Sync + 'static,
	{
		self.attach_with_priority(event, DEFAULT_LISTENER_PRIORITY, listener)
	}

	/// Attaches a listener. Higher priorities run first; equal priorities run
	/// in the order they were attached.
	///
	/// # Examples
	///
	/// ```
	/// use trellis_events::{EventManager, GenericEvent};
	///
	/// let events: EventManager<GenericEvent, &'static str> = EventManager::new();
	/// events.attach_with_priority("save", -10, |_| "audit").unwrap();
	/// events.attach_with_priority("save", 100, |_| "validate").unwrap();
	///
	/// let responses = events.trigger("save", &mut GenericEvent::default());
	/// assert_eq!(responses.into_vec(), vec!["validate", "audit"]);
	/// ```
	///
	/// # Errors
	///
	/// [`EventError::EmptyEventName`] when `event` is empty.
	pub fn attach_with_priority<F>(&self, event: &str, priority: i32, listener: F) -> Result<ListenerId>
	where
		F: Fn(&mut E) -> V + Send + Sync + 'static,
	{
		if event.is_empty() {
			return Err(EventError::EmptyEventName);
		}
		let id = ListenerId::next();
		self.events
			.write()
			.entry(event.to_string())
			.or_default()
			.push(ListenerEntry {
				id,
				priority,
				listener: Arc::new(listener),
			});
		trace!(event, priority, %id, "listener attached");
		Ok(id)
	}

	/// Removes a listener. Returns `false` if it was not attached here.
	pub fn detach(&self, id: ListenerId) -> bool {
		let mut events = self.events.write();
		let mut emptied = None;
		let mut found = false;
		for (name, entries) in events.iter_mut() {
			if let Some(index) = entries.iter().position(|e| e.id == id) {
				entries.remove(index);
				found = true;
				if entries.is_empty() {
					emptied = Some(name.clone());
				}
				break;
			}
		}
		if let Some(name) = emptied {
			events.shift_remove(&name);
		}
		found
	}

	/// Ids of the listeners attached directly to `event`, in trigger order.
	pub fn listeners(&self, event: &str) -> Vec<ListenerId> {
		let mut entries = self
			.events
			.read()
			.get(event)
			.cloned()
			.unwrap_or_default();
		sort_for_trigger(&mut entries);
		entries.into_iter().map(|e| e.id).collect()
	}

	pub fn has_listeners(&self, event: &str) -> bool {
		self.events.read().contains_key(event)
	}

	/// Event names with at least one listener, in first-attach order.
	pub fn events(&self) -> Vec<String> {
		self.events.read().keys().cloned().collect()
	}

	pub fn clear_listeners(&self, event: &str) {
		if self.events.write().shift_remove(event).is_some() {
			debug!(event, "listeners cleared");
		}
	}

	/// Runs every listener for `name`.
	pub fn trigger(&self, name: &str, event: &mut E) -> ResponseCollection<V> {
		self.trigger_until(name, event, |_| false)
	}

	/// Runs listeners for `name` until one stops propagation or `stop`
	/// accepts a listener's result.
	///
	/// The event's name is set to `name` and its propagation flag is reset
	/// before the first listener runs.
	pub fn trigger_until<P>(&self, name: &str, event: &mut E, stop: P) -> ResponseCollection<V>
	where
		P: Fn(&V) -> bool,
	{
		event.set_name(name);
		event.stop_propagation(false);

		let listeners = self.collect_listeners(name);
		let mut responses = ResponseCollection::new();
		for entry in listeners {
			let value = (entry.listener)(event);
			let accepted = stop(&value);
			responses.push(value);

			if event.propagation_is_stopped() {
				trace!(event = name, listener = %entry.id, "propagation stopped by listener");
				responses.set_stopped(true);
				break;
			}
			if accepted {
				trace!(event = name, listener = %entry.id, "trigger short-circuited");
				responses.set_stopped(true);
				break;
			}
		}
		responses
	}

	fn collect_listeners(&self, name: &str) -> Vec<ListenerEntry<E, V>> {
		let mut listeners = Vec::new();
		{
			let events = self.events.read();
			if let Some(entries) = events.get(name) {
				listeners.extend(entries.iter().cloned());
			}
			if name != WILDCARD
				&& let Some(entries) = events.get(WILDCARD)
			{
				listeners.extend(entries.iter().cloned());
			}
		}
		if let Some(shared) = self.shared.read().as_ref() {
			listeners.extend(shared.listeners_for(&self.identifiers.read(), name));
		}
		sort_for_trigger(&mut listeners);
		listeners
	}
}

impl<E: Event, V> Default for EventManager<E, V> {
	fn default() -> Self {
		Self::new()
	}
}

impl<E, V> fmt::Debug for EventManager<E, V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let events = self.events.read();
		let counts: Vec<(&String, usize)> = events.iter().map(|(k, v)| (k, v.len())).collect();
		f.debug_struct("EventManager")
			.field("identifiers", &*self.identifiers.read())
			.field("listeners", &counts)
			.field("shared", &self.shared.read().is_some())
			.finish()
	}
}
