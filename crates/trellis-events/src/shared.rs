//! Listeners registered by identifier rather than on a specific manager.

use crate::error::{EventError, Result};
use crate::manager::{ListenerEntry, ListenerId, WILDCARD};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

type ByEvent<E, V> = HashMap<String, Vec<ListenerEntry<E, V>>>;

/// Listener registry keyed by `(identifier, event)`.
///
/// An [`EventManager`](crate::EventManager) that has been given this registry
/// runs, on every trigger, the shared listeners registered under any of its
/// own identifiers (or under [`WILDCARD`]). The registry is an ordinary value
/// passed to the managers that should see it; there is no process-wide
/// instance.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use trellis_events::{EventManager, GenericEvent, SharedEventManager};
///
/// let shared: Arc<SharedEventManager<GenericEvent, &'static str>> = Arc::new(SharedEventManager::new());
/// shared.attach("Blog", "dispatch", 1, |_| "shared").unwrap();
///
/// let events = EventManager::with_identifiers(["Blog"]);
/// events.set_shared_manager(Arc::clone(&shared));
/// events.attach("dispatch", |_| "local").unwrap();
///
/// let responses = events.trigger("dispatch", &mut GenericEvent::default());
/// assert_eq!(responses.into_vec(), vec!["shared", "local"]);
/// ```
pub struct SharedEventManager<E, V = ()> {
	identifiers: RwLock<HashMap<String, ByEvent<E, V>>>,
}

impl<E, V> SharedEventManager<E, V> {
	pub fn new() -> Self {
		Self {
			identifiers: RwLock::new(HashMap::new()),
		}
	}

	/// Registers a listener for `event` on every manager carrying `identifier`.
	///
	/// # Errors
	///
	/// [`EventError::EmptyIdentifier`] or [`EventError::EmptyEventName`].
	pub fn attach<F>(&self, identifier: &str, event: &str, priority: i32, listener: F) -> Result<ListenerId>
	where
		F: Fn(&mut E) -> V + Send + Sync + 'static,
	{
		if identifier.is_empty() {
			return Err(EventError::EmptyIdentifier);
		}
		if event.is_empty() {
			return Err(EventError::EmptyEventName);
		}
		let id = ListenerId::next();
		self.identifiers
			.write()
			.entry(identifier.to_string())
			.or_default()
			.entry(event.to_string())
			.or_default()
			.push(ListenerEntry {
				id,
				priority,
				listener: Arc::new(listener),
			});
		trace!(identifier, event, priority, %id, "shared listener attached");
		Ok(id)
	}

	/// Removes a shared listener. Returns `false` if it was not registered.
	pub fn detach(&self, id: ListenerId) -> bool {
		let mut identifiers = self.identifiers.write();
		for events in identifiers.values_mut() {
			for entries in events.values_mut() {
				if let Some(index) = entries.iter().position(|e| e.id == id) {
					entries.remove(index);
					return true;
				}
			}
		}
		false
	}

	/// Drops every listener for `identifier`, or only those for `event`.
	pub fn clear_listeners(&self, identifier: &str, event: Option<&str>) {
		let mut identifiers = self.identifiers.write();
		match event {
			None => {
				identifiers.remove(identifier);
			}
			Some(event) => {
				if let Some(events) = identifiers.get_mut(identifier) {
					events.remove(event);
				}
			}
		}
	}

	/// Number of listeners registered for `(identifier, event)`.
	pub fn listener_count(&self, identifier: &str, event: &str) -> usize {
		self.identifiers
			.read()
			.get(identifier)
			.and_then(|events| events.get(event))
			.map_or(0, Vec::len)
	}

	/// Listeners relevant to a manager with `identifiers` triggering `event`.
	///
	/// Both the identifier and the event may be matched by [`WILDCARD`].
	/// The result is unsorted.
	pub(crate) fn listeners_for(&self, identifiers: &[String], event: &str) -> Vec<ListenerEntry<E, V>> {
		let registry = self.identifiers.read();
		let mut found = Vec::new();

		let wildcard = WILDCARD.to_string();
		let mut seen: Vec<&String> = Vec::new();
		for identifier in identifiers.iter().chain(std::iter::once(&wildcard)) {
			if seen.contains(&identifier) {
				continue;
			}
			seen.push(identifier);

			let Some(events) = registry.get(identifier) else {
				continue;
			};
			if let Some(entries) = events.get(event) {
				found.extend(entries.iter().cloned());
			}
			if event != WILDCARD
				&& let Some(entries) = events.get(WILDCARD)
			{
				found.extend(entries.iter().cloned());
			}
		}
		found
	}
}

impl<E, V> Default for SharedEventManager<E, V> {
	fn default() -> Self {
		Self::new()
	}
}

impl<E, V> fmt::Debug for SharedEventManager<E, V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let registry = self.identifiers.read();
		let mut identifiers: Vec<&String> = registry.keys().collect();
		identifiers.sort();
		f.debug_struct("SharedEventManager")
			.field("identifiers", &identifiers)
			.finish()
	}
}
