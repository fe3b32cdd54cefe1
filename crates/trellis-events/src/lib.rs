//! # Trellis Events
//!
//! Synchronous event manager used by the dispatch layer.
//!
//! Listeners are attached to named events with an integer priority and run
//! highest priority first. A trigger can be cut short by a listener calling
//! [`Event::stop_propagation`] or by a stop predicate over listener results:
//!
//! ```
//! use trellis_events::{EventManager, GenericEvent};
//!
//! let events: EventManager<GenericEvent, Option<u32>> = EventManager::new();
//! events.attach_with_priority("lookup", 10, |_| None).unwrap();
//! events.attach_with_priority("lookup", 1, |_| Some(42)).unwrap();
//! events.attach_with_priority("lookup", 0, |_| Some(7)).unwrap();
//!
//! let responses = events.trigger_until("lookup", &mut GenericEvent::default(), |r| r.is_some());
//! assert!(responses.stopped());
//! assert_eq!(responses.last(), Some(&Some(42)));
//! ```

pub mod error;
pub mod event;
pub mod manager;
pub mod response_collection;
pub mod shared;

pub use error::{EventError, Result};
pub use event::{Event, GenericEvent};
pub use manager::{DEFAULT_LISTENER_PRIORITY, EventManager, ListenerFn, ListenerId, WILDCARD};
pub use response_collection::ResponseCollection;
pub use shared::SharedEventManager;
