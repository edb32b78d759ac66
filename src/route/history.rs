//! # Navigation history.
//!
//! [`History`] is the navigation capability the route guard depends on: the current
//! fragment and a [`EventKind::Route`] notification fired on every completed navigation.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::events::{Emitter, Event, EventKind, ListenerId};

/// Client-side navigation state.
///
/// ## Example
/// ```rust
/// use loadvisor::History;
///
/// let history = History::new("home");
/// history.on_route(|ev| println!("now at {:?}", ev.fragment));
/// history.navigate("users/7");
/// assert_eq!(&*history.fragment(), "users/7");
/// ```
pub struct History {
    fragment: RwLock<Arc<str>>,
    events: Emitter,
}

impl History {
    /// Creates a history positioned at `fragment`.
    pub fn new(fragment: impl Into<Arc<str>>) -> Arc<Self> {
        Arc::new(Self {
            fragment: RwLock::new(fragment.into()),
            events: Emitter::new(),
        })
    }

    /// The current fragment.
    pub fn fragment(&self) -> Arc<str> {
        Arc::clone(&self.fragment.read())
    }

    /// Moves to `fragment`, then notifies route listeners.
    ///
    /// Listeners are notified even when the fragment did not change.
    pub fn navigate(&self, fragment: impl Into<Arc<str>>) {
        let fragment = fragment.into();
        *self.fragment.write() = Arc::clone(&fragment);
        debug!(fragment = %fragment, "navigated");
        self.events.trigger(&Event::route(fragment));
    }

    /// Registers a listener for route notifications.
    pub fn on_route<F>(&self, f: F) -> ListenerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.events.on(EventKind::Route, f)
    }

    /// Unregisters a route listener.
    pub fn off(&self, id: ListenerId) -> bool {
        self.events.off(id)
    }

    /// Number of registered route listeners.
    pub fn listener_count(&self) -> usize {
        self.events.listener_count(EventKind::Route)
    }
}

impl Default for History {
    fn default() -> Self {
        Self {
            fragment: RwLock::new(Arc::from("")),
            events: Emitter::new(),
        }
    }
}

impl fmt::Debug for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("History")
            .field("fragment", &self.fragment())
            .finish_non_exhaustive()
    }
}
