//! # Loadable objects.
//!
//! [`Loadable`] is the minimal capability the coordinator depends on: an
//! identity, an [`Emitter`], and the two helpers that announce a load on it.
//! Data objects, views, load episodes and the application root all embed one.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use loadvisor::{EventKind, Loadable};
//!
//! let model = Loadable::new("model");
//! let seen = Arc::new(AtomicBool::new(false));
//! let flag = Arc::clone(&seen);
//! model.on(EventKind::LoadEnd, move |_| flag.store(true, Ordering::SeqCst));
//!
//! model.load_start(None, false);
//! model.load_end();
//! assert!(seen.load(Ordering::SeqCst));
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use crate::events::{Emitter, Event, EventKind, ListenerId};

static OBJECT_SEQ: AtomicU64 = AtomicU64::new(1);

/// An object that can take part in load episodes.
pub struct Loadable {
    id: u64,
    label: Arc<str>,
    events: Emitter,
}

impl Loadable {
    /// Creates a new loadable object with a unique id.
    pub fn new(label: impl Into<Arc<str>>) -> Arc<Self> {
        Arc::new(Self {
            id: OBJECT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            label: label.into(),
            events: Emitter::new(),
        })
    }

    /// Process-unique identity.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Human-readable label (for logs).
    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The object's event registry.
    #[inline]
    pub fn events(&self) -> &Emitter {
        &self.events
    }

    /// Registers a listener, see [`Emitter::on`].
    pub fn on<F>(&self, kind: EventKind, f: F) -> ListenerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.events.on(kind, f)
    }

    /// Registers a one-shot listener, see [`Emitter::once`].
    pub fn once<F>(&self, kind: EventKind, f: F) -> ListenerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.events.once(kind, f)
    }

    /// Unregisters a listener, see [`Emitter::off`].
    pub fn off(&self, id: ListenerId) -> bool {
        self.events.off(id)
    }

    /// Dispatches an event on this object.
    pub fn trigger(&self, ev: &Event) {
        self.events.trigger(ev)
    }

    /// Announces that a load started on this object.
    pub fn load_start(self: &Arc<Self>, message: Option<&str>, background: bool) {
        self.trigger(&Event::load_start(message, background, self));
    }

    /// Announces that a load finished on this object.
    pub fn load_end(self: &Arc<Self>) {
        self.trigger(&Event::load_end(self));
    }
}

impl fmt::Debug for Loadable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loadable")
            .field("id", &self.id)
            .field("label", &self.label)
            .finish()
    }
}
