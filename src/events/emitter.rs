//! # Synchronous, per-object event dispatch.
//!
//! [`Emitter`] is the typed replacement for an `on/off/trigger` event mixin.
//! Every [`Loadable`](crate::Loadable) and the [`History`](crate::History) own one.
//!
//! ## Rules
//! - **Synchronous**: `trigger()` runs every matching listener on the caller's stack
//!   before returning.
//! - **Registration order**: listeners of one kind run in the order they were added.
//! - **Snapshot dispatch**: the listener list is copied before dispatch, so listeners may
//!   add or remove listeners (including themselves) while running. A listener removed
//!   during a dispatch still sees that dispatch.
//! - **One-shot**: a `once` listener is unregistered before it is invoked, so a
//!   re-entrant trigger can never run it twice.
//! - **Isolation**: a panicking listener is logged and skipped; the rest still run.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use parking_lot::Mutex;

use super::event::{Event, EventKind};
use crate::error::guarded;

static LISTENER_SEQ: AtomicU64 = AtomicU64::new(1);

/// Shared listener callback.
pub type ListenerFn = Arc<dyn Fn(&Event) + Send + Sync>;

/// Registration handle returned by [`Emitter::on`] / [`Emitter::once`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Listener {
    id: ListenerId,
    kind: EventKind,
    once: bool,
    f: ListenerFn,
}

/// Listener registry for one object.
#[derive(Default)]
pub struct Emitter {
    listeners: Mutex<Vec<Listener>>,
}

impl Emitter {
    /// Creates an emitter with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `f` for every event of `kind`.
    pub fn on<F>(&self, kind: EventKind, f: F) -> ListenerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.register(kind, false, Arc::new(f))
    }

    /// Registers `f` for the next event of `kind` only.
    pub fn once<F>(&self, kind: EventKind, f: F) -> ListenerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.register(kind, true, Arc::new(f))
    }

    fn register(&self, kind: EventKind, once: bool, f: ListenerFn) -> ListenerId {
        let id = ListenerId(LISTENER_SEQ.fetch_add(1, AtomicOrdering::Relaxed));
        self.listeners.lock().push(Listener { id, kind, once, f });
        id
    }

    /// Unregisters a listener. Returns `false` if it was already gone.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|l| l.id != id);
        listeners.len() != before
    }

    /// Dispatches `ev` to every listener registered for `ev.kind`.
    pub fn trigger(&self, ev: &Event) {
        let snapshot: Vec<ListenerFn> = {
            let mut listeners = self.listeners.lock();
            let matching = listeners
                .iter()
                .filter(|l| l.kind == ev.kind)
                .map(|l| Arc::clone(&l.f))
                .collect();
            listeners.retain(|l| !(l.once && l.kind == ev.kind));
            matching
        };

        for f in snapshot {
            guarded("listener", || f(ev));
        }
    }

    /// Number of listeners registered for `kind`.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners
            .lock()
            .iter()
            .filter(|l| l.kind == kind)
            .count()
    }

    /// Drops every listener.
    pub fn clear(&self) {
        self.listeners.lock().clear();
    }
}
