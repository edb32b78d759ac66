//! # Events dispatched between loadable objects.
//!
//! The [`EventKind`] enum is the closed set of notifications the coordinator
//! understands:
//! - **Load events**: `LoadStart` / `LoadEnd`, triggered by data objects and
//!   forwarded up through views to the application root
//! - **Navigation**: `Route`, triggered by [`History`](crate::History) after every navigation
//! - **UI state**: `LoadStateChanged`, triggered by a [`View`](crate::View) when its
//!   visible loading state flips
//!
//! The [`Event`] struct carries the payload for each kind.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use loadvisor::{Event, EventKind, Loadable};
//!
//! let model = Loadable::new("model");
//! let ev = Event::load_start(Some("Fetching"), true, &model);
//!
//! assert_eq!(ev.kind, EventKind::LoadStart);
//! assert_eq!(ev.message.as_deref(), Some("Fetching"));
//! assert!(ev.background);
//! assert_eq!(ev.source.as_ref().map(|s| s.id()), Some(model.id()));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::loading::Loadable;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A load began on `source`.
    ///
    /// Sets:
    /// - `message`: optional user-facing message
    /// - `background`: whether the load should stay out of global indicators
    /// - `source`: the object whose `LoadEnd` closes this load
    LoadStart,

    /// A load finished on `source`.
    ///
    /// Sets:
    /// - `source`: the object that finished loading
    LoadEnd,

    /// A navigation completed.
    ///
    /// Sets:
    /// - `fragment`: the fragment navigated to
    Route,

    /// A view's visible loading state changed.
    ///
    /// Sets:
    /// - `phase`: [`LoadPhase::Start`] or [`LoadPhase::End`]
    LoadStateChanged,
}

/// Visible loading state transition reported by `LoadStateChanged`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    /// The loading indicator was shown.
    Start {
        /// Whether the episode is a background load.
        background: bool,
    },
    /// The loading indicator was hidden.
    End,
}

/// Event with optional payload.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Message attached to a load start.
    pub message: Option<Arc<str>>,
    /// Background flag of a load start.
    pub background: bool,
    /// Object the load belongs to.
    pub source: Option<Arc<Loadable>>,
    /// Navigation fragment of a route event.
    pub fragment: Option<Arc<str>>,
    /// Visible state transition.
    pub phase: Option<LoadPhase>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            message: None,
            background: false,
            source: None,
            fragment: None,
            phase: None,
        }
    }

    /// Creates a `LoadStart` event for `source`.
    pub fn load_start(message: Option<&str>, background: bool, source: &Arc<Loadable>) -> Self {
        let ev = Event::new(EventKind::LoadStart)
            .with_background(background)
            .with_source(source);
        match message {
            Some(m) => ev.with_message(m),
            None => ev,
        }
    }

    /// Creates a `LoadEnd` event for `source`.
    pub fn load_end(source: &Arc<Loadable>) -> Self {
        Event::new(EventKind::LoadEnd).with_source(source)
    }

    /// Creates a `Route` event.
    pub fn route(fragment: impl Into<Arc<str>>) -> Self {
        Event::new(EventKind::Route).with_fragment(fragment)
    }

    /// Creates a `LoadStateChanged` event.
    pub fn load_state(phase: LoadPhase) -> Self {
        let mut ev = Event::new(EventKind::LoadStateChanged);
        ev.phase = Some(phase);
        ev
    }

    /// Attaches a message.
    #[inline]
    pub fn with_message(mut self, message: impl Into<Arc<str>>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the background flag.
    #[inline]
    pub fn with_background(mut self, background: bool) -> Self {
        self.background = background;
        self
    }

    /// Attaches the source object.
    #[inline]
    pub fn with_source(mut self, source: &Arc<Loadable>) -> Self {
        self.source = Some(Arc::clone(source));
        self
    }

    /// Attaches a navigation fragment.
    #[inline]
    pub fn with_fragment(mut self, fragment: impl Into<Arc<str>>) -> Self {
        self.fragment = Some(fragment.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let a = Event::new(EventKind::Route);
        let b = Event::new(EventKind::Route);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn load_end_carries_source_only() {
        let obj = Loadable::new("collection");
        let ev = Event::load_end(&obj);
        assert_eq!(ev.kind, EventKind::LoadEnd);
        assert!(ev.message.is_none());
        assert!(Arc::ptr_eq(ev.source.as_ref().unwrap(), &obj));
    }

    #[test]
    fn load_state_sets_phase() {
        let ev = Event::load_state(LoadPhase::Start { background: false });
        assert_eq!(ev.phase, Some(LoadPhase::Start { background: false }));
    }
}
