//! # Load event propagation.
//!
//! [`forward_events`] re-triggers every `LoadStart` seen on one object onto another,
//! unchanged (same message, background flag and source). It is how a data object's
//! loads reach the view displaying it, and how a standalone object's loads reach the
//! application root when no view contains it.
//!
//! ```text
//! DataObject ──forward──► View ──(on_load_start, non-background)──► App root
//!      └────────────forward(once)──────────────────────────────────►┘
//! ```

use std::sync::{Arc, Weak};

use crate::events::{EventKind, ListenerId};

use super::loadable::Loadable;

/// Disposer returned by [`forward_events`].
#[derive(Debug)]
pub struct Forwarding {
    source: Weak<Loadable>,
    listener: ListenerId,
}

impl Forwarding {
    /// Stops forwarding. Returns `false` if it had already stopped
    /// (disposed, fired once, or the source is gone).
    pub fn off(&self) -> bool {
        self.source
            .upgrade()
            .is_some_and(|source| source.off(self.listener))
    }
}

/// Re-triggers `LoadStart` events of `source` on `dest`.
///
/// With `once`, only the next start is forwarded. The destination is held weakly:
/// forwarding stops silently once it is dropped.
pub fn forward_events(source: &Arc<Loadable>, dest: &Arc<Loadable>, once: bool) -> Forwarding {
    let dest = Arc::downgrade(dest);
    let forward = move |ev: &crate::events::Event| {
        if let Some(dest) = dest.upgrade() {
            dest.trigger(ev);
        }
    };

    let listener = if once {
        source.once(EventKind::LoadStart, forward)
    } else {
        source.on(EventKind::LoadStart, forward)
    };

    Forwarding {
        source: Arc::downgrade(source),
        listener,
    }
}
