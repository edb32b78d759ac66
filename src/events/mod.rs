//! Events: payload types and synchronous dispatch.
//!
//! This module groups the event **data model** and the per-object **emitter**
//! used by loadable objects, views and the navigation history.
//!
//! ## Contents
//! - [`EventKind`], [`Event`], [`LoadPhase`] event classification and payload
//! - [`Emitter`] synchronous `on` / `once` / `off` / `trigger` registry
//!
//! ## Quick reference
//! - **Publishers**: `Loadable::load_start` / `load_end`, `LoadHandler` (episode end),
//!   `History::navigate`, `View` (load state changes), `forward_events`.
//! - **Consumers**: `LoadHandler` (listens for `LoadStart`, then `LoadEnd` per source),
//!   `RouteTrigger` (listens for `Route`), application code.

mod emitter;
mod event;

pub use emitter::{Emitter, ListenerFn, ListenerId};
pub use event::{Event, EventKind, LoadPhase};
