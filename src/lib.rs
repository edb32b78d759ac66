//! # loadvisor
//!
//! **Loadvisor** coordinates "loading" state across asynchronous fetches so that
//! a user interface can show and hide a busy indicator without flicker,
//! double-counting, or premature dismissal when several overlapping fetches target
//! the same object.
//!
//! It combines three mechanisms:
//! - a **debounced start/end aggregator** ([`LoadHandler`]) that turns noisy,
//!   overlapping load notifications into one clean start/end pair per episode;
//! - a **fetch queue** ([`FetchQueue`]) that keeps at most one request in flight per
//!   data object and replays its result to every caller;
//! - a **route guard** ([`bind_to_route`]) that abandons pending success callbacks
//!   when navigation happens first.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  ┌──────────────┐   ┌──────────────┐
//!  │  DataObject  │   │  DataObject  │      fetch() ─► FetchQueue ─► Transport
//!  │ (Loadable +  │   │ (standalone) │                  (one request per epoch)
//!  │  FetchQueue) │   │              │
//!  └──────┬───────┘   └──────┬───────┘
//!         │ LoadStart/End    │ LoadStart (forwarded once)
//!         ▼                  │
//!  ┌──────────────┐          │
//!  │     View     │          │
//!  │ LoadHandler  │          │
//!  │ (debounce)   │          │
//!  └──────┬───────┘          │
//!         │ on_load_start    │
//!         │ (blocking only)  │
//!         ▼                  ▼
//! ┌──────────────────────────────────────┐
//! │  App root (global scope)             │
//! │  - LoadHandler + LoadObserver        │
//! │  - History (fragment, Route events)  │──► RouteTrigger (bind_to_route)
//! └──────────────────────────────────────┘
//! ```
//!
//! ### Episode lifecycle
//! ```text
//! t=0        LoadStart(source A)      open signal, arm start timer (start_delay)
//! t<330ms    LoadEnd(A)               pending empty, arm end timer (end_delay)
//!            └─ end timer fires       never started: nothing visible, close
//!
//! t=0        LoadStart(A)
//! t=330ms    start timer fires        on_load_start(msg, bg, episode)
//! t=x        LoadEnd(A)               arm end timer
//! t=x+100ms  end timer fires          on_load_end(bg, episode), episode LoadEnd
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                          |
//! |-------------------|--------------------------------------------------------------|---------------------------------------------|
//! | **Events**        | Typed, synchronous per-object dispatch.                      | [`Emitter`], [`Event`], [`EventKind`]        |
//! | **Loading**       | Debounced episodes, observers, propagation.                  | [`LoadHandler`], [`LoadObserver`], [`Loadable`] |
//! | **Fetch**         | De-duplicated, abortable requests.                           | [`FetchQueue`], [`Transport`], [`TransportFn`] |
//! | **Route**         | Abandon callbacks on navigation.                             | [`History`], [`bind_to_route`], [`Abandoned`] |
//! | **Wiring**        | Application root, views, data objects.                       | [`App`], [`View`], [`DataObject`]            |
//! | **Configuration** | Class-level delays and per-instance overrides.               | [`Config`], [`LoadTimings`]                  |
//! | **Errors**        | Typed fetch errors.                                          | [`FetchError`]                               |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogObserver`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use loadvisor::{App, Config, FetchError, FetchOptions, LoadFn, TransportFn, TransportRef};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let indicator = LoadFn::arc(
//!         |_msg: Option<&str>, _bg: bool, _episode: &Arc<loadvisor::Loadable>| println!("busy"),
//!         |_bg: bool, _episode: &Arc<loadvisor::Loadable>| println!("idle"),
//!     );
//!     let app = App::builder(Config::default())
//!         .with_observer(indicator)
//!         .build();
//!
//!     let users: TransportRef<Vec<String>> = TransportFn::arc("users", |_ctx: CancellationToken| async {
//!         tokio::time::sleep(Duration::from_millis(10)).await;
//!         Ok::<_, FetchError>(vec!["ada".to_string()])
//!     });
//!     let model = app.data_object("users", users);
//!     let view = app.view("user-list");
//!     view.bind_data_object(&model);
//!
//!     model.load(
//!         |rows| println!("render {} rows", rows.len()),
//!         |why| println!("abandoned: {}", why.as_label()),
//!         FetchOptions::new(),
//!     );
//!     tokio::time::sleep(Duration::from_millis(50)).await;
//!     assert!(model.is_populated());
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod fetch;
mod loading;
mod route;

// ---- Public re-exports ----

pub use config::{Config, DEFAULT_END_DELAY, DEFAULT_START_DELAY, LoadTimings};
pub use core::{App, AppBuilder, DataObject, View};
pub use error::FetchError;
pub use events::{Emitter, Event, EventKind, ListenerFn, ListenerId, LoadPhase};
pub use fetch::{FetchOptions, FetchQueue, Issue, RequestHandle, Transport, TransportFn, TransportRef};
pub use loading::{Forwarding, LoadFn, LoadHandler, LoadObserver, Loadable, Timer, TimerId, forward_events};
pub use route::{Abandoned, History, RouteTrigger, bind_to_route};

// Optional: expose a simple built-in logging observer (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use loading::LogObserver;
