//! # Load observers
//!
//! `LoadObserver` is the extension point a [`LoadHandler`](crate::LoadHandler) drives:
//! `on_load_start` when an episode becomes visible, `on_load_end` when it is hidden.
//! Views implement it to toggle their loading state; the application root
//! implements it to drive a global busy indicator.
//!
//! ## Contract
//! - Called synchronously from a timer task of the handler, never while the handler's
//!   internal lock is held, so observers may start or end other loads.
//! - `on_load_end` runs at most once per episode and only after `on_load_start`.
//! - `on_load_start` may run a second time in the same episode when a background
//!   episode is joined by a blocking load (it then reports `background == false`).
//! - A panic is caught and logged; the episode still completes.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use loadvisor::{Config, LoadFn, LoadHandler, Loadable};
//!
//! let observer = LoadFn::arc(
//!     |message: Option<&str>, background: bool, _episode: &Arc<Loadable>| {
//!         println!("show spinner: {message:?} background={background}");
//!     },
//!     |_background: bool, _episode: &Arc<Loadable>| println!("hide spinner"),
//! );
//! let handler = LoadHandler::new(observer, Config::default());
//! # let _ = handler;
//! ```

use std::sync::Arc;

use super::loadable::Loadable;

/// Receiver of debounced load start/end notifications.
pub trait LoadObserver: Send + Sync + 'static {
    /// An episode became visible.
    ///
    /// # Parameters
    /// - `message`: latest message passed to a start of this episode
    /// - `background`: whether the episode is still a background load
    /// - `episode`: the episode object; it triggers `LoadEnd` when the episode closes
    fn on_load_start(&self, message: Option<&str>, background: bool, episode: &Arc<Loadable>);

    /// A visible episode finished.
    fn on_load_end(&self, background: bool, episode: &Arc<Loadable>);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Closure-backed observer.
pub struct LoadFn<S, E> {
    start: S,
    end: E,
}

impl<S, E> LoadFn<S, E>
where
    S: Fn(Option<&str>, bool, &Arc<Loadable>) + Send + Sync + 'static,
    E: Fn(bool, &Arc<Loadable>) + Send + Sync + 'static,
{
    /// Creates an observer from a start and an end closure.
    pub fn new(start: S, end: E) -> Self {
        Self { start, end }
    }

    /// Creates the observer and returns it as a shared handle.
    pub fn arc(start: S, end: E) -> Arc<Self> {
        Arc::new(Self::new(start, end))
    }
}

impl<S, E> LoadObserver for LoadFn<S, E>
where
    S: Fn(Option<&str>, bool, &Arc<Loadable>) + Send + Sync + 'static,
    E: Fn(bool, &Arc<Loadable>) + Send + Sync + 'static,
{
    fn on_load_start(&self, message: Option<&str>, background: bool, episode: &Arc<Loadable>) {
        (self.start)(message, background, episode)
    }

    fn on_load_end(&self, background: bool, episode: &Arc<Loadable>) {
        (self.end)(background, episode)
    }

    fn name(&self) -> &'static str {
        "LoadFn"
    }
}
