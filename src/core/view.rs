//! # View: a loadable with a visible loading state.
//!
//! A [`View`] embeds a [`Loadable`] and a [`LoadHandler`] whose default observer
//! toggles [`View::is_loading`], reports the change as
//! [`EventKind::LoadStateChanged`](crate::EventKind::LoadStateChanged), and bubbles
//! blocking episodes to the application root.
//!
//! ```text
//! DataObject ─forward─► View.loadable ─► LoadHandler ─► ViewObserver
//!                                                        ├─ is_loading = true/false
//!                                                        ├─ LoadStateChanged(phase)
//!                                                        └─ !bg && !non_blocking
//!                                                             → root.LoadStart(episode)
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::trace;

use crate::{
    config::{Config, LoadTimings},
    events::{Event, LoadPhase},
    loading::{Forwarding, LoadHandler, LoadObserver, Loadable, forward_events},
};

use super::data::DataObject;

#[derive(Default)]
struct ViewState {
    loading: AtomicBool,
    non_blocking: AtomicBool,
}

/// Default observer of a view.
struct ViewObserver {
    view: Weak<Loadable>,
    root: Option<Weak<Loadable>>,
    state: Arc<ViewState>,
}

impl LoadObserver for ViewObserver {
    fn on_load_start(&self, message: Option<&str>, background: bool, episode: &Arc<Loadable>) {
        self.state.loading.store(true, Ordering::SeqCst);
        let Some(view) = self.view.upgrade() else {
            return;
        };
        view.trigger(&Event::load_state(LoadPhase::Start { background }).with_source(episode));

        if background || self.state.non_blocking.load(Ordering::SeqCst) {
            return;
        }
        if let Some(root) = self.root.as_ref().and_then(Weak::upgrade) {
            trace!(view = view.label(), episode = episode.id(), "bubbling load to root");
            root.trigger(&Event::load_start(message, false, episode));
        }
    }

    fn on_load_end(&self, _background: bool, episode: &Arc<Loadable>) {
        self.state.loading.store(false, Ordering::SeqCst);
        if let Some(view) = self.view.upgrade() {
            view.trigger(&Event::load_state(LoadPhase::End).with_source(episode));
        }
    }

    fn name(&self) -> &'static str {
        "ViewObserver"
    }
}

/// A loadable view.
pub struct View {
    loadable: Arc<Loadable>,
    handler: Arc<LoadHandler>,
    state: Arc<ViewState>,
    bindings: Mutex<HashMap<u64, Forwarding>>,
}

impl View {
    /// Creates a view; blocking episodes bubble to `root` when given.
    pub fn new(label: impl Into<Arc<str>>, config: Config, root: Option<&Arc<Loadable>>) -> Arc<Self> {
        let loadable = Loadable::new(label);
        let state = Arc::new(ViewState::default());
        let observer = Arc::new(ViewObserver {
            view: Arc::downgrade(&loadable),
            root: root.map(Arc::downgrade),
            state: Arc::clone(&state),
        });
        let handler = LoadHandler::new(observer, config);
        handler.attach(&loadable);

        Arc::new(Self {
            loadable,
            handler,
            state,
            bindings: Mutex::new(HashMap::new()),
        })
    }

    /// The view's loadable capability.
    pub fn loadable(&self) -> &Arc<Loadable> {
        &self.loadable
    }

    /// The view's load handler.
    pub fn handler(&self) -> &Arc<LoadHandler> {
        &self.handler
    }

    /// `true` between the visible start and the visible end of an episode.
    pub fn is_loading(&self) -> bool {
        self.state.loading.load(Ordering::SeqCst)
    }

    /// Keeps this view's episodes out of the global indicator.
    pub fn set_non_blocking(&self, non_blocking: bool) {
        self.state.non_blocking.store(non_blocking, Ordering::SeqCst);
    }

    /// See [`View::set_non_blocking`].
    pub fn is_non_blocking(&self) -> bool {
        self.state.non_blocking.load(Ordering::SeqCst)
    }

    /// Overrides the debounce delays of this view.
    pub fn set_timings(&self, timings: LoadTimings) {
        self.handler.set_timings(timings);
    }

    /// Starts a load on the view itself.
    pub fn load_start(&self, message: Option<&str>, background: bool) {
        self.loadable.load_start(message, background);
    }

    /// Ends a load started with [`View::load_start`].
    pub fn load_end(&self) {
        self.loadable.load_end();
    }

    /// Shows `object`'s loads on this view.
    ///
    /// Binding the same object twice keeps a single forwarding.
    pub fn bind_data_object<T>(&self, object: &DataObject<T>)
    where
        T: Send + Sync + 'static,
    {
        let source = object.loadable();
        let mut bindings = self.bindings.lock();
        bindings
            .entry(source.id())
            .or_insert_with(|| forward_events(source, &self.loadable, false));
    }

    /// Stops showing `object`'s loads. Returns `false` if it was not bound.
    pub fn unbind_data_object<T>(&self, object: &DataObject<T>) -> bool
    where
        T: Send + Sync + 'static,
    {
        let removed = self.bindings.lock().remove(&object.loadable().id());
        removed.is_some_and(|forwarding| forwarding.off())
    }
}

impl Drop for View {
    fn drop(&mut self) {
        for (_, forwarding) in self.bindings.get_mut().drain() {
            forwarding.off();
        }
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("loadable", &self.loadable)
            .field("loading", &self.is_loading())
            .field("non_blocking", &self.is_non_blocking())
            .finish()
    }
}
