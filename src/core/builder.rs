use std::sync::Arc;

use tracing::debug;

use crate::{
    config::Config,
    loading::{LoadHandler, LoadObserver, Loadable},
    route::History,
};

use super::app::App;

/// Builder for constructing an [`App`] with optional features.
pub struct AppBuilder {
    cfg: Config,
    observer: Option<Arc<dyn LoadObserver>>,
    history: Option<Arc<History>>,
}

impl AppBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            observer: None,
            history: None,
        }
    }

    /// Sets the observer of the global loading indicator.
    ///
    /// Without one, loads still bubble to the root but nothing aggregates them.
    pub fn with_observer(mut self, observer: Arc<dyn LoadObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Uses an existing navigation history instead of a fresh one at `""`.
    pub fn with_history(mut self, history: Arc<History>) -> Self {
        self.history = Some(history);
        self
    }

    /// Builds and returns the App instance.
    ///
    /// Creates the root loadable and, if an observer was set, attaches the
    /// global indicator handler to it.
    pub fn build(self) -> Arc<App> {
        let root = Loadable::new("root");
        let history = self.history.unwrap_or_default();

        let indicator = self.observer.map(|observer| {
            debug!(observer = observer.name(), "global indicator attached");
            let handler = LoadHandler::new(observer, self.cfg);
            handler.attach(&root);
            handler
        });

        Arc::new(App::new_internal(self.cfg, root, history, indicator))
    }
}
