//! # App: the explicit application root.
//!
//! Owns the class-level [`Config`], the root [`Loadable`] (the global scope that
//! app-wide loads bubble up to), the navigation [`History`], and an optional root
//! [`LoadHandler`] driving a global busy indicator.
//!
//! Components receive the root by reference at construction through
//! [`App::view`] and [`App::data_object`].

use std::fmt;
use std::sync::Arc;

use crate::{
    config::Config,
    fetch::TransportRef,
    loading::{LoadHandler, Loadable},
    route::History,
};

use super::{builder::AppBuilder, data::DataObject, view::View};

/// Application root.
pub struct App {
    config: Config,
    root: Arc<Loadable>,
    history: Arc<History>,
    indicator: Option<Arc<LoadHandler>>,
}

impl App {
    /// Starts building an application with the given defaults.
    pub fn builder(config: Config) -> AppBuilder {
        AppBuilder::new(config)
    }

    pub(super) fn new_internal(
        config: Config,
        root: Arc<Loadable>,
        history: Arc<History>,
        indicator: Option<Arc<LoadHandler>>,
    ) -> Self {
        Self {
            config,
            root,
            history,
            indicator,
        }
    }

    /// Class-level debounce defaults.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Global scope for app-wide loads.
    pub fn root(&self) -> &Arc<Loadable> {
        &self.root
    }

    /// Navigation history.
    pub fn history(&self) -> &Arc<History> {
        &self.history
    }

    /// Handler driving the global indicator, if an observer was configured.
    pub fn indicator(&self) -> Option<&Arc<LoadHandler>> {
        self.indicator.as_ref()
    }

    /// `true` while the global indicator has an open episode.
    pub fn is_loading(&self) -> bool {
        self.indicator.as_ref().is_some_and(|h| h.is_loading())
    }

    /// Navigates to `fragment`, see [`History::navigate`].
    pub fn navigate(&self, fragment: impl Into<Arc<str>>) {
        self.history.navigate(fragment);
    }

    /// Creates a view wired to this root.
    pub fn view(&self, label: impl Into<Arc<str>>) -> Arc<View> {
        View::new(label, self.config, Some(&self.root))
    }

    /// Creates a data object wired to this root and history.
    pub fn data_object<T>(&self, label: impl Into<Arc<str>>, transport: TransportRef<T>) -> Arc<DataObject<T>>
    where
        T: Send + Sync + 'static,
    {
        DataObject::with_root(label, transport, &self.history, &self.root)
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("config", &self.config)
            .field("root", &self.root)
            .field("history", &self.history)
            .field("indicator", &self.indicator.is_some())
            .finish()
    }
}
