//! # LogObserver: tracing-backed load observer
//!
//! A minimal observer that reports visible load transitions through `tracing`.
//! Use it for demos or as the root observer while wiring an application.
//!
//! ## Example output
//! ```text
//! INFO loadvisor::loading::log: load shown episode=12 background=false message=Some("Fetching")
//! INFO loadvisor::loading::log: load hidden episode=12 background=false
//! ```

use std::sync::Arc;

use super::{loadable::Loadable, observer::LoadObserver};

/// Load observer that logs start/end.
#[derive(Default)]
pub struct LogObserver;

impl LogObserver {
    /// Construct a new [`LogObserver`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl LoadObserver for LogObserver {
    fn on_load_start(&self, message: Option<&str>, background: bool, episode: &Arc<Loadable>) {
        tracing::info!(episode = episode.id(), background, message = ?message, "load shown");
    }

    fn on_load_end(&self, background: bool, episode: &Arc<Loadable>) {
        tracing::info!(episode = episode.id(), background, "load hidden");
    }

    fn name(&self) -> &'static str {
        "LogObserver"
    }
}

#[cfg(all(test, feature = "logging"))]
mod tests {
    use super::*;
    use std::time::Duration;

    use tokio::time::sleep;

    use crate::{config::Config, loading::LoadHandler};

    #[tokio::test(start_paused = true)]
    async fn drives_a_full_episode() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let observer = Arc::new(LogObserver::new());
        assert_eq!(observer.name(), "LogObserver");
        let handler = LoadHandler::new(observer, Config::default());
        let view = Loadable::new("view");
        handler.attach(&view);

        view.load_start(Some("Fetching"), false);
        sleep(Duration::from_millis(400)).await;
        assert!(handler.is_started());

        view.load_end();
        sleep(Duration::from_millis(150)).await;
        assert!(!handler.is_loading());
    }
}
