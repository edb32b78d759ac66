//! # Debounce configuration.
//!
//! Provides [`Config`], the class-level defaults shared by every handler of
//! an [`App`](crate::App), and [`LoadTimings`], the per-instance overrides.
//!
//! Config is used in two ways:
//! 1. **App creation**: `App::builder(config)`
//! 2. **Handler defaults**: `LoadTimings::resolve(&config)` whenever a timer is armed
//!
//! ## Resolution
//! - `LoadTimings { start_delay: None, .. }` → `Config::start_delay`
//! - `LoadTimings { start_delay: Some(d), .. }` → `d` (even `0s`, which shows immediately)

use std::time::Duration;

/// Default delay before a load becomes visible.
pub const DEFAULT_START_DELAY: Duration = Duration::from_millis(330);

/// Default delay before a finished load is hidden.
pub const DEFAULT_END_DELAY: Duration = Duration::from_millis(100);

/// Class-level debounce defaults.
///
/// ## Field semantics
/// - `start_delay`: quiet period before `on_load_start` runs; shorter loads never show
/// - `end_delay`: quiet period after the last sub-load ends before `on_load_end` runs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Delay between the first `load:start` of an episode and the visible start.
    pub start_delay: Duration,

    /// Delay between the last `load:end` of an episode and the visible end.
    ///
    /// A new start arriving inside this window keeps the episode open.
    pub end_delay: Duration,
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `start_delay = 330ms`
    /// - `end_delay = 100ms`
    fn default() -> Self {
        Self {
            start_delay: DEFAULT_START_DELAY,
            end_delay: DEFAULT_END_DELAY,
        }
    }
}

/// Per-instance overrides of the [`Config`] delays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadTimings {
    /// Override for [`Config::start_delay`].
    pub start_delay: Option<Duration>,
    /// Override for [`Config::end_delay`].
    pub end_delay: Option<Duration>,
}

impl LoadTimings {
    /// Overrides the start delay.
    pub fn with_start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = Some(delay);
        self
    }

    /// Overrides the end delay.
    pub fn with_end_delay(mut self, delay: Duration) -> Self {
        self.end_delay = Some(delay);
        self
    }

    /// Returns the effective delays, falling back to `cfg` per field.
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use loadvisor::{Config, LoadTimings};
    ///
    /// let timings = LoadTimings::default().with_end_delay(Duration::from_millis(5));
    /// let cfg = timings.resolve(&Config::default());
    /// assert_eq!(cfg.start_delay, Duration::from_millis(330));
    /// assert_eq!(cfg.end_delay, Duration::from_millis(5));
    /// ```
    #[inline]
    pub fn resolve(&self, cfg: &Config) -> Config {
        Config {
            start_delay: self.start_delay.unwrap_or(cfg.start_delay),
            end_delay: self.end_delay.unwrap_or(cfg.end_delay),
        }
    }
}
