//! # LoadHandler: debounced load episode aggregator.
//!
//! Turns noisy, overlapping `LoadStart` / `LoadEnd` events on one object into a
//! clean pair of [`LoadObserver`] calls.
//!
//! ## Event flow
//! ```text
//! LoadStart(msg, bg, source) ──► handle_start()
//!   ├─ no open signal  → open LoadSignal, arm start timer (start_delay)
//!   ├─ open signal     → cancel end timer, keep latest msg,
//!   │                    background→blocking upgrade re-arms start timer
//!   └─ source not yet pending → pending += source, once(source, LoadEnd)
//!
//! start timer fires  ──► started = true ──► observer.on_load_start(msg, bg, episode)
//!
//! LoadEnd on source  ──► handle_end()
//!   └─ pending -= source; if pending empty → arm end timer (end_delay)
//!
//! end timer fires (pending still empty)
//!   ├─ discard LoadSignal, cancel start timer
//!   ├─ started? → observer.on_load_end(bg, episode)
//!   └─ episode.trigger(LoadEnd)
//! ```
//!
//! ## Rules
//! - A load that ends before `start_delay` never shows: no start, no end.
//! - `on_load_end` only runs for an episode whose start timer fired.
//! - An episode closes only when **every** pending source ended and no new start
//!   arrived during `end_delay`.
//! - Every timer is cancelled before it is re-armed, and a fired timer re-checks under
//!   the lock that it is still the armed one, so a superseded timer never acts.
//! - A start that keeps an already blocking episode blocking does **not** re-arm the
//!   start timer.
//!
//! Timers are spawned tasks. A start delivered outside a Tokio runtime is logged and
//! ignored; an end delivered outside one closes the episode without `end_delay`.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tracing::{debug, trace, warn};

use super::{
    loadable::Loadable,
    observer::LoadObserver,
    timer::{Timer, TimerId},
};
use crate::{
    config::{Config, LoadTimings},
    error::guarded,
    events::{Event, EventKind, ListenerId},
};

/// A source object whose `LoadEnd` the open episode is waiting for.
struct PendingSource {
    source: Arc<Loadable>,
    listener: ListenerId,
}

/// State of one open load episode.
struct LoadSignal {
    /// Episode object handed to the observer; triggers `LoadEnd` on close.
    episode: Arc<Loadable>,
    message: Option<Arc<str>>,
    background: bool,
    /// Set when the start timer fires.
    started: bool,
    start_timer: Option<Timer>,
    end_timer: Option<Timer>,
    /// Ordered set of sources, keyed by `Loadable::id`.
    pending: Vec<PendingSource>,
}

impl LoadSignal {
    fn new(message: Option<Arc<str>>, background: bool) -> Self {
        Self {
            episode: Loadable::new("load-episode"),
            message,
            background,
            started: false,
            start_timer: None,
            end_timer: None,
            pending: Vec::new(),
        }
    }

    fn is_pending(&self, source: &Loadable) -> bool {
        self.pending.iter().any(|p| p.source.id() == source.id())
    }
}

impl Drop for LoadSignal {
    fn drop(&mut self) {
        for p in self.pending.drain(..) {
            p.source.off(p.listener);
        }
    }
}

/// Debounced start/end aggregator bound to one target object.
///
/// ### Responsibilities
/// - **Episode tracking**: keeps at most one open [`LoadSignal`] for its target
/// - **Debounce**: delays the visible start by `start_delay` and the visible end by `end_delay`
/// - **Fan-in**: waits for every source that joined the episode to end
///
/// ### Rules
/// - Two handlers attached to the same object keep independent episodes.
/// - Delays are resolved at arm time from [`LoadTimings`] over the class-level [`Config`].
pub struct LoadHandler {
    observer: Arc<dyn LoadObserver>,
    defaults: Config,
    timings: Mutex<LoadTimings>,
    state: Mutex<Option<LoadSignal>>,
    me: Weak<LoadHandler>,
}

impl LoadHandler {
    /// Creates a handler driving `observer` with the given class-level defaults.
    pub fn new(observer: Arc<dyn LoadObserver>, defaults: Config) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            observer,
            defaults,
            timings: Mutex::new(LoadTimings::default()),
            state: Mutex::new(None),
            me: me.clone(),
        })
    }

    /// Registers this handler for `LoadStart` on `target`.
    ///
    /// The target keeps the handler alive until the returned listener is removed.
    pub fn attach(self: &Arc<Self>, target: &Loadable) -> ListenerId {
        target.on(EventKind::LoadStart, self.listener())
    }

    /// Returns the `LoadStart` listener function for manual registration.
    pub fn listener(self: &Arc<Self>) -> impl Fn(&Event) + Send + Sync + 'static {
        let me = Arc::clone(self);
        move |ev: &Event| me.handle_start(ev)
    }

    /// Replaces the per-instance delay overrides.
    ///
    /// Takes effect the next time a timer is armed.
    pub fn set_timings(&self, timings: LoadTimings) {
        *self.timings.lock() = timings;
    }

    /// Returns the per-instance delay overrides.
    pub fn timings(&self) -> LoadTimings {
        *self.timings.lock()
    }

    /// Returns the delays currently in effect.
    pub fn effective(&self) -> Config {
        self.timings.lock().resolve(&self.defaults)
    }

    /// True while an episode is open (from the first start to the confirmed end).
    pub fn is_loading(&self) -> bool {
        self.state.lock().is_some()
    }

    /// True if the open episode has become visible.
    pub fn is_started(&self) -> bool {
        self.state.lock().as_ref().is_some_and(|s| s.started)
    }

    /// Number of sources the open episode is waiting for.
    pub fn pending(&self) -> usize {
        self.state.lock().as_ref().map_or(0, |s| s.pending.len())
    }

    /// Handles a `LoadStart` event observed on the target.
    ///
    /// Events without a source are ignored: there is nothing to wait on.
    pub fn handle_start(&self, ev: &Event) {
        let Some(source) = ev.source.clone() else {
            trace!(observer = self.observer.name(), "load start without source ignored");
            return;
        };
        if Handle::try_current().is_err() {
            warn!(
                observer = self.observer.name(),
                source = source.label(),
                "load start outside a Tokio runtime ignored"
            );
            return;
        }
        let start_delay = self.effective().start_delay;

        let mut state = self.state.lock();
        let is_new = state.is_none();
        let signal = state.get_or_insert_with(|| LoadSignal::new(ev.message.clone(), ev.background));

        if is_new {
            debug!(
                episode = signal.episode.id(),
                source = source.label(),
                background = ev.background,
                "load episode opened"
            );
            self.arm_start(signal, start_delay);
        } else {
            if let Some(timer) = signal.end_timer.take() {
                timer.cancel();
            }
            signal.message = ev.message.clone();
            if !ev.background && signal.background {
                signal.background = false;
                trace!(episode = signal.episode.id(), "background episode upgraded");
                self.arm_start(signal, start_delay);
            }
        }

        if !signal.is_pending(&source) {
            let me = self.me.clone();
            let episode_id = signal.episode.id();
            let source_id = source.id();
            let listener = source.once(EventKind::LoadEnd, move |_| {
                if let Some(handler) = me.upgrade() {
                    handler.handle_end(episode_id, source_id);
                }
            });
            signal.pending.push(PendingSource { source, listener });
        }
    }

    /// Handles the `LoadEnd` of one pending source.
    fn handle_end(&self, episode_id: u64, source_id: u64) {
        let end_delay = self.effective().end_delay;

        let mut state = self.state.lock();
        let Some(signal) = state.as_mut().filter(|s| s.episode.id() == episode_id) else {
            return;
        };

        signal.pending.retain(|p| p.source.id() != source_id);
        trace!(episode = episode_id, left = signal.pending.len(), "source ended");

        if signal.pending.is_empty() {
            if let Some(timer) = signal.end_timer.take() {
                timer.cancel();
            }
            if Handle::try_current().is_err() {
                warn!(
                    episode = episode_id,
                    "load end outside a Tokio runtime, closing without delay"
                );
                let closed = state.take();
                drop(state);
                if let Some(signal) = closed {
                    self.close(signal);
                }
                return;
            }
            let me = self.me.clone();
            signal.end_timer = Some(Timer::arm(end_delay, move |timer_id| {
                if let Some(handler) = me.upgrade() {
                    handler.fire_end(episode_id, timer_id);
                }
            }));
        }
    }

    /// Cancels any armed start timer and arms a fresh one.
    fn arm_start(&self, signal: &mut LoadSignal, delay: Duration) {
        if let Some(timer) = signal.start_timer.take() {
            timer.cancel();
        }
        let me = self.me.clone();
        let episode_id = signal.episode.id();
        signal.start_timer = Some(Timer::arm(delay, move |timer_id| {
            if let Some(handler) = me.upgrade() {
                handler.fire_start(episode_id, timer_id);
            }
        }));
    }

    fn fire_start(&self, episode_id: u64, timer_id: TimerId) {
        let (message, background, episode) = {
            let mut state = self.state.lock();
            let Some(signal) = state.as_mut().filter(|s| {
                s.episode.id() == episode_id
                    && s.start_timer.as_ref().map(Timer::id) == Some(timer_id)
            }) else {
                return;
            };
            signal.start_timer = None;
            signal.started = true;
            (
                signal.message.clone(),
                signal.background,
                Arc::clone(&signal.episode),
            )
        };

        debug!(episode = episode_id, background, "load start");
        guarded("on_load_start", || {
            self.observer
                .on_load_start(message.as_deref(), background, &episode)
        });
    }

    fn fire_end(&self, episode_id: u64, timer_id: TimerId) {
        let signal = {
            let mut state = self.state.lock();
            let current = state.as_ref().is_some_and(|s| {
                s.episode.id() == episode_id
                    && s.end_timer.as_ref().map(Timer::id) == Some(timer_id)
                    && s.pending.is_empty()
            });
            if !current {
                return;
            }
            state.take()
        };
        if let Some(signal) = signal {
            self.close(signal);
        }
    }

    /// Reports the end of a discarded signal. Must be called without the state lock.
    fn close(&self, signal: LoadSignal) {
        let episode_id = signal.episode.id();
        if let Some(timer) = &signal.start_timer {
            timer.cancel();
        }

        debug!(episode = episode_id, started = signal.started, "load episode closed");
        if signal.started {
            guarded("on_load_end", || {
                self.observer.on_load_end(signal.background, &signal.episode)
            });
        }
        signal.episode.trigger(&Event::load_end(&signal.episode));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loading::LoadFn;
    use tokio::time::sleep;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Start(Option<String>, bool),
        End(bool),
    }

    fn recorder() -> (Arc<Mutex<Vec<Call>>>, Arc<LoadHandler>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let on_start = Arc::clone(&calls);
        let on_end = Arc::clone(&calls);
        let observer = LoadFn::arc(
            move |message: Option<&str>, background: bool, _: &Arc<Loadable>| {
                on_start
                    .lock()
                    .push(Call::Start(message.map(str::to_owned), background))
            },
            move |background: bool, _: &Arc<Loadable>| on_end.lock().push(Call::End(background)),
        );
        (calls, LoadHandler::new(observer, Config::default()))
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[tokio::test(start_paused = true)]
    async fn fast_load_never_shows() {
        let (calls, handler) = recorder();
        let view = Loadable::new("view");
        let model = Loadable::new("model");
        handler.attach(&view);
        model.on(EventKind::LoadStart, {
            let view = Arc::clone(&view);
            move |ev| view.trigger(ev)
        });

        model.load_start(None, false);
        sleep(ms(100)).await;
        model.load_end();
        sleep(ms(1000)).await;

        assert!(calls.lock().is_empty());
        assert!(!handler.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_load_shows_then_hides() {
        let (calls, handler) = recorder();
        let view = Loadable::new("view");
        handler.attach(&view);

        view.load_start(Some("Fetching"), false);
        sleep(ms(320)).await;
        assert!(calls.lock().is_empty());
        sleep(ms(20)).await;
        assert_eq!(*calls.lock(), vec![Call::Start(Some("Fetching".into()), false)]);
        assert!(handler.is_started());

        sleep(ms(160)).await;
        view.load_end();
        sleep(ms(90)).await;
        assert_eq!(calls.lock().len(), 1);
        sleep(ms(20)).await;
        assert_eq!(
            *calls.lock(),
            vec![Call::Start(Some("Fetching".into()), false), Call::End(false)]
        );
        assert!(!handler.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_every_source() {
        let (calls, handler) = recorder();
        let view = Loadable::new("view");
        let a = Loadable::new("a");
        let b = Loadable::new("b");
        handler.attach(&view);

        view.trigger(&Event::load_start(None, false, &a));
        view.trigger(&Event::load_start(None, false, &b));
        assert_eq!(handler.pending(), 2);
        sleep(ms(400)).await;

        a.load_end();
        sleep(ms(500)).await;
        assert_eq!(calls.lock().len(), 1);
        assert!(handler.is_loading());

        b.load_end();
        sleep(ms(150)).await;
        assert_eq!(calls.lock().last(), Some(&Call::End(false)));
    }

    #[tokio::test(start_paused = true)]
    async fn start_during_end_delay_keeps_episode_open() {
        let (calls, handler) = recorder();
        let view = Loadable::new("view");
        let a = Loadable::new("a");
        let b = Loadable::new("b");
        handler.attach(&view);

        view.trigger(&Event::load_start(None, false, &a));
        sleep(ms(400)).await;
        a.load_end();
        sleep(ms(50)).await;
        view.trigger(&Event::load_start(None, false, &b));
        sleep(ms(500)).await;

        assert_eq!(calls.lock().len(), 1);
        assert_eq!(handler.pending(), 1);

        b.load_end();
        sleep(ms(150)).await;
        assert_eq!(calls.lock().len(), 2);
        assert!(!handler.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_source_is_tracked_once() {
        let (calls, handler) = recorder();
        let view = Loadable::new("view");
        handler.attach(&view);

        view.load_start(None, false);
        view.load_start(Some("again"), false);
        assert_eq!(handler.pending(), 1);
        assert_eq!(view.events().listener_count(EventKind::LoadEnd), 1);

        sleep(ms(400)).await;
        assert_eq!(*calls.lock(), vec![Call::Start(Some("again".into()), false)]);
        view.load_end();
        sleep(ms(150)).await;
        assert_eq!(calls.lock().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn background_upgrade_rearms_start() {
        let (calls, handler) = recorder();
        let view = Loadable::new("view");
        let a = Loadable::new("a");
        let b = Loadable::new("b");
        handler.attach(&view);

        view.trigger(&Event::load_start(None, true, &a));
        sleep(ms(200)).await;
        view.trigger(&Event::load_start(None, false, &b));

        // The first timer would have fired at 330ms; the upgrade re-armed it.
        sleep(ms(200)).await;
        assert!(calls.lock().is_empty());
        sleep(ms(140)).await;
        assert_eq!(*calls.lock(), vec![Call::Start(None, false)]);
    }

    #[tokio::test(start_paused = true)]
    async fn upgrade_after_visible_background_start_reports_again() {
        let (calls, handler) = recorder();
        let view = Loadable::new("view");
        let a = Loadable::new("a");
        let b = Loadable::new("b");
        handler.attach(&view);

        view.trigger(&Event::load_start(None, true, &a));
        sleep(ms(400)).await;
        view.trigger(&Event::load_start(None, false, &b));
        sleep(ms(400)).await;

        assert_eq!(
            *calls.lock(),
            vec![Call::Start(None, true), Call::Start(None, false)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn blocking_join_does_not_rearm() {
        let (calls, handler) = recorder();
        let view = Loadable::new("view");
        let a = Loadable::new("a");
        let b = Loadable::new("b");
        handler.attach(&view);

        view.trigger(&Event::load_start(None, false, &a));
        sleep(ms(300)).await;
        view.trigger(&Event::load_start(Some("b"), false, &b));
        sleep(ms(40)).await;

        assert_eq!(*calls.lock(), vec![Call::Start(Some("b".into()), false)]);
    }

    #[tokio::test(start_paused = true)]
    async fn episode_triggers_load_end_when_closed() {
        let (_calls, handler) = recorder();
        let view = Loadable::new("view");
        let episodes = Arc::new(Mutex::new(Vec::new()));
        let closed = Arc::new(Mutex::new(0usize));

        let observer = LoadFn::arc(
            {
                let episodes = Arc::clone(&episodes);
                move |_: Option<&str>, _: bool, episode: &Arc<Loadable>| {
                    episodes.lock().push(Arc::clone(episode))
                }
            },
            |_: bool, _: &Arc<Loadable>| {},
        );
        let handler2 = LoadHandler::new(observer, Config::default());
        handler.attach(&view);
        handler2.attach(&view);

        view.load_start(None, false);
        sleep(ms(400)).await;
        let episode = episodes.lock().first().cloned().expect("episode reported");
        episode.on(EventKind::LoadEnd, {
            let closed = Arc::clone(&closed);
            move |_| *closed.lock() += 1
        });

        view.load_end();
        sleep(ms(150)).await;
        assert_eq!(*closed.lock(), 1);
        assert!(!handler.is_loading());
        assert!(!handler2.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn per_instance_timings_override_defaults() {
        let (calls, handler) = recorder();
        handler.set_timings(
            LoadTimings::default()
                .with_start_delay(ms(10))
                .with_end_delay(ms(5)),
        );
        let view = Loadable::new("view");
        handler.attach(&view);

        view.load_start(None, false);
        sleep(ms(15)).await;
        assert_eq!(calls.lock().len(), 1);
        view.load_end();
        sleep(ms(10)).await;
        assert_eq!(calls.lock().len(), 2);
        assert_eq!(handler.timings().end_delay, Some(ms(5)));
    }

    #[tokio::test(start_paused = true)]
    async fn unmatched_end_is_absorbed() {
        let (calls, handler) = recorder();
        let view = Loadable::new("view");
        handler.attach(&view);

        view.load_end();
        sleep(ms(500)).await;
        assert!(calls.lock().is_empty());
        assert!(!handler.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_observer_does_not_wedge_episode() {
        let observer = LoadFn::arc(
            |_: Option<&str>, _: bool, _: &Arc<Loadable>| panic!("observer failure"),
            |_: bool, _: &Arc<Loadable>| {},
        );
        let handler = LoadHandler::new(observer, Config::default());
        let view = Loadable::new("view");
        handler.attach(&view);

        view.load_start(None, false);
        sleep(ms(400)).await;
        view.load_end();
        sleep(ms(150)).await;
        assert!(!handler.is_loading());
    }

    #[test]
    fn start_outside_runtime_is_ignored() {
        let (calls, handler) = recorder();
        let view = Loadable::new("view");
        handler.attach(&view);

        view.load_start(Some("Fetching"), false);
        assert!(!handler.is_loading());
        assert_eq!(handler.pending(), 0);

        view.load_end();
        assert!(calls.lock().is_empty());
    }

    #[test]
    fn end_outside_runtime_closes_episode() {
        let (calls, handler) = recorder();
        let view = Loadable::new("view");
        handler.attach(&view);

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        {
            let _guard = rt.enter();
            view.load_start(None, false);
        }
        assert!(handler.is_loading());

        view.load_end();
        assert!(!handler.is_loading());
        assert!(calls.lock().is_empty());
    }
}
