//! # Route guard: abandon callbacks on navigation.
//!
//! [`bind_to_route`] wraps the success path of an async operation so that a
//! navigation happening first cancels it. The returned [`RouteTrigger`] is the new
//! success path; whichever of "trigger fired" / "route changed" / "failed" happens
//! first wins, and the guard resolves exactly once.
//!
//! ## Resolution
//! ```text
//!                      fragment unchanged         fragment changed
//! fire(value)     →    success(value)             failure(RouteChanged)
//! fail(err)       →    failure(Failed(err))       failure(RouteChanged)
//! route event     →    ignored (duplicate)        failure(RouteChanged)
//! after resolve   →    no-op                      no-op
//! ```
//!
//! The route listener is removed on resolution, whichever path resolved it, or when
//! the last [`RouteTrigger`] is dropped unresolved.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, trace};

use super::history::History;
use crate::error::{FetchError, guarded};
use crate::events::ListenerId;

/// Why a guarded operation did not reach its success callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Abandoned {
    /// Navigation happened before the operation resolved.
    RouteChanged,
    /// The operation failed.
    Failed(FetchError),
}

impl Abandoned {
    /// `true` for a genuine failure, `false` for a navigation cancel.
    pub fn is_error(&self) -> bool {
        matches!(self, Abandoned::Failed(_))
    }

    /// Returns a short stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            Abandoned::RouteChanged => "route_changed",
            Abandoned::Failed(_) => "failed",
        }
    }
}

enum Outcome<A> {
    Fire(A),
    Fail(FetchError),
    Route,
}

struct Pending<A> {
    success: Box<dyn FnOnce(A) + Send>,
    failure: Box<dyn FnOnce(Abandoned) + Send>,
    listener: Option<ListenerId>,
}

struct Guard<A> {
    history: Arc<History>,
    origin: Arc<str>,
    pending: Mutex<Option<Pending<A>>>,
}

impl<A: Send + 'static> Guard<A> {
    fn finalize(&self, outcome: Outcome<A>) {
        let current = self.history.fragment();
        let same = current == self.origin;

        let taken = {
            let mut pending = self.pending.lock();
            if pending.is_none() {
                return;
            }
            if matches!(outcome, Outcome::Route) && same {
                trace!(fragment = %current, "route notification without navigation ignored");
                return;
            }
            pending.take()
        };
        let Some(Pending {
            success,
            failure,
            listener,
        }) = taken
        else {
            return;
        };
        if let Some(id) = listener {
            self.history.off(id);
        }

        match outcome {
            Outcome::Fire(value) if same => {
                guarded("route success", || success(value));
            }
            Outcome::Fail(err) if same => {
                debug!(error = err.as_label(), "guarded operation failed");
                guarded("route failure", || failure(Abandoned::Failed(err)));
            }
            _ => {
                debug!(from = %self.origin, to = %current, "guarded operation abandoned by navigation");
                guarded("route failure", || failure(Abandoned::RouteChanged));
            }
        }
    }
}

impl<A> Drop for Guard<A> {
    fn drop(&mut self) {
        if let Some(id) = self.pending.get_mut().take().and_then(|p| p.listener) {
            trace!(fragment = %self.origin, "unresolved guard dropped");
            self.history.off(id);
        }
    }
}

/// Success path returned by [`bind_to_route`].
///
/// Cloning shares the guard: any clone resolves it for all.
pub struct RouteTrigger<A> {
    guard: Arc<Guard<A>>,
}

impl<A> Clone for RouteTrigger<A> {
    fn clone(&self) -> Self {
        Self {
            guard: Arc::clone(&self.guard),
        }
    }
}

impl<A: Send + 'static> RouteTrigger<A> {
    /// Resolves through the success path.
    ///
    /// Runs `success(value)` if the fragment is unchanged, otherwise reports
    /// [`Abandoned::RouteChanged`]. No-op once resolved.
    pub fn fire(&self, value: A) {
        self.guard.finalize(Outcome::Fire(value));
    }

    /// Resolves through the error path.
    ///
    /// Reports [`Abandoned::Failed`], or [`Abandoned::RouteChanged`] if the
    /// fragment changed meanwhile. No-op once resolved.
    pub fn fail(&self, error: FetchError) {
        self.guard.finalize(Outcome::Fail(error));
    }

    /// `true` once a callback has been chosen.
    pub fn is_completed(&self) -> bool {
        self.guard.pending.lock().is_none()
    }

    /// The fragment captured when the guard was created.
    pub fn origin(&self) -> &str {
        &self.guard.origin
    }
}

impl<A> fmt::Debug for RouteTrigger<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTrigger")
            .field("origin", &self.guard.origin)
            .field("completed", &self.guard.pending.lock().is_none())
            .finish()
    }
}

/// Wraps `success` so that navigation on `history` cancels it.
///
/// `failure` receives the reason when `success` does not run; pass `drop` to
/// ignore it.
///
/// # Example
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use loadvisor::{Abandoned, History, bind_to_route};
///
/// let history = History::new("list");
/// let cancelled = Arc::new(AtomicBool::new(false));
/// let flag = Arc::clone(&cancelled);
///
/// let trigger = bind_to_route(
///     &history,
///     |rows: Vec<u32>| println!("render {rows:?}"),
///     move |why: Abandoned| flag.store(!why.is_error(), Ordering::SeqCst),
/// );
///
/// history.navigate("detail/3");
/// trigger.fire(vec![1, 2, 3]);
/// assert!(cancelled.load(Ordering::SeqCst));
/// ```
pub fn bind_to_route<A, S, F>(history: &Arc<History>, success: S, failure: F) -> RouteTrigger<A>
where
    A: Send + 'static,
    S: FnOnce(A) + Send + 'static,
    F: FnOnce(Abandoned) + Send + 'static,
{
    let guard = Arc::new(Guard {
        history: Arc::clone(history),
        origin: history.fragment(),
        pending: Mutex::new(Some(Pending {
            success: Box::new(success),
            failure: Box::new(failure),
            listener: None,
        })),
    });

    let weak: Weak<Guard<A>> = Arc::downgrade(&guard);
    let id = history.on_route(move |_| {
        if let Some(guard) = weak.upgrade() {
            guard.finalize(Outcome::Route);
        }
    });
    if let Some(pending) = guard.pending.lock().as_mut() {
        pending.listener = Some(id);
    }

    RouteTrigger { guard }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Log = Arc<Mutex<Vec<String>>>;

    fn bind(history: &Arc<History>, log: &Log) -> RouteTrigger<u32> {
        let (ok, fail) = (Arc::clone(log), Arc::clone(log));
        bind_to_route(
            history,
            move |v: u32| ok.lock().push(format!("success:{v}")),
            move |why: Abandoned| {
                fail.lock()
                    .push(format!("failure:{}:{}", why.as_label(), why.is_error()))
            },
        )
    }

    #[test]
    fn fire_before_navigation_runs_success() {
        let history = History::new("a");
        let log = Log::default();
        let trigger = bind(&history, &log);

        trigger.fire(1);
        assert!(trigger.is_completed());
        assert_eq!(*log.lock(), vec!["success:1"]);
        assert_eq!(history.listener_count(), 0);
    }

    #[test]
    fn navigation_cancels_success() {
        let history = History::new("a");
        let log = Log::default();
        let trigger = bind(&history, &log);

        history.navigate("b");
        trigger.fire(1);
        assert_eq!(*log.lock(), vec!["failure:route_changed:false"]);
        assert_eq!(history.listener_count(), 0);
    }

    #[test]
    fn same_fragment_notification_is_ignored() {
        let history = History::new("a");
        let log = Log::default();
        let trigger = bind(&history, &log);

        history.navigate("a");
        assert!(!trigger.is_completed());
        trigger.fire(2);
        assert_eq!(*log.lock(), vec!["success:2"]);
    }

    #[test]
    fn double_fire_runs_once() {
        let history = History::new("a");
        let log = Log::default();
        let trigger = bind(&history, &log);
        let clone = trigger.clone();

        trigger.fire(1);
        clone.fire(2);
        history.navigate("b");
        assert_eq!(*log.lock(), vec!["success:1"]);
    }

    #[test]
    fn fail_reports_genuine_error() {
        let history = History::new("a");
        let log = Log::default();
        let trigger = bind(&history, &log);

        trigger.fail(FetchError::transport("500"));
        trigger.fire(1);
        assert_eq!(*log.lock(), vec!["failure:failed:true"]);
    }

    #[test]
    fn fail_after_navigation_is_not_an_error() {
        let history = History::new("a");
        let log = Log::default();
        let trigger = bind(&history, &log);

        history.navigate("b");
        trigger.fail(FetchError::Aborted);
        assert_eq!(*log.lock(), vec!["failure:route_changed:false"]);
    }

    #[test]
    fn dropped_trigger_unregisters_listener() {
        let history = History::new("a");
        let log = Log::default();
        drop(bind(&history, &log));
        assert_eq!(history.listener_count(), 0);

        history.navigate("b");
        assert!(log.lock().is_empty());
    }

    #[test]
    fn abandoned_guards_do_not_accumulate() {
        let history = History::new("a");
        for _ in 0..1000 {
            drop(bind_to_route(&history, |_: u32| {}, drop));
        }
        assert_eq!(history.listener_count(), 0);

        let kept = bind(&history, &Log::default());
        let clone = kept.clone();
        drop(kept);
        assert_eq!(history.listener_count(), 1, "a live clone keeps the guard armed");
        drop(clone);
        assert_eq!(history.listener_count(), 0);
    }
}
