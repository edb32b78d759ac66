//! # Cancellable scheduled callbacks.
//!
//! [`Timer`] is the debounce primitive behind [`LoadHandler`](crate::LoadHandler):
//! it spawns a task on the current Tokio runtime that sleeps for `delay` and
//! then runs the action, unless cancelled first.
//!
//! ## Rules
//! - `cancel()` is idempotent; cancelling a fired or cancelled timer is a no-op.
//! - Dropping a timer cancels it.
//! - Each armed timer has a unique [`TimerId`]. The action receives it so the owner can
//!   check, under its own lock, that the timer is still the one it armed. A fired
//!   timer that lost a race with a superseding state change must do nothing.
//!
//! Arming requires a Tokio runtime context (it calls `tokio::spawn`).

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

static TIMER_SEQ: AtomicU64 = AtomicU64::new(1);

/// Identity of one armed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// Handle to an armed timer.
#[derive(Debug)]
pub struct Timer {
    id: TimerId,
    token: CancellationToken,
}

impl Timer {
    /// Arms a timer that runs `action` after `delay`.
    pub fn arm<F>(delay: Duration, action: F) -> Self
    where
        F: FnOnce(TimerId) + Send + 'static,
    {
        let id = TimerId(TIMER_SEQ.fetch_add(1, AtomicOrdering::Relaxed));
        let token = CancellationToken::new();
        let cancelled = token.clone();

        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = cancelled.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    if !cancelled.is_cancelled() {
                        action(id);
                    }
                }
            }
        });

        Self { id, token }
    }

    /// Returns the timer identity.
    #[inline]
    pub fn id(&self) -> TimerId {
        self.id
    }

    /// Cancels the timer (idempotent).
    #[inline]
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// True once the timer has been cancelled.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
