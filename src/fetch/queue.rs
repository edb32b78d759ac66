//! # FetchQueue: one request in flight per object.
//!
//! [`FetchQueue`] de-duplicates concurrent fetch intents for the same object into a
//! single transport call (a queue **epoch**) and replays the result to every caller.
//!
//! ## Flow
//! ```text
//! fetch(opts, issue)
//!   ├─ opts.reset_queue        → discard the active epoch (its callers still get replayed)
//!   ├─ active epoch            → reset mode differs? Err(ConflictingReset)
//!   │                            else append callbacks, return joined handle
//!   └─ no active epoch         → new epoch [opts], issue(token) once, spawn:
//!
//!        request ──► Ok(v) / Err(e) / aborted / panicked
//!           ├─ detach epoch if it is still the active one
//!           ├─ success(v) | error(e) for every entry, in queue order
//!           ├─ complete() for every entry, in queue order
//!           └─ on_settled()
//! ```
//!
//! ## Rules
//! - Exactly one `issue` per epoch; every caller's callbacks run exactly once.
//! - A `reset_queue` during the request is never clobbered by the old epoch's cleanup:
//!   detaching is identity-checked.
//! - The epoch is detached before replay, so a callback that fetches again starts a
//!   new epoch rather than joining one that is about to be discarded.
//! - Callbacks run on the completion task, panic-isolated.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::error::{FetchError, guarded, panic_info};

static EPOCH_SEQ: AtomicU64 = AtomicU64::new(1);

pub(crate) type SuccessFn<T> = Box<dyn FnOnce(&T) + Send>;
pub(crate) type ErrorFn = Box<dyn FnOnce(&FetchError) + Send>;
type CompleteFn = Box<dyn FnOnce() + Send>;

/// Callbacks and flags of one fetch call.
///
/// ## Example
/// ```rust
/// use loadvisor::FetchOptions;
///
/// let opts = FetchOptions::<u32>::new()
///     .on_success(|v| println!("got {v}"))
///     .on_error(|e| eprintln!("failed: {e}"))
///     .background(true);
/// assert!(opts.is_background());
/// ```
pub struct FetchOptions<T> {
    success: Option<SuccessFn<T>>,
    error: Option<ErrorFn>,
    complete: Option<CompleteFn>,
    reset_queue: bool,
    reset: bool,
    background: bool,
}

impl<T> Default for FetchOptions<T> {
    fn default() -> Self {
        Self {
            success: None,
            error: None,
            complete: None,
            reset_queue: false,
            reset: false,
            background: false,
        }
    }
}

impl<T> FetchOptions<T> {
    /// Options with no callbacks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with the fetched value.
    pub fn on_success(mut self, f: impl FnOnce(&T) + Send + 'static) -> Self {
        self.success = Some(Box::new(f));
        self
    }

    /// Called when the request fails or is aborted.
    pub fn on_error(mut self, f: impl FnOnce(&FetchError) + Send + 'static) -> Self {
        self.error = Some(Box::new(f));
        self
    }

    /// Called after success or error.
    pub fn on_complete(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.complete = Some(Box::new(f));
        self
    }

    /// Discards any active queue before fetching.
    ///
    /// The discarded request still completes and replays to its own callers; the
    /// caller must protect itself against that out-of-band data.
    pub fn reset_queue(mut self) -> Self {
        self.reset_queue = true;
        self
    }

    /// Marks the fetch as a "reset" (replace contents) rather than a "set" (merge).
    pub fn reset(mut self, reset: bool) -> Self {
        self.reset = reset;
        self
    }

    /// Marks the load as background (kept out of global indicators).
    pub fn background(mut self, background: bool) -> Self {
        self.background = background;
        self
    }

    /// True for background loads.
    pub fn is_background(&self) -> bool {
        self.background
    }

    /// True for "reset" fetches.
    pub fn is_reset(&self) -> bool {
        self.reset
    }

    /// Wraps the success callback.
    pub(crate) fn map_success<F>(mut self, wrap: F) -> Self
    where
        F: FnOnce(Option<SuccessFn<T>>) -> Option<SuccessFn<T>>,
    {
        self.success = wrap(self.success.take());
        self
    }

    /// Wraps the error callback.
    pub(crate) fn map_error<F>(mut self, wrap: F) -> Self
    where
        F: FnOnce(Option<ErrorFn>) -> Option<ErrorFn>,
    {
        self.error = wrap(self.error.take());
        self
    }
}

/// The request issued for a new epoch.
pub struct Issue<T> {
    request: BoxFuture<'static, Result<T, FetchError>>,
    on_settled: Option<CompleteFn>,
}

impl<T> Issue<T> {
    /// Wraps the transport future.
    pub fn new<Fut>(request: Fut) -> Self
    where
        Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
    {
        Self {
            request: Box::pin(request),
            on_settled: None,
        }
    }

    /// Runs `f` after every queued `complete` callback of the epoch.
    pub fn on_settled(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_settled = Some(Box::new(f));
        self
    }
}

struct Entry<T> {
    success: Option<SuccessFn<T>>,
    error: Option<ErrorFn>,
    complete: Option<CompleteFn>,
}

struct Epoch<T> {
    id: u64,
    reset: bool,
    token: CancellationToken,
    entries: Mutex<Vec<Entry<T>>>,
}

/// Handle to the request serving one fetch call.
#[derive(Clone, Debug)]
pub struct RequestHandle {
    epoch: u64,
    joined: bool,
    token: CancellationToken,
}

impl RequestHandle {
    /// Aborts the in-flight request.
    ///
    /// Every caller queued on it receives [`FetchError::Aborted`], then `complete`.
    /// No-op once the request settled.
    pub fn abort(&self) {
        self.token.cancel();
    }

    /// True once `abort` was called on any handle of this epoch.
    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }

    /// True if this call joined a request that was already in flight.
    pub fn is_joined(&self) -> bool {
        self.joined
    }

    /// Identity of the queue epoch.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// Per-object pending-fetch queue.
pub struct FetchQueue<T> {
    active: Arc<Mutex<Option<Arc<Epoch<T>>>>>,
}

impl<T> Default for FetchQueue<T> {
    fn default() -> Self {
        Self {
            active: Arc::new(Mutex::new(None)),
        }
    }
}

impl<T> FetchQueue<T>
where
    T: Send + 'static,
{
    /// Creates an idle queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a request is outstanding.
    pub fn is_active(&self) -> bool {
        self.active.lock().is_some()
    }

    /// Number of callers queued on the outstanding request.
    pub fn queued(&self) -> usize {
        self.active
            .lock()
            .as_ref()
            .map_or(0, |epoch| epoch.entries.lock().len())
    }

    /// Forgets the outstanding request; the next fetch issues a new one.
    pub fn reset(&self) {
        if let Some(old) = self.active.lock().take() {
            debug!(epoch = old.id, "fetch queue reset");
        }
    }

    /// Queues a fetch, issuing a request only if none is outstanding.
    ///
    /// `issue` is called at most once, outside the queue lock, with the epoch's
    /// cancellation token. Must be called from within a Tokio runtime when it issues.
    ///
    /// # Errors
    /// [`FetchError::ConflictingReset`] if a request is outstanding with a different
    /// [`FetchOptions::reset`] mode; nothing is queued in that case.
    pub fn fetch<I>(&self, options: FetchOptions<T>, issue: I) -> Result<RequestHandle, FetchError>
    where
        I: FnOnce(CancellationToken) -> Issue<T>,
    {
        let FetchOptions {
            success,
            error,
            complete,
            reset_queue,
            reset,
            ..
        } = options;
        let entry = Entry {
            success,
            error,
            complete,
        };

        let epoch = {
            let mut active = self.active.lock();
            if reset_queue {
                if let Some(old) = active.take() {
                    debug!(epoch = old.id, "fetch queue reset by caller");
                }
            } else if let Some(epoch) = active.as_ref() {
                if epoch.reset != reset {
                    return Err(FetchError::ConflictingReset);
                }
                epoch.entries.lock().push(entry);
                trace!(epoch = epoch.id, "fetch joined outstanding request");
                return Ok(RequestHandle {
                    epoch: epoch.id,
                    joined: true,
                    token: epoch.token.clone(),
                });
            }

            let epoch = Arc::new(Epoch {
                id: EPOCH_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
                reset,
                token: CancellationToken::new(),
                entries: Mutex::new(vec![entry]),
            });
            *active = Some(Arc::clone(&epoch));
            epoch
        };

        debug!(epoch = epoch.id, "fetch issued");
        let handle = RequestHandle {
            epoch: epoch.id,
            joined: false,
            token: epoch.token.clone(),
        };
        let Issue {
            request,
            on_settled,
        } = issue(epoch.token.clone());

        let active = Arc::clone(&self.active);
        tokio::spawn(async move {
            let outcome = tokio::select! {
                biased;
                _ = epoch.token.cancelled() => Err(FetchError::Aborted),
                res = AssertUnwindSafe(request).catch_unwind() => match res {
                    Ok(res) => res,
                    Err(panic) => Err(FetchError::Panicked { info: panic_info(panic.as_ref()) }),
                },
            };
            settle(&active, &epoch, outcome);
            if let Some(f) = on_settled {
                guarded("fetch settled", f);
            }
        });

        Ok(handle)
    }
}

/// Detaches `epoch` if still active, then replays `outcome` to its callers.
fn settle<T>(
    active: &Mutex<Option<Arc<Epoch<T>>>>,
    epoch: &Arc<Epoch<T>>,
    outcome: Result<T, FetchError>,
) {
    {
        let mut active = active.lock();
        if active.as_ref().is_some_and(|a| Arc::ptr_eq(a, epoch)) {
            *active = None;
        }
    }

    let entries = std::mem::take(&mut *epoch.entries.lock());
    match &outcome {
        Ok(_) => debug!(epoch = epoch.id, callers = entries.len(), "fetch succeeded"),
        Err(e) => debug!(epoch = epoch.id, callers = entries.len(), error = e.as_label(), "fetch failed"),
    }

    let mut completes = Vec::with_capacity(entries.len());
    for entry in entries {
        match &outcome {
            Ok(value) => {
                if let Some(f) = entry.success {
                    guarded("fetch success", || f(value));
                }
            }
            Err(err) => {
                if let Some(f) = entry.error {
                    guarded("fetch error", || f(err));
                }
            }
        }
        completes.push(entry.complete);
    }
    for f in completes.into_iter().flatten() {
        guarded("fetch complete", f);
    }
}
