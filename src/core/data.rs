//! # DataObject: a fetchable, loadable value.
//!
//! Stand-in for a model or collection: it owns a [`Loadable`], a [`FetchQueue`], a
//! [`Transport`](crate::Transport) and the last fetched value.
//!
//! ## fetch
//! ```text
//! fetch(opts) ──► queue
//!   ├─ joins epoch  → callbacks queued, nothing announced
//!   └─ new epoch    → load_start(None, bg) ─► transport ─► store value
//!                       ─► replay callbacks ─► load_end()
//! ```
//!
//! ## load
//! ```text
//! load(success, failure, opts)
//!   ├─ populated          → success(value) on a spawned task
//!   └─ not populated
//!        ├─ !bg && root   → forward this load's LoadStart to root (once)
//!        ├─ !bg && joined → announce a blocking LoadStart on the object
//!        ├─ success       → bind_to_route(history, success, failure)
//!        ├─ route change  → abort request, failure(RouteChanged)
//!        └─ error         → failure(Failed(e)) unless route changed
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::{
    error::{FetchError, guarded},
    fetch::{ErrorFn, FetchOptions, FetchQueue, Issue, RequestHandle, SuccessFn, TransportRef},
    loading::{Loadable, forward_events},
    route::{Abandoned, History, bind_to_route},
};

/// A value fetched through a de-duplicating queue.
pub struct DataObject<T>
where
    T: Send + Sync + 'static,
{
    loadable: Arc<Loadable>,
    queue: FetchQueue<Arc<T>>,
    transport: TransportRef<T>,
    data: Arc<RwLock<Option<Arc<T>>>>,
    history: Arc<History>,
    root: Option<Arc<Loadable>>,
}

impl<T> DataObject<T>
where
    T: Send + Sync + 'static,
{
    /// Creates a standalone data object (no application root).
    pub fn new(label: impl Into<Arc<str>>, transport: TransportRef<T>, history: &Arc<History>) -> Arc<Self> {
        Arc::new(Self::build(label, transport, history, None))
    }

    pub(super) fn with_root(
        label: impl Into<Arc<str>>,
        transport: TransportRef<T>,
        history: &Arc<History>,
        root: &Arc<Loadable>,
    ) -> Arc<Self> {
        Arc::new(Self::build(label, transport, history, Some(Arc::clone(root))))
    }

    fn build(
        label: impl Into<Arc<str>>,
        transport: TransportRef<T>,
        history: &Arc<History>,
        root: Option<Arc<Loadable>>,
    ) -> Self {
        Self {
            loadable: Loadable::new(label),
            queue: FetchQueue::new(),
            transport,
            data: Arc::new(RwLock::new(None)),
            history: Arc::clone(history),
            root,
        }
    }

    /// The object's loadable capability.
    pub fn loadable(&self) -> &Arc<Loadable> {
        &self.loadable
    }

    /// The object's fetch queue.
    pub fn queue(&self) -> &FetchQueue<Arc<T>> {
        &self.queue
    }

    /// `true` once a fetch succeeded.
    pub fn is_populated(&self) -> bool {
        self.data.read().is_some()
    }

    /// The last fetched value.
    pub fn data(&self) -> Option<Arc<T>> {
        self.data.read().clone()
    }

    /// Forgets the fetched value.
    pub fn clear(&self) {
        *self.data.write() = None;
    }

    /// Fetches through the queue.
    ///
    /// A new epoch announces `LoadStart` on this object before the transport runs
    /// and `LoadEnd` after every queued `complete`. The fetched value is stored
    /// before any success callback runs; "set" and "reset" fetches both replace it.
    ///
    /// # Errors
    /// [`FetchError::ConflictingReset`], see [`FetchQueue::fetch`].
    pub fn fetch(&self, options: FetchOptions<Arc<T>>) -> Result<RequestHandle, FetchError> {
        let background = options.is_background();
        let loadable = Arc::clone(&self.loadable);
        let transport = Arc::clone(&self.transport);
        let data = Arc::clone(&self.data);

        self.queue.fetch(options, move |token| {
            debug!(object = loadable.label(), transport = transport.name(), background, "fetching");
            loadable.load_start(None, background);

            let end = Arc::clone(&loadable);
            Issue::new(async move {
                let value = Arc::new(transport.fetch(token).await?);
                *data.write() = Some(Arc::clone(&value));
                Ok(value)
            })
            .on_settled(move || end.load_end())
        })
    }

    /// Ensures the value is loaded, then runs `success` unless navigation happened first.
    ///
    /// Returns the request handle when a fetch was issued or joined.
    pub fn load<S, F>(&self, success: S, failure: F, options: FetchOptions<Arc<T>>) -> Option<RequestHandle>
    where
        S: FnOnce(Arc<T>) + Send + 'static,
        F: FnOnce(Abandoned) + Send + 'static,
    {
        if let Some(value) = self.data() {
            tokio::spawn(async move {
                guarded("load success", || success(value));
            });
            return None;
        }

        let background = options.is_background();
        let forwarding = match &self.root {
            Some(root) if !background => Some(forward_events(&self.loadable, root, true)),
            _ => None,
        };

        let request: Arc<Mutex<Option<RequestHandle>>> = Arc::default();
        let slot = Arc::clone(&request);
        let trigger = bind_to_route(&self.history, success, move |why: Abandoned| {
            if why == Abandoned::RouteChanged {
                if let Some(handle) = slot.lock().take() {
                    handle.abort();
                }
            }
            failure(why);
        });

        let (on_ok, on_err) = (trigger.clone(), trigger.clone());
        let options = options
            .map_success(|prev| {
                let wrapped: SuccessFn<Arc<T>> = Box::new(move |value: &Arc<T>| {
                    if let Some(prev) = prev {
                        prev(value);
                    }
                    on_ok.fire(Arc::clone(value));
                });
                Some(wrapped)
            })
            .map_error(|prev| {
                let wrapped: ErrorFn = Box::new(move |err: &FetchError| {
                    if let Some(prev) = prev {
                        prev(err);
                    }
                    on_err.fail(err.clone());
                });
                Some(wrapped)
            });

        let result = self.fetch(options);
        if let Ok(handle) = &result {
            if handle.is_joined() && !background {
                // A joined epoch announces nothing; surface this blocking load.
                self.loadable.load_start(None, false);
            }
        }
        if let Some(forwarding) = forwarding {
            forwarding.off();
        }

        match result {
            Ok(handle) => {
                if !trigger.is_completed() {
                    *request.lock() = Some(handle.clone());
                }
                Some(handle)
            }
            Err(err) => {
                warn!(object = self.loadable.label(), error = err.as_label(), "load rejected");
                trigger.fail(err);
                None
            }
        }
    }
}

impl<T> fmt::Debug for DataObject<T>
where
    T: Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataObject")
            .field("loadable", &self.loadable)
            .field("transport", &self.transport.name())
            .field("populated", &self.data.read().is_some())
            .finish()
    }
}
