//! # Transport abstraction and function-backed transport.
//!
//! This module defines the [`Transport`] trait (async, cancelable) and a convenient
//! function-backed implementation [`TransportFn`]. The common handle type is
//! [`TransportRef`], an `Arc<dyn Transport<T>>` shared by a data object and its queue.
//!
//! A transport receives a [`CancellationToken`]; the fetch queue also drops the
//! transport future when the request is aborted, so checking the token is only
//! needed for work that outlives the future (spawned I/O, retries).

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::FetchError;

/// # Asynchronous, cancelable data source.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use async_trait::async_trait;
/// use loadvisor::{FetchError, Transport};
///
/// struct Users;
///
/// #[async_trait]
/// impl Transport<Vec<String>> for Users {
///     fn name(&self) -> &str { "users" }
///
///     async fn fetch(&self, ctx: CancellationToken) -> Result<Vec<String>, FetchError> {
///         if ctx.is_cancelled() {
///             return Err(FetchError::Aborted);
///         }
///         Ok(vec!["ada".into()])
///     }
/// }
/// ```
#[async_trait]
pub trait Transport<T>: Send + Sync + 'static
where
    T: Send + 'static,
{
    /// Returns a stable, human-readable name (for logs).
    fn name(&self) -> &str;

    /// Performs one request.
    async fn fetch(&self, ctx: CancellationToken) -> Result<T, FetchError>;
}

/// Shared handle to a transport.
pub type TransportRef<T> = Arc<dyn Transport<T>>;

/// Function-backed transport.
///
/// Wraps a closure that *creates* a new future per request.
///
/// ## Example
/// ```rust
/// use tokio_util::sync::CancellationToken;
/// use loadvisor::{FetchError, TransportFn, TransportRef};
///
/// let t: TransportRef<u32> = TransportFn::arc("answer", |_ctx: CancellationToken| async {
///     Ok::<u32, FetchError>(42)
/// });
/// assert_eq!(t.name(), "answer");
/// ```
#[derive(Debug)]
pub struct TransportFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> TransportFn<F> {
    /// Creates a new function-backed transport.
    ///
    /// Prefer [`TransportFn::arc`] when you immediately need a [`TransportRef`].
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the transport and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<T, F, Fut> Transport<T> for TransportFn<F>
where
    T: Send + 'static,
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, ctx: CancellationToken) -> Result<T, FetchError> {
        (self.f)(ctx).await
    }
}
