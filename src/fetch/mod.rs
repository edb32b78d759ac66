//! Fetch: transports and request de-duplication.
//!
//! A data object owns one [`FetchQueue`] and one [`Transport`]. Every call to
//! fetch goes through the queue, which issues at most one transport request per
//! epoch and replays its outcome to all queued callers.
//!
//! ## Contents
//! - [`Transport`], [`TransportFn`], [`TransportRef`] async data source
//! - [`FetchQueue`], [`FetchOptions`], [`Issue`] de-duplicating queue
//! - [`RequestHandle`] abort handle shared by the callers of one epoch

mod queue;
mod transport;

pub(crate) use queue::{ErrorFn, SuccessFn};
pub use queue::{FetchOptions, FetchQueue, Issue, RequestHandle};
pub use transport::{Transport, TransportFn, TransportRef};
