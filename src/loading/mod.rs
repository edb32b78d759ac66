//! Loading: episodes, debounce and propagation.
//!
//! This module implements the load coordinator proper. A [`Loadable`] announces
//! loads, a [`LoadHandler`] attached to an object aggregates them into debounced
//! episodes reported to a [`LoadObserver`], and [`forward_events`] bubbles starts
//! from one object to another.
//!
//! ## Contents
//! - [`Loadable`] identity + emitter + `load_start` / `load_end`
//! - [`LoadHandler`] debounced start/end aggregator
//! - [`LoadObserver`], [`LoadFn`] extension point and closure adapter
//! - [`Timer`] cancellable scheduled callback
//! - [`forward_events`], [`Forwarding`] propagation and its disposer

mod forward;
mod handler;
mod loadable;
#[cfg(feature = "logging")]
mod log;
mod observer;
mod timer;

pub use forward::{Forwarding, forward_events};
pub use handler::LoadHandler;
pub use loadable::Loadable;
#[cfg(feature = "logging")]
pub use log::LogObserver;
pub use observer::{LoadFn, LoadObserver};
pub use timer::{Timer, TimerId};
