//! Route: navigation state and the route-cancellation guard.
//!
//! ## Contents
//! - [`History`] current fragment + route notifications
//! - [`bind_to_route`], [`RouteTrigger`], [`Abandoned`] at-most-once success path
//!   that navigation cancels

mod guard;
mod history;

pub use guard::{Abandoned, RouteTrigger, bind_to_route};
pub use history::History;
