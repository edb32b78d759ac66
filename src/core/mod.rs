//! Application wiring: the root, views and data objects.
//!
//! ## Contents
//! - [`App`], [`AppBuilder`] explicit application root (global scope + history)
//! - [`DataObject`] fetchable value: queue + transport + loadable
//! - [`View`] loadable with a visible loading state
//!
//! ## Ownership
//! ```text
//! App ──owns──► root Loadable ◄──weak── View observers
//!  │                 ▲
//!  └──► History ◄────┼──── DataObject (route guard, forward once)
//! ```

mod app;
mod builder;
mod data;
mod view;

pub use app::App;
pub use builder::AppBuilder;
pub use data::DataObject;
pub use view::View;
