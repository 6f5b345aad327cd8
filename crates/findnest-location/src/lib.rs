//! Location reconciliation for the FindNest listing form and search map.
//!
//! [`LocationReconciler`] owns the one authoritative [`LocationSelection`]
//! per form session and drives a [`findnest_map::MapSurface`]. Address edits
//! are coalesced by [`GeocodeDebouncer`]; every async response is tagged with
//! a [`Generation`] and dropped if it has been superseded.
//! [`LocationSession`] hosts a reconciler on a tokio task.
//!
//! [`LocationSelection`]: findnest_core::LocationSelection

pub mod config;
pub mod debounce;
pub mod error;
pub mod event;
pub mod generation;
pub mod notice;
pub mod reconciler;
pub mod services;
pub mod session;

#[cfg(test)]
mod fakes;

pub use config::ReconcilerConfig;
pub use debounce::{DebounceOutcome, GeocodeDebouncer};
pub use error::LocationError;
pub use event::{LocationEvent, Settled};
pub use generation::{Generation, GenerationCounter};
pub use notice::Notice;
pub use reconciler::{LocationReconciler, LocationSnapshot, ReconcilerState};
pub use services::LocationServices;
pub use session::{LocationSession, SessionInput, SessionSummary};
