//! Map viewport ownership for the FindNest location core.
//!
//! [`MapSurface`] owns one map instance through the [`MapBackend`] seam and
//! exposes idempotent overlay operations. Overlay writes issued before the
//! map is ready are queued and replayed once, in order, when it becomes
//! ready through either the load event or the ready timeout.

pub mod backend;
pub mod error;
pub mod headless;
pub mod surface;

pub use backend::{LayerKind, LayerSpec, MapBackend};
pub use error::MapError;
pub use headless::{BackendCall, HeadlessMap, HeadlessProbe};
pub use surface::{MapEvent, MapHandle, MapLifecycle, MapSurface, ReadyVia, StyleEpoch};

/// Source id used for the AI search result overlay.
pub const SEARCH_RESULTS_SOURCE: &str = "search-results";
/// Source id used for the route overlay.
pub const ROUTE_SOURCE: &str = "route";
