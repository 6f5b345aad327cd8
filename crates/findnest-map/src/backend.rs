//! The rendering library seam.

use findnest_core::{Coordinates, FeatureCollection, MarkerState};
use findnest_geo::StyleDocument;

use crate::error::MapError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Circle,
    Line,
}

/// A rendering rule bound to one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSpec {
    pub id: String,
    pub source_id: String,
    pub kind: LayerKind,
}

impl LayerSpec {
    /// One layer per source, named `<source>-layer`.
    #[must_use]
    pub fn for_source(source_id: &str, kind: LayerKind) -> Self {
        Self {
            id: format!("{source_id}-layer"),
            source_id: source_id.to_owned(),
            kind,
        }
    }
}

/// Operations the surface needs from a vector-map library.
///
/// Implementations are driven from a single task and are not required to be
/// idempotent; [`crate::MapSurface`] handles existence checks and ordering.
pub trait MapBackend: Send {
    /// Creates the map (or swaps its style). A style swap drops every source,
    /// layer and marker.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::StyleRejected`] if the style cannot be applied.
    fn load_style(
        &mut self,
        style: &StyleDocument,
        center: Coordinates,
        zoom: f64,
    ) -> Result<(), MapError>;

    fn has_source(&self, source_id: &str) -> bool;

    fn add_source(&mut self, source_id: &str, data: &FeatureCollection);

    fn set_source_data(&mut self, source_id: &str, data: &FeatureCollection);

    fn add_layer(&mut self, layer: &LayerSpec);

    fn place_marker(&mut self, marker: &MarkerState);

    fn remove_marker(&mut self);

    fn fly_to(&mut self, center: Coordinates, zoom: f64);

    fn dispose(&mut self);
}
