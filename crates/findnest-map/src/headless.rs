//! In-memory [`MapBackend`] that records every call.
//!
//! Used by the CLI session replay and by tests. It behaves like a vector-map
//! library in the ways the surface depends on: adding an existing source or
//! layer is an error the surface must avoid, and a style load wipes overlays.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use findnest_core::{Coordinates, FeatureCollection, MarkerState};
use findnest_geo::StyleDocument;

use crate::backend::{LayerSpec, MapBackend};
use crate::error::MapError;

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    LoadStyle(String),
    AddSource(String),
    SetSourceData(String),
    AddLayer(String),
    PlaceMarker(MarkerState),
    RemoveMarker,
    FlyTo(Coordinates),
    Dispose,
}

#[derive(Debug, Default)]
struct HeadlessState {
    calls: Vec<BackendCall>,
    style: Option<String>,
    sources: BTreeMap<String, FeatureCollection>,
    layers: Vec<LayerSpec>,
    marker: Option<MarkerState>,
    camera: Option<(Coordinates, f64)>,
    /// Adds of an already-present source or layer.
    duplicate_adds: usize,
    disposed: bool,
}

pub struct HeadlessMap {
    state: Arc<Mutex<HeadlessState>>,
    rejected_styles: Vec<String>,
}

impl Default for HeadlessMap {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessMap {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(HeadlessState::default())),
            rejected_styles: Vec::new(),
        }
    }

    /// Makes `load_style` fail for the named style.
    #[must_use]
    pub fn rejecting_style(mut self, name: &str) -> Self {
        self.rejected_styles.push(name.to_owned());
        self
    }

    /// Read handle that stays valid after the backend is boxed into a surface.
    #[must_use]
    pub fn probe(&self) -> HeadlessProbe {
        HeadlessProbe {
            state: Arc::clone(&self.state),
        }
    }

    fn state(&self) -> MutexGuard<'_, HeadlessState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MapBackend for HeadlessMap {
    fn load_style(
        &mut self,
        style: &StyleDocument,
        center: Coordinates,
        zoom: f64,
    ) -> Result<(), MapError> {
        if self.rejected_styles.iter().any(|s| *s == style.name) {
            return Err(MapError::StyleRejected {
                style: style.name.clone(),
                reason: "rejected by headless backend".to_owned(),
            });
        }
        let mut state = self.state();
        state.calls.push(BackendCall::LoadStyle(style.name.clone()));
        state.style = Some(style.name.clone());
        state.sources.clear();
        state.layers.clear();
        state.marker = None;
        state.camera = Some((center, zoom));
        Ok(())
    }

    fn has_source(&self, source_id: &str) -> bool {
        self.state().sources.contains_key(source_id)
    }

    fn add_source(&mut self, source_id: &str, data: &FeatureCollection) {
        let mut state = self.state();
        state.calls.push(BackendCall::AddSource(source_id.to_owned()));
        if state.sources.contains_key(source_id) {
            state.duplicate_adds += 1;
        }
        state.sources.insert(source_id.to_owned(), data.clone());
    }

    fn set_source_data(&mut self, source_id: &str, data: &FeatureCollection) {
        let mut state = self.state();
        state
            .calls
            .push(BackendCall::SetSourceData(source_id.to_owned()));
        if let Some(existing) = state.sources.get_mut(source_id) {
            existing.clone_from(data);
        }
    }

    fn add_layer(&mut self, layer: &LayerSpec) {
        let mut state = self.state();
        state.calls.push(BackendCall::AddLayer(layer.id.clone()));
        if state.layers.iter().any(|l| l.id == layer.id) {
            state.duplicate_adds += 1;
        }
        state.layers.push(layer.clone());
    }

    fn place_marker(&mut self, marker: &MarkerState) {
        let mut state = self.state();
        state.calls.push(BackendCall::PlaceMarker(*marker));
        state.marker = Some(*marker);
    }

    fn remove_marker(&mut self) {
        let mut state = self.state();
        state.calls.push(BackendCall::RemoveMarker);
        state.marker = None;
    }

    fn fly_to(&mut self, center: Coordinates, zoom: f64) {
        let mut state = self.state();
        state.calls.push(BackendCall::FlyTo(center));
        state.camera = Some((center, zoom));
    }

    fn dispose(&mut self) {
        let mut state = self.state();
        state.calls.push(BackendCall::Dispose);
        state.sources.clear();
        state.layers.clear();
        state.marker = None;
        state.disposed = true;
    }
}

/// Shared read access to a [`HeadlessMap`]'s recorded state.
#[derive(Clone)]
pub struct HeadlessProbe {
    state: Arc<Mutex<HeadlessState>>,
}

impl HeadlessProbe {
    fn state(&self) -> MutexGuard<'_, HeadlessState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn calls(&self) -> Vec<BackendCall> {
        self.state().calls.clone()
    }

    #[must_use]
    pub fn style_name(&self) -> Option<String> {
        self.state().style.clone()
    }

    #[must_use]
    pub fn source(&self, source_id: &str) -> Option<FeatureCollection> {
        self.state().sources.get(source_id).cloned()
    }

    #[must_use]
    pub fn layer_ids(&self) -> Vec<String> {
        self.state().layers.iter().map(|l| l.id.clone()).collect()
    }

    #[must_use]
    pub fn marker(&self) -> Option<MarkerState> {
        self.state().marker
    }

    #[must_use]
    pub fn camera(&self) -> Option<(Coordinates, f64)> {
        self.state().camera
    }

    #[must_use]
    pub fn duplicate_adds(&self) -> usize {
        self.state().duplicate_adds
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.state().disposed
    }

    /// Number of recorded calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&BackendCall) -> bool) -> usize {
        self.state().calls.iter().filter(|c| pred(c)).count()
    }
}
