//! Map lifecycle and overlay state machine.
//!
//! ```text
//! Uninitialized --initialize--> Loading --load event | ready timeout--> Ready
//!       any state --destroy--> Destroyed (terminal)
//!       Ready --reload_style--> Loading
//! ```
//!
//! Overlay writes (`upsert_*_source`, `set_marker`, `clear_marker`) made
//! before `Ready` are queued and replayed exactly once, in submission order,
//! by the single `enter_ready` path regardless of how `Ready` was reached.

use std::collections::VecDeque;
use std::time::Duration;

use findnest_core::{Coordinates, FeatureCollection, MarkerState};
use findnest_geo::{fallback_raster_style, StyleDocument, StyleOrigin, StyleProvider};
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::backend::{LayerKind, LayerSpec, MapBackend};
use crate::error::MapError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MapHandle(Uuid);

impl std::fmt::Display for MapHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "map-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapLifecycle {
    Uninitialized,
    Loading,
    Ready,
    Destroyed,
}

/// Identifies one style load. Advanced by `initialize` and `reload_style`,
/// so a load event can be matched to the style it belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct StyleEpoch(u64);

impl std::fmt::Display for StyleEpoch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "style#{}", self.0)
    }
}

/// How the surface reached `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyVia {
    LoadEvent,
    /// The load event never arrived in time; overlays were applied anyway.
    Timeout,
}

/// User input on the map, forwarded to the reconciler as map picks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapEvent {
    Clicked(Coordinates),
    MarkerDragged(Coordinates),
}

#[derive(Debug, Clone)]
enum OverlayOp {
    UpsertSource {
        source_id: String,
        kind: LayerKind,
        data: FeatureCollection,
    },
    SetMarker(MarkerState),
    ClearMarker,
}

pub struct MapSurface {
    handle: MapHandle,
    lifecycle: MapLifecycle,
    ready_via: Option<ReadyVia>,
    style_origin: Option<StyleOrigin>,
    style_epoch: StyleEpoch,
    backend: Box<dyn MapBackend>,
    pending: VecDeque<OverlayOp>,
    /// Latest data per source, in first-submission order; replayed after a
    /// style reload.
    retained: Vec<(String, LayerKind, FeatureCollection)>,
    marker: Option<MarkerState>,
    camera: Option<(Coordinates, f64)>,
    events: Option<mpsc::UnboundedSender<MapEvent>>,
}

impl MapSurface {
    #[must_use]
    pub fn new(backend: Box<dyn MapBackend>) -> Self {
        Self {
            handle: MapHandle(Uuid::new_v4()),
            lifecycle: MapLifecycle::Uninitialized,
            ready_via: None,
            style_origin: None,
            style_epoch: StyleEpoch::default(),
            backend,
            pending: VecDeque::new(),
            retained: Vec::new(),
            marker: None,
            camera: None,
            events: None,
        }
    }

    #[must_use]
    pub fn handle(&self) -> MapHandle {
        self.handle
    }

    #[must_use]
    pub fn lifecycle(&self) -> MapLifecycle {
        self.lifecycle
    }

    #[must_use]
    pub fn ready_via(&self) -> Option<ReadyVia> {
        self.ready_via
    }

    #[must_use]
    pub fn style_origin(&self) -> Option<StyleOrigin> {
        self.style_origin
    }

    /// The style load currently in progress or last completed.
    #[must_use]
    pub fn style_epoch(&self) -> StyleEpoch {
        self.style_epoch
    }

    #[must_use]
    pub fn marker(&self) -> Option<MarkerState> {
        self.marker
    }

    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Creates the map with `style`. `Uninitialized -> Loading`.
    ///
    /// On failure the surface stays `Uninitialized` so the caller can retry
    /// with another style.
    ///
    /// # Errors
    ///
    /// - [`MapError::Init`] if the backend rejects the style.
    /// - [`MapError::AlreadyInitialized`] / [`MapError::Destroyed`] outside `Uninitialized`.
    pub fn initialize(
        &mut self,
        style: &StyleDocument,
        center: Coordinates,
        zoom: f64,
    ) -> Result<MapHandle, MapError> {
        match self.lifecycle {
            MapLifecycle::Uninitialized => {}
            MapLifecycle::Destroyed => return Err(MapError::Destroyed),
            MapLifecycle::Loading | MapLifecycle::Ready => {
                return Err(MapError::AlreadyInitialized)
            }
        }
        self.backend
            .load_style(style, center, zoom)
            .map_err(|e| MapError::Init {
                reason: e.to_string(),
            })?;
        self.camera = Some((center, zoom));
        self.lifecycle = MapLifecycle::Loading;
        self.style_epoch = StyleEpoch(self.style_epoch.0 + 1);
        tracing::debug!(
            map = %self.handle,
            style = %style.name,
            epoch = %self.style_epoch,
            "map loading"
        );
        Ok(self.handle)
    }

    /// Fetches the style from `provider` and initializes with it, falling
    /// back to the baked-in raster style if the fetch fails or the backend
    /// rejects the remote style.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Init`] only if the fallback style fails as well.
    pub async fn open(
        &mut self,
        provider: &dyn StyleProvider,
        center: Coordinates,
        zoom: f64,
    ) -> Result<MapHandle, MapError> {
        match provider.style_descriptor().await {
            Ok(style) => match self.initialize(&style, center, zoom) {
                Ok(handle) => {
                    self.style_origin = Some(StyleOrigin::Remote);
                    return Ok(handle);
                }
                Err(MapError::Init { reason }) => {
                    tracing::warn!(
                        map = %self.handle,
                        style = %style.name,
                        reason = %reason,
                        "remote style rejected, using fallback raster style"
                    );
                }
                Err(other) => return Err(other),
            },
            Err(e) => {
                tracing::warn!(
                    map = %self.handle,
                    error = %e,
                    "style provider failed, using fallback raster style"
                );
            }
        }

        let fallback = fallback_raster_style();
        match self.initialize(&fallback, center, zoom) {
            Ok(handle) => {
                self.style_origin = Some(StyleOrigin::Fallback);
                Ok(handle)
            }
            Err(e) => {
                tracing::error!(map = %self.handle, error = %e, "fallback style failed");
                Err(e)
            }
        }
    }

    /// Load event tagged with the style it was raised for. Events for a
    /// style that has since been replaced are ignored; returns whether the
    /// event was accepted.
    pub fn on_style_loaded(&mut self, epoch: StyleEpoch) -> bool {
        if epoch != self.style_epoch {
            tracing::debug!(
                map = %self.handle,
                %epoch,
                current = %self.style_epoch,
                "load event for superseded style ignored"
            );
            return false;
        }
        self.on_load();
        true
    }

    /// The backend's load event for the current style. `Loading -> Ready`.
    pub fn on_load(&mut self) {
        match self.lifecycle {
            MapLifecycle::Loading => self.enter_ready(ReadyVia::LoadEvent),
            MapLifecycle::Ready => {
                tracing::debug!(map = %self.handle, "late load event after degraded ready");
            }
            MapLifecycle::Uninitialized | MapLifecycle::Destroyed => {}
        }
    }

    /// The ready timeout elapsed without a load event. Proceeds in degraded
    /// mode: overlays are applied as if the map were ready.
    pub fn on_ready_timeout(&mut self) {
        if self.lifecycle == MapLifecycle::Loading {
            tracing::warn!(
                map = %self.handle,
                queued = self.pending.len(),
                "map load event not received in time, applying overlays in degraded mode"
            );
            self.enter_ready(ReadyVia::Timeout);
        }
    }

    /// Waits for the load signal, bounded by `timeout`.
    ///
    /// A dropped sender means the load event can no longer arrive and is
    /// treated like an elapsed timeout.
    pub async fn wait_until_ready(
        &mut self,
        loaded: oneshot::Receiver<()>,
        timeout: Duration,
    ) -> MapLifecycle {
        if self.lifecycle != MapLifecycle::Loading {
            return self.lifecycle;
        }
        match tokio::time::timeout(timeout, loaded).await {
            Ok(Ok(())) => self.on_load(),
            Ok(Err(_)) | Err(_) => self.on_ready_timeout(),
        }
        self.lifecycle
    }

    fn enter_ready(&mut self, via: ReadyVia) {
        self.lifecycle = MapLifecycle::Ready;
        self.ready_via = Some(via);
        let queued = self.pending.len();
        while let Some(op) = self.pending.pop_front() {
            self.apply(op);
        }
        tracing::debug!(map = %self.handle, ?via, replayed = queued, "map ready");
    }

    /// Creates the point source and its circle layer on first call; later
    /// calls replace the data only.
    pub fn upsert_point_source(&mut self, source_id: &str, features: FeatureCollection) {
        self.submit_source(source_id, LayerKind::Circle, features);
    }

    /// Line-layer variant of [`MapSurface::upsert_point_source`], for routes.
    pub fn upsert_line_source(&mut self, source_id: &str, features: FeatureCollection) {
        self.submit_source(source_id, LayerKind::Line, features);
    }

    /// Replaces the single marker. Drag events are forwarded only for a
    /// draggable marker.
    pub fn set_marker(&mut self, coordinates: Coordinates, draggable: bool) {
        if self.lifecycle == MapLifecycle::Destroyed {
            return;
        }
        let marker = MarkerState {
            coordinates,
            draggable,
        };
        self.marker = Some(marker);
        self.submit(OverlayOp::SetMarker(marker));
    }

    pub fn clear_marker(&mut self) {
        if self.lifecycle == MapLifecycle::Destroyed || self.marker.is_none() {
            return;
        }
        self.marker = None;
        self.submit(OverlayOp::ClearMarker);
    }

    /// Fire-and-forget camera move.
    pub fn fly_to(&mut self, center: Coordinates, zoom: f64) {
        if matches!(
            self.lifecycle,
            MapLifecycle::Loading | MapLifecycle::Ready
        ) {
            self.camera = Some((center, zoom));
            self.backend.fly_to(center, zoom);
        }
    }

    /// Swaps the style. `Ready | Loading -> Loading`; every retained source
    /// and the marker are re-queued and replayed on the next ready. Returns
    /// the epoch the new style's load event must carry.
    ///
    /// # Errors
    ///
    /// - [`MapError::StyleRejected`] if the backend refuses the style; the
    ///   current style and lifecycle are kept.
    /// - [`MapError::NotInitialized`] / [`MapError::Destroyed`] otherwise.
    pub fn reload_style(&mut self, style: &StyleDocument) -> Result<StyleEpoch, MapError> {
        let (center, zoom) = match (self.lifecycle, self.camera) {
            (MapLifecycle::Destroyed, _) => return Err(MapError::Destroyed),
            (MapLifecycle::Uninitialized, _) | (_, None) => return Err(MapError::NotInitialized),
            (_, Some(camera)) => camera,
        };
        self.backend.load_style(style, center, zoom)?;
        self.lifecycle = MapLifecycle::Loading;
        self.style_epoch = StyleEpoch(self.style_epoch.0 + 1);
        self.ready_via = None;
        self.pending.clear();
        for (source_id, kind, data) in &self.retained {
            self.pending.push_back(OverlayOp::UpsertSource {
                source_id: source_id.clone(),
                kind: *kind,
                data: data.clone(),
            });
        }
        if let Some(marker) = self.marker {
            self.pending.push_back(OverlayOp::SetMarker(marker));
        }
        self.style_origin = Some(if style.is_fallback() {
            StyleOrigin::Fallback
        } else {
            StyleOrigin::Remote
        });
        tracing::debug!(
            map = %self.handle,
            style = %style.name,
            epoch = %self.style_epoch,
            requeued = self.pending.len(),
            "style reloading"
        );
        Ok(self.style_epoch)
    }

    /// Registers the receiver for click and drag events, replacing any
    /// previous subscriber.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<MapEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    /// Backend click callback.
    pub fn map_clicked(&self, at: Coordinates) {
        if self.lifecycle == MapLifecycle::Ready {
            self.emit(MapEvent::Clicked(at));
        }
    }

    /// Backend dragend callback. Returns `false` if the marker is missing or
    /// not draggable.
    pub fn marker_dragged(&mut self, to: Coordinates) -> bool {
        match self.marker.as_mut() {
            Some(marker) if marker.draggable => {
                marker.coordinates = to;
                self.emit(MapEvent::MarkerDragged(to));
                true
            }
            _ => false,
        }
    }

    /// Releases overlays and the backend. Safe to call repeatedly; queued
    /// overlay writes are dropped.
    pub fn destroy(&mut self) {
        if self.lifecycle == MapLifecycle::Destroyed {
            return;
        }
        self.pending.clear();
        self.retained.clear();
        self.marker = None;
        self.events = None;
        self.backend.dispose();
        self.lifecycle = MapLifecycle::Destroyed;
        tracing::info!(map = %self.handle, "map destroyed");
    }

    fn emit(&self, event: MapEvent) {
        if let Some(tx) = &self.events {
            if tx.send(event).is_err() {
                tracing::debug!(map = %self.handle, ?event, "map event dropped, no subscriber");
            }
        }
    }

    fn submit_source(&mut self, source_id: &str, kind: LayerKind, data: FeatureCollection) {
        if self.lifecycle == MapLifecycle::Destroyed {
            tracing::debug!(map = %self.handle, source_id, "overlay write after destroy ignored");
            return;
        }
        match self.retained.iter_mut().find(|(id, _, _)| id == source_id) {
            Some(entry) => {
                entry.1 = kind;
                entry.2.clone_from(&data);
            }
            None => self
                .retained
                .push((source_id.to_owned(), kind, data.clone())),
        }
        self.submit(OverlayOp::UpsertSource {
            source_id: source_id.to_owned(),
            kind,
            data,
        });
    }

    fn submit(&mut self, op: OverlayOp) {
        match self.lifecycle {
            MapLifecycle::Uninitialized | MapLifecycle::Loading => self.pending.push_back(op),
            MapLifecycle::Ready => self.apply(op),
            MapLifecycle::Destroyed => {}
        }
    }

    fn apply(&mut self, op: OverlayOp) {
        match op {
            OverlayOp::UpsertSource {
                source_id,
                kind,
                data,
            } => {
                if self.backend.has_source(&source_id) {
                    self.backend.set_source_data(&source_id, &data);
                } else {
                    self.backend.add_source(&source_id, &data);
                    self.backend
                        .add_layer(&LayerSpec::for_source(&source_id, kind));
                }
            }
            OverlayOp::SetMarker(marker) => {
                self.backend.remove_marker();
                self.backend.place_marker(&marker);
            }
            OverlayOp::ClearMarker => self.backend.remove_marker(),
        }
    }
}

impl Drop for MapSurface {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
#[path = "surface_test.rs"]
mod tests;
