//! The authoritative location state machine.
//!
//! Three input streams compete for the selected location: typed address
//! fields, map picks (click or marker drag) and AI search selections. All of
//! them, together with the settled network responses they trigger, enter
//! through [`LocationReconciler::dispatch`].
//!
//! Priority: a map pick cancels any pending or in-flight address geocode; an
//! AI selection replaces everything; an eligible address edit supersedes a
//! prior pick or AI selection. At most one location resolution (geocode or
//! reverse geocode) is in flight, and a response whose generation is no
//! longer current is dropped regardless of arrival order.

use std::sync::Arc;

use findnest_core::{
    AddressDraft, AddressField, Coordinates, CoreError, FeatureCollection, ListingLocation,
    LocationSelection, SearchResult, SearchResultSet, SelectionSource,
};
use findnest_geo::Route;
use findnest_map::{MapLifecycle, MapSurface, StyleEpoch, ROUTE_SOURCE, SEARCH_RESULTS_SOURCE};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::config::ReconcilerConfig;
use crate::debounce::{DebounceOutcome, GeocodeDebouncer};
use crate::error::LocationError;
use crate::event::{LocationEvent, Settled};
use crate::generation::{Generation, GenerationCounter};
use crate::notice::Notice;
use crate::services::LocationServices;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilerState {
    Empty,
    Resolving,
    Resolved,
}

/// Read-only view handed to the form and the overlay renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationSnapshot {
    pub selection: LocationSelection,
    pub state: ReconcilerState,
    pub draft: AddressDraft,
    pub search_results: SearchResultSet,
    pub search_pending: bool,
    pub map: MapLifecycle,
    /// The style whose load event the map is waiting for, or last loaded.
    pub style_epoch: StyleEpoch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InFlight {
    Geocode(Generation),
    ReverseGeocode(Generation),
}

/// AI search panel. Runs independently of location resolution.
#[derive(Debug, Default)]
struct SearchPanel {
    generations: GenerationCounter,
    pending: bool,
    results: SearchResultSet,
}

pub struct LocationReconciler {
    config: ReconcilerConfig,
    services: LocationServices,
    map: MapSurface,
    settled_tx: mpsc::UnboundedSender<Settled>,
    draft: AddressDraft,
    selection: LocationSelection,
    debouncer: GeocodeDebouncer,
    reverse: GenerationCounter,
    in_flight: Option<InFlight>,
    search: SearchPanel,
    routes: GenerationCounter,
    route_pending: bool,
    route: Option<Route>,
    notices: Vec<Notice>,
    stale_discarded: u64,
    torn_down: bool,
}

impl LocationReconciler {
    /// Creates a reconciler driving `map`. Network responses are delivered on
    /// the returned receiver and must be fed back through
    /// [`LocationEvent::Settled`]; [`crate::LocationSession`] does this.
    #[must_use]
    pub fn new(
        config: ReconcilerConfig,
        services: LocationServices,
        map: MapSurface,
    ) -> (Self, mpsc::UnboundedReceiver<Settled>) {
        let (settled_tx, settled_rx) = mpsc::unbounded_channel();
        let debouncer = GeocodeDebouncer::new(config.debounce);
        let reconciler = Self {
            config,
            services,
            map,
            settled_tx,
            draft: AddressDraft::default(),
            selection: LocationSelection::empty(),
            debouncer,
            reverse: GenerationCounter::new(),
            in_flight: None,
            search: SearchPanel::default(),
            routes: GenerationCounter::new(),
            route_pending: false,
            route: None,
            notices: Vec::new(),
            stale_discarded: 0,
            torn_down: false,
        };
        (reconciler, settled_rx)
    }

    /// Single entry point for every input.
    pub fn dispatch(&mut self, event: LocationEvent) {
        if self.torn_down {
            tracing::debug!(?event, "event after teardown ignored");
            return;
        }
        match event {
            LocationEvent::AddressFieldChanged { field, value } => {
                self.address_changed(field, value);
            }
            LocationEvent::MapPicked(at) => self.map_picked(at),
            LocationEvent::SearchSubmitted { query } => self.submit_search(&query),
            LocationEvent::SearchResultChosen(result) => self.result_chosen(result),
            LocationEvent::RouteRequested { destination } => self.request_route(destination),
            LocationEvent::DebounceElapsed => self.debounce_elapsed(),
            LocationEvent::Settled(settled) => self.settle(settled),
            LocationEvent::Reset => self.clear_all(),
        }
        self.selection.resolving = self.debouncer.is_pending() || self.in_flight.is_some();
    }

    pub fn on_address_field_changed(&mut self, field: AddressField, value: impl Into<String>) {
        self.dispatch(LocationEvent::AddressFieldChanged {
            field,
            value: value.into(),
        });
    }

    pub fn on_map_location_picked(&mut self, at: Coordinates) {
        self.dispatch(LocationEvent::MapPicked(at));
    }

    pub fn on_search_result_chosen(&mut self, result: SearchResult) {
        self.dispatch(LocationEvent::SearchResultChosen(result));
    }

    /// Clears the form session: selection, draft, search panel and route.
    pub fn reset(&mut self) {
        self.dispatch(LocationEvent::Reset);
    }

    /// Snapshot of the merged selection.
    #[must_use]
    pub fn selection(&self) -> LocationSelection {
        self.selection.clone()
    }

    #[must_use]
    pub fn draft(&self) -> &AddressDraft {
        &self.draft
    }

    #[must_use]
    pub fn state(&self) -> ReconcilerState {
        match (self.selection.resolving, self.selection.coordinates) {
            (true, _) => ReconcilerState::Resolving,
            (false, Some(_)) => ReconcilerState::Resolved,
            (false, None) => ReconcilerState::Empty,
        }
    }

    #[must_use]
    pub fn search_results(&self) -> &SearchResultSet {
        &self.search.results
    }

    #[must_use]
    pub fn search_pending(&self) -> bool {
        self.search.pending
    }

    #[must_use]
    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    /// Responses dropped because a newer request superseded them.
    #[must_use]
    pub fn stale_discarded(&self) -> u64 {
        self.stale_discarded
    }

    /// Drains the notices raised since the last call.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// When [`LocationEvent::DebounceElapsed`] should next be dispatched.
    #[must_use]
    pub fn debounce_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    #[must_use]
    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    #[must_use]
    pub fn map(&self) -> &MapSurface {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut MapSurface {
        &mut self.map
    }

    #[must_use]
    pub fn snapshot(&self) -> LocationSnapshot {
        LocationSnapshot {
            selection: self.selection.clone(),
            state: self.state(),
            draft: self.draft.clone(),
            search_results: self.search.results.clone(),
            search_pending: self.search.pending,
            map: self.map.lifecycle(),
            style_epoch: self.map.style_epoch(),
        }
    }

    /// Submit gate for the listing form.
    ///
    /// # Errors
    ///
    /// - [`CoreError::MissingCoordinates`] while no location is selected.
    /// - [`CoreError::LocationResolving`] while an edited address is still
    ///   being geocoded; the held coordinates belong to the previous address.
    pub fn finalize(&self) -> Result<ListingLocation, CoreError> {
        if self.selection.resolving && self.selection.source == SelectionSource::Address {
            return Err(CoreError::LocationResolving);
        }
        ListingLocation::from_selection(&self.draft, &self.selection)
    }

    /// Ends the session: outstanding responses can no longer apply and the
    /// map is destroyed. Idempotent.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.cancel_resolution();
        self.search.generations.advance();
        self.routes.advance();
        self.map.destroy();
        self.torn_down = true;
        tracing::info!(
            stale_discarded = self.stale_discarded,
            "location session torn down"
        );
    }

    fn address_changed(&mut self, field: AddressField, value: String) {
        self.draft.set(field, value);
        // Any edit outdates a pending reverse geocode or address lookup.
        self.reverse.advance();
        self.in_flight = None;

        if !self.draft.is_eligible() {
            self.debouncer.cancel();
            self.clear_selection();
            tracing::debug!(?field, "address incomplete");
            return;
        }

        if self.selection.source != SelectionSource::Address {
            self.clear_selection();
        }
        self.debouncer.schedule(self.draft.clone());
    }

    fn debounce_elapsed(&mut self) {
        match self.debouncer.fire_due(Instant::now()) {
            None => {}
            Some(DebounceOutcome::CoordinatesCleared) => self.clear_selection(),
            Some(DebounceOutcome::Geocode { generation, query }) => {
                self.start_geocode(generation, query);
            }
        }
    }

    fn start_geocode(&mut self, generation: Generation, query: String) {
        self.in_flight = Some(InFlight::Geocode(generation));
        tracing::debug!(%generation, query = %query, "geocode issued");

        let geocoder = Arc::clone(&self.services.geocoder);
        let timeout = self.config.geocode_timeout;
        let tx = self.settled_tx.clone();
        tokio::spawn(async move {
            let result = match tokio::time::timeout(timeout, geocoder.geocode(&query)).await {
                Ok(Ok(coordinates)) => Ok(coordinates),
                Ok(Err(e)) => Err(LocationError::geocode(&query, &e)),
                Err(_) => Err(LocationError::GeocodeTimeout {
                    query: query.clone(),
                }),
            };
            // Closed once the session has ended.
            let _ = tx.send(Settled::Geocode {
                generation,
                query,
                result,
            });
        });
    }

    fn map_picked(&mut self, at: Coordinates) {
        if self.debouncer.cancel() {
            tracing::debug!("pending geocode cancelled by map pick");
        }
        let generation = self.reverse.advance();
        self.in_flight = Some(InFlight::ReverseGeocode(generation));
        self.selection.coordinates = Some(at);
        self.selection.source = SelectionSource::MapPick;
        self.selection.label = at.to_string();
        self.map.set_marker(at, true);
        tracing::debug!(%at, %generation, "map pick");

        let reverse_geocoder = Arc::clone(&self.services.reverse_geocoder);
        let tx = self.settled_tx.clone();
        tokio::spawn(async move {
            let result = reverse_geocoder
                .reverse_geocode(at)
                .await
                .map_err(|e| LocationError::ReverseGeocodeFailed {
                    at,
                    reason: e.to_string(),
                });
            let _ = tx.send(Settled::ReverseGeocode { generation, result });
        });
    }

    fn result_chosen(&mut self, result: SearchResult) {
        self.cancel_resolution();
        self.draft = AddressDraft::default();
        let at = result.coordinates;
        self.selection = LocationSelection {
            coordinates: Some(at),
            source: SelectionSource::AiSearch,
            resolving: false,
            label: result.label,
        };
        self.map.set_marker(at, true);
        self.map.fly_to(at, self.config.focus_zoom);
        tracing::debug!(id = %result.id, %at, "search result chosen");
    }

    fn submit_search(&mut self, query: &str) {
        let query = query.trim().to_owned();
        if query.is_empty() {
            self.raise(LocationError::SearchFailed {
                query,
                reason: "empty query".to_owned(),
            });
            return;
        }
        let generation = self.search.generations.advance();
        self.search.pending = true;
        let origin = self
            .selection
            .coordinates
            .unwrap_or(self.config.default_center);
        tracing::debug!(%generation, query = %query, %origin, "search issued");

        let search = Arc::clone(&self.services.search);
        let tx = self.settled_tx.clone();
        tokio::spawn(async move {
            let result = search
                .search(&query, origin)
                .await
                .map(SearchResultSet::from_response)
                .map_err(|e| LocationError::SearchFailed {
                    query: query.clone(),
                    reason: e.to_string(),
                });
            let _ = tx.send(Settled::Search {
                generation,
                query,
                result,
            });
        });
    }

    fn request_route(&mut self, destination: Coordinates) {
        let Some(origin) = self.selection.coordinates else {
            self.raise(LocationError::RouteFailed {
                reason: "no location selected".to_owned(),
            });
            return;
        };
        let generation = self.routes.advance();
        self.route_pending = true;

        let routes = Arc::clone(&self.services.routes);
        let tx = self.settled_tx.clone();
        tokio::spawn(async move {
            let result = routes
                .route(origin, destination)
                .await
                .map_err(|e| LocationError::RouteFailed {
                    reason: e.to_string(),
                });
            let _ = tx.send(Settled::Route { generation, result });
        });
    }

    fn settle(&mut self, settled: Settled) {
        match settled {
            Settled::Geocode {
                generation,
                query,
                result,
            } => {
                if self.in_flight != Some(InFlight::Geocode(generation))
                    || !self.debouncer.accepts(generation)
                {
                    self.discard_stale("geocode", generation);
                    return;
                }
                self.in_flight = None;
                match result {
                    Ok(at) => {
                        self.selection.coordinates = Some(at);
                        self.selection.source = SelectionSource::Address;
                        self.selection.label = query;
                        self.map.set_marker(at, true);
                        self.map.fly_to(at, self.config.focus_zoom);
                        tracing::debug!(%at, %generation, "address resolved");
                    }
                    Err(e) => {
                        self.clear_selection();
                        self.raise(e);
                    }
                }
            }
            Settled::ReverseGeocode { generation, result } => {
                if self.in_flight != Some(InFlight::ReverseGeocode(generation))
                    || !self.reverse.is_current(generation)
                {
                    self.discard_stale("reverse-geocode", generation);
                    return;
                }
                self.in_flight = None;
                match result {
                    Ok(address) => {
                        let label = address.to_query();
                        if !label.is_empty() {
                            self.selection.label = label;
                        }
                        self.draft = address;
                    }
                    Err(e) => {
                        self.draft = AddressDraft::default();
                        self.raise(e);
                    }
                }
            }
            Settled::Search {
                generation,
                query,
                result,
            } => {
                if !self.search.pending || !self.search.generations.is_current(generation) {
                    self.discard_stale("search", generation);
                    return;
                }
                self.search.pending = false;
                let results = match result {
                    Ok(results) if results.is_empty() => {
                        self.raise(LocationError::SearchFailed {
                            query,
                            reason: "no results".to_owned(),
                        });
                        results
                    }
                    Ok(results) => results,
                    Err(e) => {
                        self.raise(e);
                        SearchResultSet::default()
                    }
                };
                self.map
                    .upsert_point_source(SEARCH_RESULTS_SOURCE, FeatureCollection::from(&results));
                tracing::debug!(%generation, count = results.len(), "search results replaced");
                self.search.results = results;
            }
            Settled::Route { generation, result } => {
                if !self.route_pending || !self.routes.is_current(generation) {
                    self.discard_stale("route", generation);
                    return;
                }
                self.route_pending = false;
                match result {
                    Ok(route) => {
                        self.map
                            .upsert_line_source(ROUTE_SOURCE, route.to_feature_collection());
                        self.route = Some(route);
                    }
                    Err(e) => self.raise(e),
                }
            }
        }
    }

    fn clear_all(&mut self) {
        self.cancel_resolution();
        self.search.generations.advance();
        self.search.pending = false;
        self.routes.advance();
        self.route_pending = false;
        self.draft = AddressDraft::default();
        self.clear_selection();
        if !self.search.results.is_empty() {
            self.search.results = SearchResultSet::default();
            self.map
                .upsert_point_source(SEARCH_RESULTS_SOURCE, FeatureCollection::default());
        }
        if self.route.take().is_some() {
            self.map
                .upsert_line_source(ROUTE_SOURCE, FeatureCollection::default());
        }
        self.notices.clear();
        tracing::debug!("location selection reset");
    }

    fn cancel_resolution(&mut self) {
        self.debouncer.cancel();
        self.reverse.advance();
        self.in_flight = None;
    }

    fn clear_selection(&mut self) {
        self.selection.coordinates = None;
        self.selection.source = SelectionSource::None;
        self.selection.label.clear();
        self.map.clear_marker();
    }

    fn raise(&mut self, error: LocationError) {
        tracing::warn!(error = %error, "location notice");
        self.notices.push(Notice::new(error));
    }

    fn discard_stale(&mut self, kind: &'static str, generation: Generation) {
        self.stale_discarded += 1;
        tracing::debug!(kind, %generation, "stale response discarded");
    }
}

#[cfg(test)]
#[path = "reconciler_test.rs"]
mod tests;
