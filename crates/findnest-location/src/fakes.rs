//! Scripted collaborators with simulated latency for timing tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use findnest_core::{
    AddressDraft, Coordinates, Geometry, SearchRecommendation, SearchResponse, DEFAULT_MAP_CENTER,
};
use findnest_geo::{
    fallback_raster_style, GeoError, Geocoder, PlaceSearch, ReverseGeocoder, Route, RouteProvider,
};
use findnest_map::{HeadlessMap, HeadlessProbe, MapSurface};

use crate::config::ReconcilerConfig;
use crate::reconciler::LocationReconciler;
use crate::event::Settled;
use crate::services::LocationServices;

pub(crate) fn at(lat: f64, lng: f64) -> Coordinates {
    Coordinates::new(lat, lng).unwrap()
}

pub(crate) fn street_address(street: &str) -> AddressDraft {
    AddressDraft {
        street: street.to_owned(),
        ward: "Bến Nghé".to_owned(),
        district: "Quận 1".to_owned(),
        city: "TP.HCM".to_owned(),
    }
}

pub(crate) fn recommendation(id: &str, title: &str, lat: f64, lng: f64) -> SearchRecommendation {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "title": title,
        "description": "",
        "price": 5_500_000,
        "area": 30.0,
        "address": "",
        "location": { "lat": lat, "lng": lng },
        "relevanceScore": 0.9
    }))
    .unwrap()
}

#[derive(Clone)]
struct Reply<T> {
    delay: Duration,
    value: Option<T>,
}

impl<T> Reply<T> {
    fn new(delay: Duration, value: Option<T>) -> Self {
        Self { delay, value }
    }
}

/// Implements every service trait. Unscripted geocode queries resolve to
/// "not found" immediately.
#[derive(Default)]
pub(crate) struct FakeGeo {
    geocode: Mutex<HashMap<String, Reply<Coordinates>>>,
    reverse: Mutex<Option<Reply<AddressDraft>>>,
    search: Mutex<HashMap<String, Reply<SearchResponse>>>,
    route: Mutex<Option<Reply<Route>>>,
    pub(crate) geocode_calls: Mutex<Vec<String>>,
    pub(crate) reverse_calls: Mutex<Vec<Coordinates>>,
    pub(crate) search_calls: Mutex<Vec<(String, Coordinates)>>,
}

impl FakeGeo {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn geocode(self, query: &str, delay_ms: u64, value: Option<Coordinates>) -> Self {
        self.geocode.lock().unwrap().insert(
            query.to_owned(),
            Reply::new(Duration::from_millis(delay_ms), value),
        );
        self
    }

    pub(crate) fn reverse(self, delay_ms: u64, value: Option<AddressDraft>) -> Self {
        *self.reverse.lock().unwrap() = Some(Reply::new(Duration::from_millis(delay_ms), value));
        self
    }

    pub(crate) fn search(self, query: &str, delay_ms: u64, value: Option<SearchResponse>) -> Self {
        self.search.lock().unwrap().insert(
            query.to_owned(),
            Reply::new(Duration::from_millis(delay_ms), value),
        );
        self
    }

    pub(crate) fn route(self, delay_ms: u64, value: Option<Route>) -> Self {
        *self.route.lock().unwrap() = Some(Reply::new(Duration::from_millis(delay_ms), value));
        self
    }

    pub(crate) fn geocode_calls(&self) -> Vec<String> {
        self.geocode_calls.lock().unwrap().clone()
    }

    pub(crate) fn reverse_calls(&self) -> Vec<Coordinates> {
        self.reverse_calls.lock().unwrap().clone()
    }

    pub(crate) fn search_calls(&self) -> Vec<(String, Coordinates)> {
        self.search_calls.lock().unwrap().clone()
    }
}

fn not_found(query: &str) -> GeoError {
    GeoError::NotFound {
        query: query.to_owned(),
    }
}

#[async_trait]
impl Geocoder for FakeGeo {
    async fn geocode(&self, address: &str) -> Result<Coordinates, GeoError> {
        self.geocode_calls.lock().unwrap().push(address.to_owned());
        let reply = self.geocode.lock().unwrap().get(address).cloned();
        let Some(reply) = reply else {
            return Err(not_found(address));
        };
        tokio::time::sleep(reply.delay).await;
        reply.value.ok_or_else(|| not_found(address))
    }
}

#[async_trait]
impl ReverseGeocoder for FakeGeo {
    async fn reverse_geocode(&self, at: Coordinates) -> Result<AddressDraft, GeoError> {
        self.reverse_calls.lock().unwrap().push(at);
        let reply = self.reverse.lock().unwrap().clone();
        let Some(reply) = reply else {
            return Err(not_found(&at.to_string()));
        };
        tokio::time::sleep(reply.delay).await;
        reply.value.ok_or_else(|| not_found(&at.to_string()))
    }
}

#[async_trait]
impl PlaceSearch for FakeGeo {
    async fn search(&self, query: &str, origin: Coordinates) -> Result<SearchResponse, GeoError> {
        self.search_calls
            .lock()
            .unwrap()
            .push((query.to_owned(), origin));
        let reply = self.search.lock().unwrap().get(query).cloned();
        let Some(reply) = reply else {
            return Err(GeoError::UnexpectedStatus {
                status: 503,
                url: "fake://ai/search".to_owned(),
            });
        };
        tokio::time::sleep(reply.delay).await;
        reply.value.ok_or_else(|| GeoError::UnexpectedStatus {
            status: 503,
            url: "fake://ai/search".to_owned(),
        })
    }
}

#[async_trait]
impl RouteProvider for FakeGeo {
    async fn route(&self, origin: Coordinates, destination: Coordinates) -> Result<Route, GeoError> {
        let reply = self.route.lock().unwrap().clone();
        let Some(reply) = reply else {
            return Err(not_found(&format!("{origin} -> {destination}")));
        };
        tokio::time::sleep(reply.delay).await;
        reply
            .value
            .ok_or_else(|| not_found(&format!("{origin} -> {destination}")))
    }
}

pub(crate) fn straight_route(from: Coordinates, to: Coordinates) -> Route {
    Route {
        geometry: Geometry::LineString {
            coordinates: vec![from.position(), to.position()],
        },
        distance_km: 2.5,
        duration_sec: 420.0,
    }
}

pub(crate) fn services(geo: &Arc<FakeGeo>) -> LocationServices {
    LocationServices {
        geocoder: Arc::clone(geo) as Arc<dyn Geocoder>,
        reverse_geocoder: Arc::clone(geo) as Arc<dyn ReverseGeocoder>,
        search: Arc::clone(geo) as Arc<dyn PlaceSearch>,
        routes: Arc::clone(geo) as Arc<dyn RouteProvider>,
    }
}

/// A surface that has already reached `Ready` on the fallback style.
pub(crate) fn ready_map() -> (MapSurface, HeadlessProbe) {
    let backend = HeadlessMap::new();
    let probe = backend.probe();
    let mut map = MapSurface::new(Box::new(backend));
    map.initialize(&fallback_raster_style(), DEFAULT_MAP_CENTER, 12.0)
        .unwrap();
    map.on_load();
    (map, probe)
}

pub(crate) fn reconciler(
    geo: &Arc<FakeGeo>,
    map: MapSurface,
) -> (
    LocationReconciler,
    tokio::sync::mpsc::UnboundedReceiver<Settled>,
) {
    LocationReconciler::new(ReconcilerConfig::default(), services(geo), map)
}
