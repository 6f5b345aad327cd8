//! Wire types for the FindNest location endpoints.

use findnest_core::geojson::{Feature, FeatureCollection, Geometry};
use findnest_core::search::LatLng;
use findnest_core::AddressDraft;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct GeocodeResponse {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReverseGeocodeResponse {
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub ward: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

impl From<ReverseGeocodeResponse> for AddressDraft {
    fn from(r: ReverseGeocodeResponse) -> Self {
        AddressDraft {
            street: r.street.unwrap_or_default(),
            ward: r.ward.unwrap_or_default(),
            district: r.district.unwrap_or_default(),
            city: r.city.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SearchRequest<'a> {
    pub query: &'a str,
    pub location: LatLng,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RouteResponse {
    pub geometry: Geometry,
    pub distance_km: f64,
    pub duration_sec: f64,
}

/// Driving route between two points.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Always a `LineString`.
    pub geometry: Geometry,
    pub distance_km: f64,
    pub duration_sec: f64,
}

impl Route {
    /// Single-feature collection for the map's route overlay.
    #[must_use]
    pub fn to_feature_collection(&self) -> FeatureCollection {
        let mut properties = serde_json::Map::new();
        properties.insert("distanceKm".to_owned(), serde_json::json!(self.distance_km));
        properties.insert("durationSec".to_owned(), serde_json::json!(self.duration_sec));
        FeatureCollection::new(vec![Feature {
            id: None,
            geometry: self.geometry.clone(),
            properties,
        }])
    }
}
