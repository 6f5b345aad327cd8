//! Service seams consumed by the map and the location reconciler.

use async_trait::async_trait;
use findnest_core::{AddressDraft, Coordinates, SearchResponse};

use crate::client::FindNestApiClient;
use crate::error::GeoError;
use crate::style::{StyleClient, StyleDocument};
use crate::types::Route;

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Coordinates, GeoError>;
}

#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse_geocode(&self, at: Coordinates) -> Result<AddressDraft, GeoError>;
}

/// Natural-language listing search.
#[async_trait]
pub trait PlaceSearch: Send + Sync {
    async fn search(&self, query: &str, origin: Coordinates) -> Result<SearchResponse, GeoError>;
}

#[async_trait]
pub trait RouteProvider: Send + Sync {
    async fn route(&self, origin: Coordinates, destination: Coordinates)
        -> Result<Route, GeoError>;
}

#[async_trait]
pub trait StyleProvider: Send + Sync {
    async fn style_descriptor(&self) -> Result<StyleDocument, GeoError>;
}

#[async_trait]
impl Geocoder for FindNestApiClient {
    async fn geocode(&self, address: &str) -> Result<Coordinates, GeoError> {
        FindNestApiClient::geocode(self, address).await
    }
}

#[async_trait]
impl ReverseGeocoder for FindNestApiClient {
    async fn reverse_geocode(&self, at: Coordinates) -> Result<AddressDraft, GeoError> {
        FindNestApiClient::reverse_geocode(self, at).await
    }
}

#[async_trait]
impl PlaceSearch for FindNestApiClient {
    async fn search(&self, query: &str, origin: Coordinates) -> Result<SearchResponse, GeoError> {
        FindNestApiClient::search(self, query, origin).await
    }
}

#[async_trait]
impl RouteProvider for FindNestApiClient {
    async fn route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<Route, GeoError> {
        FindNestApiClient::route(self, origin, destination).await
    }
}

#[async_trait]
impl StyleProvider for StyleClient {
    async fn style_descriptor(&self) -> Result<StyleDocument, GeoError> {
        self.fetch().await
    }
}
