//! Shared domain types and configuration for the FindNest location core.
//!
//! Everything here is plain data: the coordinate/address model the
//! reconciler owns, the search result shapes, the GeoJSON overlay payloads
//! handed to the map, and the environment-driven [`AppConfig`].

pub mod app_config;
pub mod config;
pub mod geojson;
pub mod listing;
pub mod location;
pub mod search;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use geojson::{Feature, FeatureCollection, Geometry};
pub use listing::ListingLocation;
pub use location::{
    AddressDraft, AddressField, Coordinates, LocationSelection, MarkerState, SelectionSource,
    DEFAULT_MAP_CENTER,
};
pub use search::{SearchRecommendation, SearchResponse, SearchResult, SearchResultSet};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("invalid coordinates ({latitude}, {longitude})")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    #[error("listing has no resolved location")]
    MissingCoordinates,

    /// The address changed and its coordinates are still being looked up.
    #[error("listing location is still resolving")]
    LocationResolving,
}
