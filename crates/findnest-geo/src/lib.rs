//! Clients for the services the location core depends on.
//!
//! The FindNest API exposes geocoding, reverse-geocoding, AI search and
//! routing; map styles come from a separate style URL. The core only sees
//! the traits in [`services`], so tests and alternative backends can swap
//! the HTTP clients out.

pub mod client;
pub mod error;
pub mod services;
pub mod style;
pub mod types;

mod retry;

pub use client::{ApiClientConfig, FindNestApiClient};
pub use error::GeoError;
pub use services::{Geocoder, PlaceSearch, ReverseGeocoder, RouteProvider, StyleProvider};
pub use style::{fallback_raster_style, StyleClient, StyleDocument, StyleOrigin};
pub use types::Route;
