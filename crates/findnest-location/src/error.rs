use findnest_core::Coordinates;
use findnest_geo::GeoError;
use thiserror::Error;

/// Non-fatal resolution failures. All of them are recovered inside the
/// reconciler and surfaced to the form as [`crate::Notice`]s.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocationError {
    #[error("no location found for \"{query}\"")]
    GeocodeNotFound { query: String },

    /// Retryable; the next qualifying edit re-schedules the lookup.
    #[error("geocoding \"{query}\" timed out")]
    GeocodeTimeout { query: String },

    #[error("geocoding \"{query}\" failed: {reason}")]
    GeocodeFailed { query: String, reason: String },

    /// The picked coordinates stay valid; only the address text is missing.
    #[error("could not derive an address for {at}: {reason}")]
    ReverseGeocodeFailed { at: Coordinates, reason: String },

    #[error("search \"{query}\" failed: {reason}")]
    SearchFailed { query: String, reason: String },

    #[error("route unavailable: {reason}")]
    RouteFailed { reason: String },
}

impl LocationError {
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, LocationError::GeocodeTimeout { .. })
    }

    pub(crate) fn geocode(query: &str, err: &GeoError) -> Self {
        match err {
            GeoError::NotFound { .. } => LocationError::GeocodeNotFound {
                query: query.to_owned(),
            },
            e if e.is_timeout() => LocationError::GeocodeTimeout {
                query: query.to_owned(),
            },
            e => LocationError::GeocodeFailed {
                query: query.to_owned(),
                reason: e.to_string(),
            },
        }
    }
}
