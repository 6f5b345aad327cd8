use std::time::Duration;

use findnest_core::{AppConfig, Coordinates, DEFAULT_MAP_CENTER};

/// Camera zoom used when the reconciler flies to a resolved location.
pub const FOCUS_ZOOM: f64 = 15.0;

/// Timing and camera settings for one reconciler.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    pub debounce: Duration,
    /// Bound on a single geocode call; the HTTP client's own timeout still
    /// applies underneath.
    pub geocode_timeout: Duration,
    pub map_ready_timeout: Duration,
    /// Initial map center, and the search origin while nothing is selected.
    pub default_center: Coordinates,
    pub default_zoom: f64,
    pub focus_zoom: f64,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(1000),
            geocode_timeout: Duration::from_secs(10),
            map_ready_timeout: Duration::from_millis(5000),
            default_center: DEFAULT_MAP_CENTER,
            default_zoom: 12.0,
            focus_zoom: FOCUS_ZOOM,
        }
    }
}

impl ReconcilerConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            debounce: Duration::from_millis(config.geocode_debounce_ms),
            geocode_timeout: Duration::from_secs(config.geocode_timeout_secs),
            map_ready_timeout: Duration::from_millis(config.map_ready_timeout_ms),
            default_center: config.default_center,
            default_zoom: config.default_zoom,
            focus_zoom: FOCUS_ZOOM,
        }
    }
}
