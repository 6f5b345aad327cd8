use crate::location::Coordinates;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// Base URL of the FindNest API (geocoding, reverse-geocoding, AI search, routing).
    pub api_base_url: String,
    pub api_token: Option<String>,
    /// Vector style document URL. `None` means the baked-in raster fallback.
    pub map_style_url: Option<String>,
    pub http_timeout_secs: u64,
    pub user_agent: String,
    pub geocode_debounce_ms: u64,
    pub geocode_timeout_secs: u64,
    pub map_ready_timeout_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub default_center: Coordinates,
    pub default_zoom: f64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("api_base_url", &self.api_base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "[redacted]"))
            .field("map_style_url", &self.map_style_url)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("geocode_debounce_ms", &self.geocode_debounce_ms)
            .field("geocode_timeout_secs", &self.geocode_timeout_secs)
            .field("map_ready_timeout_ms", &self.map_ready_timeout_ms)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("default_center", &self.default_center)
            .field("default_zoom", &self.default_zoom)
            .finish()
    }
}
