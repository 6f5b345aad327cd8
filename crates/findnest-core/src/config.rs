use crate::app_config::{AppConfig, Environment};
use crate::location::Coordinates;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a `HashMap`
/// lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let api_base_url = require("FINDNEST_API_BASE_URL")?;
    if !(api_base_url.starts_with("http://") || api_base_url.starts_with("https://")) {
        return Err(invalid(
            "FINDNEST_API_BASE_URL",
            format!("expected an http(s) URL, got '{api_base_url}'"),
        ));
    }

    let env = parse_environment(&or_default("FINDNEST_ENV", "development"))?;
    let log_level = or_default("FINDNEST_LOG_LEVEL", "info");
    let api_token = lookup("FINDNEST_API_TOKEN").ok().filter(|t| !t.is_empty());
    let map_style_url = lookup("FINDNEST_MAP_STYLE_URL")
        .ok()
        .filter(|u| !u.is_empty());

    let http_timeout_secs = parse_u64("FINDNEST_HTTP_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("FINDNEST_USER_AGENT", "findnest/0.1 (location-core)");
    let geocode_debounce_ms = parse_u64("FINDNEST_GEOCODE_DEBOUNCE_MS", "1000")?;
    let geocode_timeout_secs = parse_u64("FINDNEST_GEOCODE_TIMEOUT_SECS", "10")?;
    let map_ready_timeout_ms = parse_u64("FINDNEST_MAP_READY_TIMEOUT_MS", "5000")?;
    let max_retries = parse_u32("FINDNEST_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms = parse_u64("FINDNEST_RETRY_BACKOFF_BASE_MS", "500")?;

    let default_center = parse_center(&or_default("FINDNEST_DEFAULT_CENTER", "10.7769,106.7009"))
        .map_err(|reason| invalid("FINDNEST_DEFAULT_CENTER", reason))?;

    let default_zoom = or_default("FINDNEST_DEFAULT_ZOOM", "12")
        .parse::<f64>()
        .map_err(|e| invalid("FINDNEST_DEFAULT_ZOOM", e.to_string()))?;
    if !(0.0..=22.0).contains(&default_zoom) {
        return Err(invalid(
            "FINDNEST_DEFAULT_ZOOM",
            format!("zoom {default_zoom} outside 0..=22"),
        ));
    }

    Ok(AppConfig {
        env,
        log_level,
        api_base_url,
        api_token,
        map_style_url,
        http_timeout_secs,
        user_agent,
        geocode_debounce_ms,
        geocode_timeout_secs,
        map_ready_timeout_ms,
        max_retries,
        retry_backoff_base_ms,
        default_center,
        default_zoom,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "FINDNEST_ENV".to_string(),
            reason: format!("expected development|test|production, got '{other}'"),
        }),
    }
}

/// Parse a `"lat,lng"` pair.
fn parse_center(raw: &str) -> Result<Coordinates, String> {
    let (lat, lng) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected 'lat,lng', got '{raw}'"))?;
    let latitude = lat.trim().parse::<f64>().map_err(|e| e.to_string())?;
    let longitude = lng.trim().parse::<f64>().map_err(|e| e.to_string())?;
    Coordinates::new(latitude, longitude).map_err(|e| e.to_string())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
