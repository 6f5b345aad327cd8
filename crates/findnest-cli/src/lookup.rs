//! One-shot calls against the FindNest API and style provider.
//!
//! These bypass the reconciler entirely and print what the service returns,
//! which is useful when checking an address or a style URL by hand.

use findnest_core::{AppConfig, Coordinates, SearchResultSet};
use findnest_geo::{ApiClientConfig, FindNestApiClient, GeoError, StyleClient};

fn api_client(config: &AppConfig) -> anyhow::Result<FindNestApiClient> {
    Ok(FindNestApiClient::new(&ApiClientConfig::from_app_config(
        config,
    ))?)
}

pub(crate) fn style_client(config: &AppConfig) -> anyhow::Result<StyleClient> {
    Ok(StyleClient::new(
        config.map_style_url.as_deref(),
        config.http_timeout_secs,
        config.max_retries,
        config.retry_backoff_base_ms,
    )?)
}

/// # Errors
///
/// Returns an error if the client cannot be built or the request fails for
/// any reason other than "no match".
pub(crate) async fn run_geocode(config: &AppConfig, address: &str) -> anyhow::Result<()> {
    let client = api_client(config)?;
    match client.geocode(address).await {
        Ok(at) => println!("{at}"),
        Err(GeoError::NotFound { .. }) => println!("no match for '{address}'"),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// # Errors
///
/// Returns an error if the client cannot be built or the request fails for
/// any reason other than "no match".
pub(crate) async fn run_reverse(config: &AppConfig, at: Coordinates) -> anyhow::Result<()> {
    let client = api_client(config)?;
    match client.reverse_geocode(at).await {
        Ok(address) => {
            println!("street:   {}", address.street);
            println!("ward:     {}", address.ward);
            println!("district: {}", address.district);
            println!("city:     {}", address.city);
        }
        Err(GeoError::NotFound { .. }) => println!("no address at {at}"),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Prints the placeable results in server order, up to `limit`.
///
/// # Errors
///
/// Returns an error if the client cannot be built or the search fails after
/// retries.
pub(crate) async fn run_search(
    config: &AppConfig,
    query: &str,
    near: Option<Coordinates>,
    limit: usize,
) -> anyhow::Result<()> {
    let client = api_client(config)?;
    let origin = near.unwrap_or(config.default_center);
    let response = client.search(query, origin).await?;
    let returned = response.recommendations.len();
    let results = SearchResultSet::from_response(response);

    if let Some(explanation) = &results.explanation {
        println!("{explanation}");
        println!();
    }
    if results.is_empty() {
        println!("no placeable results for '{query}' near {origin}");
        return Ok(());
    }

    println!("{:<12}{:<8}{:<26}LABEL", "ID", "SCORE", "LOCATION");
    for result in results.results.iter().take(limit) {
        println!(
            "{:<12}{:<8.2}{:<26}{}",
            result.id,
            result.relevance_score,
            result.coordinates.to_string(),
            result.label
        );
    }
    let dropped = returned - results.len();
    if dropped > 0 {
        println!("({dropped} result(s) without a location omitted)");
    }
    Ok(())
}

/// # Errors
///
/// Returns an error if the client cannot be built or no route is returned.
pub(crate) async fn run_route(
    config: &AppConfig,
    from: Coordinates,
    to: Coordinates,
) -> anyhow::Result<()> {
    let client = api_client(config)?;
    let route = client.route(from, to).await?;
    let minutes = route.duration_sec / 60.0;
    println!("{from} -> {to}: {:.1} km, {minutes:.0} min", route.distance_km);
    Ok(())
}

/// Reports which style the map would start with. A fetch failure is not an
/// error here: it is exactly the case the fallback exists for.
///
/// # Errors
///
/// Returns an error only if the style client cannot be built.
pub(crate) async fn run_style(config: &AppConfig) -> anyhow::Result<()> {
    let styles = style_client(config)?;
    match styles.fetch().await {
        Ok(style) => println!("remote style '{}'", style.name),
        Err(e) => {
            tracing::warn!(error = %e, "style unavailable");
            println!(
                "fallback style '{}' ({e})",
                findnest_geo::fallback_raster_style().name
            );
        }
    }
    Ok(())
}
