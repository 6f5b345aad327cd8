//! Replays a scripted form session against the live API.
//!
//! A script is a JSON array of steps, for example:
//!
//! ```json
//! [
//!   { "step": "field", "field": "district", "value": "Quận 1" },
//!   { "step": "field", "field": "city", "value": "TP.HCM" },
//!   { "step": "field", "field": "street", "value": "123 Le Loi" },
//!   { "step": "click", "lat": 10.80, "lng": 106.70 },
//!   { "step": "search", "query": "studio near district 1" },
//!   { "step": "choose", "index": 0 }
//! ]
//! ```
//!
//! The map is headless, so it is marked loaded as soon as it is opened.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use findnest_core::{AddressField, AppConfig, Coordinates, ListingLocation};
use findnest_geo::{ApiClientConfig, FindNestApiClient};
use findnest_location::{
    LocationEvent, LocationReconciler, LocationServices, LocationSession, LocationSnapshot,
    Notice, ReconcilerConfig, ReconcilerState, SessionInput,
};
use findnest_map::{HeadlessMap, MapSurface};
use serde::Deserialize;

use crate::lookup;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub(crate) enum ScriptStep {
    Field { field: AddressField, value: String },
    Click { lat: f64, lng: f64 },
    Drag { lat: f64, lng: f64 },
    Search { query: String },
    /// Picks a result from the current search panel by position. Waits for
    /// any pending search first.
    Choose { index: usize },
    Route { lat: f64, lng: f64 },
    Reset,
    Wait { ms: u64 },
}

#[derive(Debug)]
pub(crate) struct SessionOutcome {
    pub snapshot: LocationSnapshot,
    pub listing: Option<ListingLocation>,
    pub notices: Vec<Notice>,
    pub stale_discarded: u64,
}

pub(crate) fn load_script(path: &Path) -> anyhow::Result<Vec<ScriptStep>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read script {}", path.display()))?;
    parse_script(&raw).with_context(|| format!("invalid script {}", path.display()))
}

fn parse_script(raw: &str) -> Result<Vec<ScriptStep>, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Runs `steps` in order, waits for outstanding work to settle, then shuts
/// the session down.
///
/// # Errors
///
/// Returns an error if the clients cannot be built, the map cannot be
/// opened, a step is invalid (bad coordinates, no such search result), or
/// the session task dies.
pub(crate) async fn run_session(
    config: &AppConfig,
    steps: &[ScriptStep],
) -> anyhow::Result<SessionOutcome> {
    let client = Arc::new(FindNestApiClient::new(
        &ApiClientConfig::from_app_config(config),
    )?);
    let styles = lookup::style_client(config)?;
    let reconciler_config = ReconcilerConfig::from_app_config(config);
    let settle_within = reconciler_config.debounce + reconciler_config.geocode_timeout;

    let mut map = MapSurface::new(Box::new(HeadlessMap::new()));
    let handle = map
        .open(
            &styles,
            reconciler_config.default_center,
            reconciler_config.default_zoom,
        )
        .await?;
    tracing::info!(%handle, origin = ?map.style_origin(), "map opened");

    let (reconciler, settled) = LocationReconciler::new(
        reconciler_config,
        LocationServices::from_client(&client),
        map,
    );
    let mut session = LocationSession::spawn(reconciler, settled);
    session.send(SessionInput::MapLoaded(session.snapshot().style_epoch));

    let mut notices = Vec::new();
    for (n, step) in steps.iter().enumerate() {
        tracing::debug!(step = n, ?step, "replaying");
        apply(&session, step, settle_within)
            .await
            .with_context(|| format!("step {n} ({step:?})"))?;
        while let Some(notice) = session.try_next_notice() {
            notices.push(notice);
        }
    }

    let snapshot = settle(&session, settle_within).await;
    while let Some(notice) = session.try_next_notice() {
        notices.push(notice);
    }
    let summary = session.shutdown().await?;

    Ok(SessionOutcome {
        snapshot,
        listing: summary.listing,
        notices,
        stale_discarded: summary.stale_discarded,
    })
}

async fn apply(
    session: &LocationSession,
    step: &ScriptStep,
    settle_within: Duration,
) -> anyhow::Result<()> {
    let sent = match step {
        ScriptStep::Field { field, value } => {
            session.dispatch(LocationEvent::AddressFieldChanged {
                field: *field,
                value: value.clone(),
            })
        }
        ScriptStep::Click { lat, lng } => {
            session.send(SessionInput::MapClicked(Coordinates::new(*lat, *lng)?))
        }
        ScriptStep::Drag { lat, lng } => {
            session.send(SessionInput::MarkerDragged(Coordinates::new(*lat, *lng)?))
        }
        ScriptStep::Search { query } => session.dispatch(LocationEvent::SearchSubmitted {
            query: query.clone(),
        }),
        ScriptStep::Choose { index } => {
            let snapshot = settle(session, settle_within).await;
            let available = snapshot.search_results.len();
            let result = snapshot
                .search_results
                .results
                .get(*index)
                .cloned()
                .with_context(|| format!("no search result #{index} ({available} available)"))?;
            session.dispatch(LocationEvent::SearchResultChosen(result))
        }
        ScriptStep::Route { lat, lng } => session.dispatch(LocationEvent::RouteRequested {
            destination: Coordinates::new(*lat, *lng)?,
        }),
        ScriptStep::Reset => session.dispatch(LocationEvent::Reset),
        ScriptStep::Wait { ms } => {
            tokio::time::sleep(Duration::from_millis(*ms)).await;
            true
        }
    };
    anyhow::ensure!(sent, "session stopped");
    Ok(())
}

/// Waits until no address resolution or search is pending, or `within`
/// elapses. Returns the latest snapshot either way.
async fn settle(session: &LocationSession, within: Duration) -> LocationSnapshot {
    let mut snapshots = session.subscribe();
    let idle = tokio::time::timeout(within, async {
        if !session.sync().await {
            return None;
        }
        snapshots
            .wait_for(|s| s.state != ReconcilerState::Resolving && !s.search_pending)
            .await
            .ok()
            .map(|s| LocationSnapshot::clone(&s))
    })
    .await;

    match idle {
        Ok(Some(snapshot)) => snapshot,
        Ok(None) => session.snapshot(),
        Err(_) => {
            tracing::warn!(
                within_ms = u64::try_from(within.as_millis()).unwrap_or(u64::MAX),
                "session did not settle in time"
            );
            session.snapshot()
        }
    }
}

/// # Errors
///
/// Returns an error if JSON serialization fails.
pub(crate) fn print_outcome(outcome: &SessionOutcome, json: bool) -> anyhow::Result<()> {
    let snapshot = &outcome.snapshot;
    if json {
        let body = serde_json::json!({
            "selection": snapshot.selection,
            "draft": snapshot.draft,
            "map": format!("{:?}", snapshot.map),
            "searchResults": snapshot.search_results.len(),
            "listing": outcome.listing,
            "notices": outcome.notices.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "staleDiscarded": outcome.stale_discarded,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    let selection = &snapshot.selection;
    match selection.coordinates {
        Some(at) => println!("selected {at} via {} ({})", selection.source, selection.label),
        None => println!("no location selected"),
    }
    println!("address: {}", snapshot.draft.to_query());
    if !snapshot.search_results.is_empty() {
        println!("search panel: {} result(s)", snapshot.search_results.len());
    }
    for notice in &outcome.notices {
        println!("notice {notice}");
    }
    if outcome.stale_discarded > 0 {
        println!("{} stale response(s) discarded", outcome.stale_discarded);
    }
    match &outcome.listing {
        Some(listing) => println!("{}", serde_json::to_string_pretty(listing)?),
        None => println!("listing cannot be submitted: no coordinates"),
    }
    Ok(())
}

#[cfg(test)]
#[path = "script_test.rs"]
mod tests;
