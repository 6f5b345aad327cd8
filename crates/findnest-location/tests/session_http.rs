//! End-to-end session tests: real `FindNestApiClient` against wiremock, a
//! headless map, and short real-time debounce.

use std::sync::Arc;
use std::time::Duration;

use findnest_core::{AddressField, Coordinates, SelectionSource};
use findnest_geo::{ApiClientConfig, FindNestApiClient, StyleClient, StyleOrigin};
use findnest_location::{
    LocationError, LocationEvent, LocationReconciler, LocationServices, LocationSession,
    LocationSnapshot, ReconcilerConfig, ReconcilerState, SessionInput,
};
use findnest_map::{HeadlessMap, HeadlessProbe, MapSurface};
use tokio::sync::watch;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn point(lat: f64, lng: f64) -> Coordinates {
    Coordinates::new(lat, lng).unwrap()
}

fn config() -> ReconcilerConfig {
    ReconcilerConfig {
        debounce: Duration::from_millis(20),
        geocode_timeout: Duration::from_secs(2),
        ..ReconcilerConfig::default()
    }
}

async fn open_session(server: &MockServer) -> (LocationSession, HeadlessProbe) {
    let mut api = ApiClientConfig::new(&server.uri());
    api.backoff_base_ms = 0;
    let client = Arc::new(FindNestApiClient::new(&api).unwrap());

    let backend = HeadlessMap::new();
    let probe = backend.probe();
    let mut map = MapSurface::new(Box::new(backend));
    let config = config();
    let styles = StyleClient::new(None, 5, 0, 0).unwrap();
    map.open(&styles, config.default_center, config.default_zoom)
        .await
        .unwrap();
    assert_eq!(map.style_origin(), Some(StyleOrigin::Fallback));

    let (reconciler, settled) =
        LocationReconciler::new(config, LocationServices::from_client(&client), map);
    let session = LocationSession::spawn(reconciler, settled);
    session.send(SessionInput::MapLoaded(session.snapshot().style_epoch));
    (session, probe)
}

async fn wait_until(
    snapshots: &mut watch::Receiver<LocationSnapshot>,
    what: impl FnMut(&LocationSnapshot) -> bool,
) -> LocationSnapshot {
    tokio::time::timeout(Duration::from_secs(5), snapshots.wait_for(what))
        .await
        .expect("snapshot condition not reached in time")
        .expect("session ended")
        .clone()
}

#[tokio::test]
async fn address_pick_and_search_flow() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/location/geocode"))
        .and(query_param("address", "123 Le Loi, Quận 1, TP.HCM"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "latitude": 10.7731, "longitude": 106.7004 })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/location/reverse-geocode"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "street": "45 Nguyen Hue",
            "ward": "Bến Nghé",
            "district": "Quận 1",
            "city": "TP.HCM"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/ai/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "recommendations": [
                {
                    "id": 42,
                    "title": "Studio near Ben Thanh",
                    "description": "Furnished",
                    "price": "5500000",
                    "area": 28.0,
                    "address": "12 Le Loi",
                    "location": { "lat": 10.77, "lng": 106.69 },
                    "relevanceScore": 0.93
                },
                {
                    "id": "no-location",
                    "title": "Unplaceable",
                    "location": null
                }
            ],
            "explanation": "Studios close to District 1"
        })))
        .mount(&server)
        .await;

    let (session, probe) = open_session(&server).await;
    let mut snapshots = session.subscribe();

    for (field, value) in [
        (AddressField::District, "Quận 1"),
        (AddressField::City, "TP.HCM"),
        (AddressField::Street, "123"),
        (AddressField::Street, "123 Le"),
        (AddressField::Street, "123 Le Loi"),
    ] {
        session.dispatch(LocationEvent::AddressFieldChanged {
            field,
            value: value.to_owned(),
        });
    }
    let resolved = wait_until(&mut snapshots, |s| s.state == ReconcilerState::Resolved).await;
    assert_eq!(resolved.selection.coordinates, Some(point(10.7731, 106.7004)));
    assert_eq!(resolved.selection.source, SelectionSource::Address);

    session.send(SessionInput::MapClicked(point(10.80, 106.70)));
    let picked = wait_until(&mut snapshots, |s| {
        s.selection.source == SelectionSource::MapPick && !s.selection.resolving
    })
    .await;
    assert_eq!(picked.selection.coordinates, Some(point(10.80, 106.70)));
    assert_eq!(picked.draft.street, "45 Nguyen Hue");

    session.dispatch(LocationEvent::SearchSubmitted {
        query: "studio near district 1".to_owned(),
    });
    let searched = wait_until(&mut snapshots, |s| !s.search_results.is_empty()).await;
    assert_eq!(searched.search_results.len(), 1, "unplaceable result dropped");
    assert_eq!(
        searched.search_results.explanation.as_deref(),
        Some("Studios close to District 1")
    );
    assert_eq!(probe.source("search-results").unwrap().len(), 1);

    let chosen = searched.search_results.results[0].clone();
    assert_eq!(chosen.id, "42");
    session.dispatch(LocationEvent::SearchResultChosen(chosen));
    let selected = wait_until(&mut snapshots, |s| {
        s.selection.source == SelectionSource::AiSearch
    })
    .await;
    assert_eq!(selected.selection.coordinates, Some(point(10.77, 106.69)));
    assert!(!selected.selection.resolving);

    let summary = session.shutdown().await.unwrap();
    assert_eq!(
        summary.listing.map(|l| l.location),
        Some(point(10.77, 106.69))
    );
    assert!(probe.is_disposed());
}

#[tokio::test]
async fn unknown_address_raises_notice_and_clears() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/location/geocode"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (mut session, _probe) = open_session(&server).await;
    for (field, value) in [
        (AddressField::District, "Quận 12"),
        (AddressField::City, "TP.HCM"),
        (AddressField::Street, "999 Does Not Exist"),
    ] {
        session.dispatch(LocationEvent::AddressFieldChanged {
            field,
            value: value.to_owned(),
        });
    }

    let notice = tokio::time::timeout(Duration::from_secs(5), session.next_notice())
        .await
        .expect("notice in time")
        .expect("session alive");
    assert!(matches!(
        notice.error,
        LocationError::GeocodeNotFound { ref query } if query == "999 Does Not Exist, Quận 12, TP.HCM"
    ));

    let snapshot = session.snapshot();
    assert_eq!(snapshot.selection.coordinates, None);
    assert_eq!(snapshot.state, ReconcilerState::Empty);
}

#[tokio::test]
async fn search_outage_empties_panel() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ai/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (mut session, _probe) = open_session(&server).await;
    session.dispatch(LocationEvent::SearchSubmitted {
        query: "anything".to_owned(),
    });

    let notice = tokio::time::timeout(Duration::from_secs(5), session.next_notice())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(notice.error, LocationError::SearchFailed { .. }));
    assert!(session.snapshot().search_results.is_empty());
    assert!(!session.snapshot().search_pending);
}
