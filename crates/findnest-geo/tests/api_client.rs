//! Integration tests for `FindNestApiClient` and `StyleClient` using wiremock HTTP mocks.

use findnest_core::{Coordinates, Geometry};
use findnest_geo::{
    ApiClientConfig, FindNestApiClient, GeoError, Geocoder, StyleClient, StyleProvider,
};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> FindNestApiClient {
    let mut config = ApiClientConfig::new(base_url);
    config.backoff_base_ms = 0;
    FindNestApiClient::new(&config).expect("client construction should not fail")
}

fn point(lat: f64, lng: f64) -> Coordinates {
    Coordinates::new(lat, lng).unwrap()
}

#[tokio::test]
async fn geocode_returns_coordinates() {
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

    let client = test_client(&server.uri());
    let coords = client
        .geocode("123 Le Loi, Quận 1, TP.HCM")
        .await
        .expect("should geocode");

    assert!((coords.latitude() - 10.7731).abs() < 1e-9);
    assert!((coords.longitude() - 106.7004).abs() < 1e-9);
}

#[tokio::test]
async fn geocode_404_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/location/geocode"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.geocode("nowhere").await.unwrap_err();
    assert!(
        matches!(err, GeoError::NotFound { ref query } if query == "nowhere"),
        "expected NotFound, got: {err:?}"
    );
}

#[tokio::test]
async fn geocode_null_body_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/location/geocode"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    assert!(matches!(
        client.geocode("somewhere vague").await,
        Err(GeoError::NotFound { .. })
    ));
}

#[tokio::test]
async fn geocode_out_of_range_point_is_invalid_payload() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/location/geocode"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "latitude": 300.0, "longitude": 106.7 })),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    assert!(matches!(
        client.geocode("bad data").await,
        Err(GeoError::InvalidPayload { .. })
    ));
}

#[tokio::test]
async fn geocode_is_not_retried_on_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/location/geocode"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.geocode("12 Le Loi").await.unwrap_err();
    assert!(matches!(err, GeoError::UnexpectedStatus { status: 503, .. }));
}

#[tokio::test]
async fn bearer_token_is_sent_when_configured() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/location/geocode"))
        .and(header("authorization", "Bearer t0ken"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "latitude": 10.0, "longitude": 106.0 })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut config = ApiClientConfig::new(&server.uri());
    config.token = Some("t0ken".to_owned());
    let client = FindNestApiClient::new(&config).unwrap();
    client.geocode("x").await.expect("authorized request");
}

#[tokio::test]
async fn reverse_geocode_returns_address() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/location/reverse-geocode"))
        .and(query_param("lat", "10.8"))
        .and(query_param("lng", "106.7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "street": "45 Nguyen Hue",
            "ward": "Bến Nghé",
            "district": "Quận 1",
            "city": "TP.HCM"
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let address = client
        .reverse_geocode(point(10.8, 106.7))
        .await
        .expect("should reverse geocode");
    assert_eq!(address.street, "45 Nguyen Hue");
    assert_eq!(address.ward, "Bến Nghé");
    assert!(address.is_eligible());
}

#[tokio::test]
async fn reverse_geocode_blank_address_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/location/reverse-geocode"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "street": "",
            "district": null
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    assert!(matches!(
        client.reverse_geocode(point(0.0, 0.0)).await,
        Err(GeoError::NotFound { .. })
    ));
}

#[tokio::test]
async fn search_posts_query_and_origin() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ai/search"))
        .and(body_json(serde_json::json!({
            "query": "studio under 6 million near district 1",
            "location": { "lat": 10.7769, "lng": 106.7009 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "recommendations": [
                {
                    "id": "l-1",
                    "title": "Studio near Ben Thanh",
                    "description": "Furnished",
                    "price": 5500000,
                    "area": 28.0,
                    "address": "12 Le Loi",
                    "location": { "lat": 10.77, "lng": 106.69 },
                    "relevanceScore": 0.93
                }
            ],
            "explanation": "One studio matches"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let response = client
        .search(
            "studio under 6 million near district 1",
            point(10.7769, 106.7009),
        )
        .await
        .expect("should parse search response");

    assert_eq!(response.recommendations.len(), 1);
    assert_eq!(response.recommendations[0].id, "l-1");
    assert_eq!(response.explanation.as_deref(), Some("One studio matches"));
}

#[tokio::test]
async fn search_retries_transient_server_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ai/search"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/ai/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "recommendations": [], "explanation": null })),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let response = client
        .search("anything", point(10.0, 106.0))
        .await
        .expect("second attempt should succeed");
    assert!(response.recommendations.is_empty());
}

#[tokio::test]
async fn search_malformed_body_is_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ai/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    assert!(matches!(
        client.search("q", point(10.0, 106.0)).await,
        Err(GeoError::Deserialize { .. })
    ));
}

#[tokio::test]
async fn route_returns_line_string() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/location/route"))
        .and(query_param("origin", "10.77,106.69"))
        .and(query_param("destination", "10.8,106.7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "geometry": {
                "type": "LineString",
                "coordinates": [[106.69, 10.77], [106.695, 10.785], [106.7, 10.8]]
            },
            "distanceKm": 3.4,
            "durationSec": 540
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let route = client
        .route(point(10.77, 106.69), point(10.8, 106.7))
        .await
        .expect("should parse route");
    assert!(matches!(route.geometry, Geometry::LineString { ref coordinates } if coordinates.len() == 3));
    assert!((route.distance_km - 3.4).abs() < 1e-9);
    assert_eq!(route.to_feature_collection().len(), 1);
}

#[tokio::test]
async fn route_with_point_geometry_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/location/route"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "geometry": { "type": "Point", "coordinates": [106.7, 10.8] },
            "distanceKm": 0,
            "durationSec": 0
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    assert!(matches!(
        client.route(point(10.8, 106.7), point(10.8, 106.7)).await,
        Err(GeoError::InvalidPayload { .. })
    ));
}

#[tokio::test]
async fn client_is_usable_through_geocoder_trait() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/location/geocode"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "latitude": 21.0, "longitude": 105.8 })),
        )
        .mount(&server)
        .await;

    let geocoder: std::sync::Arc<dyn Geocoder> = std::sync::Arc::new(test_client(&server.uri()));
    let coords = geocoder.geocode("Hoàn Kiếm, Hà Nội").await.unwrap();
    assert!((coords.latitude() - 21.0).abs() < 1e-9);
}

#[tokio::test]
async fn style_client_fetches_remote_style() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/styles/streets.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "version": 8,
            "name": "streets",
            "sources": { "vector": { "type": "vector", "url": "https://tiles/x.json" } },
            "layers": []
        })))
        .mount(&server)
        .await;

    let url = format!("{}/styles/streets.json", server.uri());
    let client = StyleClient::new(Some(&url), 5, 0, 0).unwrap();
    let style = client.style_descriptor().await.expect("style should load");
    assert_eq!(style.name, "streets");
    assert!(!style.is_fallback());
}

#[tokio::test]
async fn style_client_rejects_non_style_documents() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/styles/broken.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "hello": 1 })))
        .mount(&server)
        .await;

    let url = format!("{}/styles/broken.json", server.uri());
    let client = StyleClient::new(Some(&url), 5, 0, 0).unwrap();
    assert!(matches!(
        client.style_descriptor().await,
        Err(GeoError::InvalidPayload { .. })
    ));
}
