//! Integration tests for `MapQuestGeocoder` against a local mock server.

use ccdb_core::{GeocodeError, Geocoder};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ccdb_scraper::MapQuestGeocoder;

const ADDRESS: &str = "123 Main St, Columbus, OH 43215";

fn geocoder(server: &MockServer) -> MapQuestGeocoder {
    MapQuestGeocoder::with_base_url(&server.uri(), "test-key", 5)
        .expect("failed to build test geocoder")
}

#[tokio::test]
async fn returns_first_location() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geocoding/v1/address"))
        .and(query_param("key", "test-key"))
        .and(query_param("location", ADDRESS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "info": { "statuscode": 0, "messages": [] },
            "results": [{
                "providedLocation": { "location": ADDRESS },
                "locations": [
                    { "latLng": { "lat": 39.961_176, "lng": -82.998_794 }, "geocodeQuality": "ADDRESS" },
                    { "latLng": { "lat": 0.0, "lng": 0.0 }, "geocodeQuality": "COUNTRY" }
                ]
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let coordinates = geocoder(&server).geocode(ADDRESS).await.unwrap();

    assert!((coordinates.latitude - 39.961_176).abs() < 1e-9);
    assert!((coordinates.longitude + 82.998_794).abs() < 1e-9);
}

#[tokio::test]
async fn empty_locations_is_no_match() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geocoding/v1/address"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "info": { "statuscode": 0, "messages": [] },
            "results": [{ "locations": [] }]
        })))
        .mount(&server)
        .await;

    let err = geocoder(&server).geocode(ADDRESS).await.unwrap_err();

    assert!(
        matches!(err, GeocodeError::NoMatch { ref address } if address == ADDRESS),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn nonzero_status_code_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geocoding/v1/address"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "info": { "statuscode": 400, "messages": ["Illegal argument from request"] },
            "results": []
        })))
        .mount(&server)
        .await;

    let err = geocoder(&server).geocode(ADDRESS).await.unwrap_err();

    assert!(
        matches!(err, GeocodeError::Rejected(ref msg) if msg.contains("Illegal argument")),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn http_error_status_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geocoding/v1/address"))
        .respond_with(ResponseTemplate::new(403).set_body_string("The AppKey is invalid"))
        .mount(&server)
        .await;

    let err = geocoder(&server).geocode(ADDRESS).await.unwrap_err();

    assert!(
        matches!(err, GeocodeError::Rejected(ref msg) if msg.contains("403")),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn malformed_body_is_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geocoding/v1/address"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = geocoder(&server).geocode(ADDRESS).await.unwrap_err();

    assert!(matches!(err, GeocodeError::Transport(_)), "got: {err:?}");
    assert!(!err.to_string().contains("test-key"), "got: {err}");
}

#[tokio::test]
async fn unreachable_server_error_hides_api_key() {
    let geocoder = MapQuestGeocoder::with_base_url("http://127.0.0.1:9/", "SECRET-KEY-123", 2)
        .expect("failed to build test geocoder");

    let err = geocoder.geocode(ADDRESS).await.unwrap_err();

    assert!(matches!(err, GeocodeError::Transport(_)), "got: {err:?}");
    assert!(!err.to_string().contains("SECRET-KEY-123"), "got: {err}");
    assert!(!format!("{err:?}").contains("SECRET-KEY-123"), "got: {err:?}");
}

#[test]
fn debug_output_redacts_api_key() {
    let geocoder = MapQuestGeocoder::new("super-secret", 5).unwrap();
    let debug = format!("{geocoder:?}");
    assert!(!debug.contains("super-secret"));
    assert!(debug.contains("[redacted]"));
}
