//! Integration tests for `OdjfsClient` response classification.
//!
//! Uses `wiremock` to stand up a local HTTP server for each test so no real
//! network traffic is made.

use ccdb_core::County;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ccdb_scraper::classify::{PERMANENT_BANNERS, TEMPORARY_BANNERS};
use ccdb_scraper::{FetchError, FetchOutcome, OdjfsClient, TemporaryReason};

const USER_AGENT: &str = "ccdb-test/0.1";

fn test_client(server: &MockServer) -> OdjfsClient {
    OdjfsClient::new(&server.uri(), USER_AGENT, 5).expect("failed to build test OdjfsClient")
}

fn error_page(banner: &str) -> String {
    format!(
        "<html><body><font face=\"Arial\" size=2>\
         <p>Microsoft OLE DB Provider for Oracle</font> \
         <font face=\"Arial\" size=2>{banner}</font></p></body></html>"
    )
}

async fn mount_detail(server: &MockServer, id: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/cdc/results2.asp"))
        .and(query_param("provider_number", id))
        .respond_with(response)
        .mount(server)
        .await;
}

// ---------------------------------------------------------------------------
// Request shape
// ---------------------------------------------------------------------------

#[tokio::test]
async fn listing_request_carries_county_query_and_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cdc/results1.asp"))
        .and(query_param("county", "FRANKLIN"))
        .and(query_param("rating", "ALL"))
        .and(query_param("Printable", "Y"))
        .and(query_param("ShowAllPages", "Y"))
        .and(header("user-agent", USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>listing</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = test_client(&server)
        .fetch_listing(&County::new("FRANKLIN"))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        FetchOutcome::Document(b"<html>listing</html>".to_vec())
    );
}

#[tokio::test]
async fn detail_request_carries_provider_number() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cdc/results2.asp"))
        .and(query_param("provider_number", "AAAA"))
        .and(query_param("Printable", "Y"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>detail</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = test_client(&server).fetch_detail("AAAA").await.unwrap();

    assert!(matches!(outcome, FetchOutcome::Document(ref b) if b == b"<html>detail</html>"));
}

// ---------------------------------------------------------------------------
// Invalid targets never reach the network
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_targets_are_rejected_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let client = test_client(&server);

    for county in ["", "   ", "MUSKINGUMXYZ"] {
        let err = client.fetch_listing(&County::new(county)).await.unwrap_err();
        assert!(
            matches!(err, FetchError::InvalidRequest(_)),
            "county {county:?}: expected InvalidRequest, got: {err:?}"
        );
    }

    let overlong = "A".repeat(19);
    for id in ["", overlong.as_str(), "AA&BB"] {
        let err = client.fetch_detail(id).await.unwrap_err();
        assert!(
            matches!(err, FetchError::InvalidRequest(_)),
            "id {id:?}: expected InvalidRequest, got: {err:?}"
        );
        assert!(!err.is_retryable());
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_ok_body_is_a_document() {
    let server = MockServer::start().await;
    mount_detail(&server, "AAAA", ResponseTemplate::new(200)).await;

    let outcome = test_client(&server).fetch_detail("AAAA").await.unwrap();

    assert_eq!(outcome, FetchOutcome::Document(Vec::new()));
}

#[tokio::test]
async fn server_error_with_content_is_a_document() {
    let server = MockServer::start().await;
    mount_detail(
        &server,
        "AAAA",
        ResponseTemplate::new(500).set_body_string("<html>partial page</html>"),
    )
    .await;

    let outcome = test_client(&server).fetch_detail("AAAA").await.unwrap();

    assert!(matches!(outcome, FetchOutcome::Document(_)));
}

#[tokio::test]
async fn every_temporary_banner_is_a_retryable_error() {
    for &banner in TEMPORARY_BANNERS {
        let server = MockServer::start().await;
        mount_detail(
            &server,
            "CCCC",
            ResponseTemplate::new(500).set_body_string(error_page(banner)),
        )
        .await;

        let err = test_client(&server).fetch_detail("CCCC").await.unwrap_err();

        assert!(
            matches!(
                err,
                FetchError::Temporary { reason: TemporaryReason::Banner(b), .. } if b == banner
            ),
            "banner {banner:?}: got {err:?}"
        );
        assert!(err.is_retryable());
    }
}

#[tokio::test]
async fn every_permanent_banner_is_absent() {
    for &banner in PERMANENT_BANNERS {
        let server = MockServer::start().await;
        mount_detail(
            &server,
            "AAAA",
            ResponseTemplate::new(500).set_body_string(error_page(banner)),
        )
        .await;

        let outcome = test_client(&server).fetch_detail("AAAA").await.unwrap();

        assert_eq!(outcome, FetchOutcome::Absent, "banner {banner:?}");
    }
}

#[tokio::test]
async fn redirect_to_maintenance_is_temporary_and_not_followed() {
    let server = MockServer::start().await;
    mount_detail(
        &server,
        "AAAA",
        ResponseTemplate::new(302).insert_header("Location", "/maintenance.htm"),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/maintenance.htm"))
        .respond_with(ResponseTemplate::new(200).set_body_string("down for maintenance"))
        .expect(0)
        .mount(&server)
        .await;

    let err = test_client(&server).fetch_detail("AAAA").await.unwrap_err();

    assert!(
        matches!(
            err,
            FetchError::Temporary {
                reason: TemporaryReason::Redirect { status: 302, ref location },
                ..
            } if location.as_deref() == Some("/maintenance.htm")
        ),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn server_error_with_empty_body_is_unknown() {
    let server = MockServer::start().await;
    mount_detail(&server, "AAAA", ResponseTemplate::new(500)).await;

    let err = test_client(&server).fetch_detail("AAAA").await.unwrap_err();

    assert!(
        matches!(err, FetchError::Unknown { status: 500, body_len: 0, .. }),
        "got: {err:?}"
    );
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn not_found_is_unknown() {
    let server = MockServer::start().await;
    mount_detail(
        &server,
        "AAAA",
        ResponseTemplate::new(404).set_body_string("not here"),
    )
    .await;

    let err = test_client(&server).fetch_detail("AAAA").await.unwrap_err();

    assert!(
        matches!(err, FetchError::Unknown { status: 404, .. }),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn connection_failure_is_a_retryable_http_error() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let client = OdjfsClient::new(&uri, USER_AGENT, 2).unwrap();
    let err = client.fetch_detail("AAAA").await.unwrap_err();

    assert!(matches!(err, FetchError::Http(_)), "got: {err:?}");
    assert!(err.is_retryable());
}
