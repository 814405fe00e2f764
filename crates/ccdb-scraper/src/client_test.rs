use super::*;

fn client(base_url: &str) -> OdjfsClient {
    OdjfsClient::new(base_url, "ccdb-test/0.1", 5).unwrap()
}

#[test]
fn listing_url_has_expected_query() {
    let url = client("http://www.odjfs.state.oh.us")
        .listing_url("FRANKLIN")
        .unwrap();
    assert_eq!(
        url.as_str(),
        "http://www.odjfs.state.oh.us/cdc/results1.asp?county=FRANKLIN&rating=ALL&Printable=Y&ShowAllPages=Y"
    );
}

#[test]
fn listing_url_encodes_spaces() {
    let url = client("http://www.odjfs.state.oh.us")
        .listing_url("VAN WERT")
        .unwrap();
    assert!(url.as_str().contains("county=VAN+WERT"), "got: {url}");
}

#[test]
fn detail_url_has_expected_query() {
    let url = client("http://www.odjfs.state.oh.us/")
        .detail_url("CCCCCCCCCCCCCCCCCC")
        .unwrap();
    assert_eq!(
        url.as_str(),
        "http://www.odjfs.state.oh.us/cdc/results2.asp?provider_number=CCCCCCCCCCCCCCCCCC&Printable=Y"
    );
}

#[test]
fn base_url_path_prefix_is_kept() {
    let url = client("http://127.0.0.1:8080/mirror").detail_url("AAAA").unwrap();
    assert_eq!(
        url.as_str(),
        "http://127.0.0.1:8080/mirror/cdc/results2.asp?provider_number=AAAA&Printable=Y"
    );
}

#[test]
fn rejects_unparseable_base_url() {
    let err = OdjfsClient::new("not a url", "ccdb-test/0.1", 5).unwrap_err();
    assert!(
        matches!(err, FetchError::InvalidBaseUrl { .. }),
        "expected InvalidBaseUrl, got: {err:?}"
    );
}

#[test]
fn rejects_non_http_scheme() {
    let err = OdjfsClient::new("ftp://example.com", "ccdb-test/0.1", 5).unwrap_err();
    assert!(
        matches!(err, FetchError::InvalidBaseUrl { ref reason, .. } if reason.contains("ftp")),
        "expected InvalidBaseUrl, got: {err:?}"
    );
}
