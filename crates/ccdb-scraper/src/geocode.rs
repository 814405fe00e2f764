//! [`Geocoder`] backed by the MapQuest geocoding API.

use std::time::Duration;

use async_trait::async_trait;
use ccdb_core::{Coordinates, GeocodeError, Geocoder};
use reqwest::{Client, Url};
use serde::Deserialize;

pub const MAPQUEST_BASE_URL: &str = "https://www.mapquestapi.com/";

const ADDRESS_PATH: &str = "geocoding/v1/address";

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    info: ResponseInfo,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct ResponseInfo {
    statuscode: i64,
    #[serde(default)]
    messages: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    #[serde(default)]
    locations: Vec<Location>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Location {
    lat_lng: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

pub struct MapQuestGeocoder {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl std::fmt::Debug for MapQuestGeocoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapQuestGeocoder")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"[redacted]")
            .finish_non_exhaustive()
    }
}

impl MapQuestGeocoder {
    /// Creates a geocoder against the public MapQuest endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Transport`] if the HTTP client cannot be built.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, GeocodeError> {
        Self::with_base_url(MAPQUEST_BASE_URL, api_key, timeout_secs)
    }

    /// Creates a geocoder against an alternative endpoint, e.g. a mock server.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Rejected`] if `base_url` is not a valid URL, or
    /// [`GeocodeError::Transport`] if the HTTP client cannot be built.
    pub fn with_base_url(
        base_url: &str,
        api_key: &str,
        timeout_secs: u64,
    ) -> Result<Self, GeocodeError> {
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base_url = Url::parse(&normalized)
            .map_err(|e| GeocodeError::Rejected(format!("invalid base URL {base_url}: {e}")))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(transport)?;
        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_string(),
        })
    }

    fn address_url(&self, address: &str) -> Result<Url, GeocodeError> {
        let mut url = self
            .base_url
            .join(ADDRESS_PATH)
            .map_err(|e| GeocodeError::Rejected(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("key", &self.api_key)
            .append_pair("location", address)
            .append_pair("maxResults", "1")
            .append_pair("thumbMaps", "false");
        Ok(url)
    }
}

/// The request URL carries the API key, so it is dropped from the error.
fn transport(err: reqwest::Error) -> GeocodeError {
    GeocodeError::Transport(Box::new(err.without_url()))
}

#[async_trait]
impl Geocoder for MapQuestGeocoder {
    async fn geocode(&self, address: &str) -> Result<Coordinates, GeocodeError> {
        let url = self.address_url(address)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Rejected(format!("HTTP {status}")));
        }

        let body: GeocodeResponse = response
            .json()
            .await
            .map_err(transport)?;

        if body.info.statuscode != 0 {
            return Err(GeocodeError::Rejected(format!(
                "status {}: {}",
                body.info.statuscode,
                body.info.messages.join("; ")
            )));
        }

        body.results
            .into_iter()
            .flat_map(|result| result.locations)
            .next()
            .map(|location| Coordinates {
                latitude: location.lat_lng.lat,
                longitude: location.lat_lng.lng,
            })
            .ok_or_else(|| GeocodeError::NoMatch {
                address: address.to_string(),
            })
    }
}
