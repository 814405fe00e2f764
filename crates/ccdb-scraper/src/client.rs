//! HTTP client for the state's printable child care listing and detail pages.

use std::time::Duration;

use ccdb_core::{validate_county_name, validate_external_url_id, County};
use reqwest::redirect::Policy;
use reqwest::{Client, Url};

use crate::classify::{classify, Classification};
use crate::error::FetchError;

const LISTING_PATH: &str = "cdc/results1.asp";
const DETAIL_PATH: &str = "cdc/results2.asp";

/// Result of a fetch that reached the source and got a classifiable answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Raw document bytes, handed to a parser unchanged.
    Document(Vec<u8>),
    /// The source confirmed it has no data for the target.
    Absent,
}

/// Fetches county listings and child care detail pages.
///
/// Redirects are never followed because the source redirects to a maintenance
/// page during outages. No cookies are kept between requests.
#[derive(Debug, Clone)]
pub struct OdjfsClient {
    client: Client,
    base_url: Url,
}

impl OdjfsClient {
    /// Creates a client against `base_url` (normally the state host).
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidBaseUrl`] if `base_url` cannot be parsed, or
    /// [`FetchError::Http`] if the underlying `reqwest::Client` cannot be built.
    pub fn new(base_url: &str, user_agent: &str, timeout_secs: u64) -> Result<Self, FetchError> {
        let base_url = parse_base_url(base_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .redirect(Policy::none())
            .gzip(true)
            .deflate(true)
            .build()?;
        Ok(Self { client, base_url })
    }

    /// Fetches the printable listing of every provider in `county`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidRequest`] without touching the network when
    /// the county name is blank or too long, [`FetchError::Temporary`] or
    /// [`FetchError::Unknown`] per the response classification, and
    /// [`FetchError::Http`] on transport failure.
    pub async fn fetch_listing(&self, county: &County) -> Result<FetchOutcome, FetchError> {
        validate_county_name(&county.name)?;
        let url = self.listing_url(county.name.trim())?;
        self.get(url).await
    }

    /// Fetches the printable detail page for one provider.
    ///
    /// # Errors
    ///
    /// Same as [`OdjfsClient::fetch_listing`], with validation applied to the
    /// external URL id.
    pub async fn fetch_detail(&self, external_url_id: &str) -> Result<FetchOutcome, FetchError> {
        validate_external_url_id(external_url_id)?;
        let url = self.detail_url(external_url_id)?;
        self.get(url).await
    }

    pub(crate) fn listing_url(&self, county_name: &str) -> Result<Url, FetchError> {
        let mut url = self.join(LISTING_PATH)?;
        url.query_pairs_mut()
            .append_pair("county", county_name)
            .append_pair("rating", "ALL")
            .append_pair("Printable", "Y")
            .append_pair("ShowAllPages", "Y");
        Ok(url)
    }

    pub(crate) fn detail_url(&self, external_url_id: &str) -> Result<Url, FetchError> {
        let mut url = self.join(DETAIL_PATH)?;
        url.query_pairs_mut()
            .append_pair("provider_number", external_url_id)
            .append_pair("Printable", "Y");
        Ok(url)
    }

    fn join(&self, path: &str) -> Result<Url, FetchError> {
        self.base_url
            .join(path)
            .map_err(|e| FetchError::InvalidBaseUrl {
                base_url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }

    async fn get(&self, url: Url) -> Result<FetchOutcome, FetchError> {
        tracing::debug!(%url, "fetching");
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        match classify(status, &headers, &body) {
            Classification::Success => {
                tracing::debug!(%url, status = status.as_u16(), bytes = body.len(), "fetched document");
                Ok(FetchOutcome::Document(body.to_vec()))
            }
            Classification::Permanent { banner } => {
                tracing::info!(%url, banner, "source reports no data");
                Ok(FetchOutcome::Absent)
            }
            Classification::Temporary(reason) => Err(FetchError::Temporary {
                url: url.to_string(),
                reason,
            }),
            Classification::Unknown => Err(FetchError::Unknown {
                url: url.to_string(),
                status: status.as_u16(),
                body_len: body.len(),
            }),
        }
    }
}

/// Parses the base URL and guarantees a trailing slash so relative joins keep
/// any path prefix.
fn parse_base_url(base_url: &str) -> Result<Url, FetchError> {
    let trimmed = base_url.trim();
    let normalized = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&normalized).map_err(|e| FetchError::InvalidBaseUrl {
        base_url: base_url.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(FetchError::InvalidBaseUrl {
            base_url: base_url.to_string(),
            reason: format!("unsupported scheme \"{}\"", url.scheme()),
        });
    }
    Ok(url)
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
