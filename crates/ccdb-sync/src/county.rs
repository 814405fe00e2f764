use std::sync::Arc;

use ccdb_core::{County, Store};
use ccdb_scraper::{ChildCareParser, FetchOutcome, OdjfsClient};
use chrono::Utc;

use crate::SyncError;

/// What one listing refresh did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingReport {
    pub county: String,
    /// Distinct providers on the listing page.
    pub found: usize,
    pub inserted: u64,
    pub updated: u64,
    /// The source confirmed it has no listing for the county.
    pub absent: bool,
}

/// Discovers stubs from county listing pages.
pub struct CountySynchronizer {
    client: OdjfsClient,
    parser: Arc<dyn ChildCareParser>,
    store: Arc<dyn Store>,
}

impl CountySynchronizer {
    #[must_use]
    pub fn new(
        client: OdjfsClient,
        parser: Arc<dyn ChildCareParser>,
        store: Arc<dyn Store>,
    ) -> Self {
        Self {
            client,
            parser,
            store,
        }
    }

    /// Fetches `county`'s listing and upserts every stub on it.
    ///
    /// An absent listing or one without providers is zero stubs, not an
    /// error. Nothing is written unless the whole page parses.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Fetch`] for temporary, unknown, or invalid
    /// requests, [`SyncError::Parse`] if a provider row is unreadable, and
    /// [`SyncError::Store`] if the batch upsert fails.
    pub async fn refresh_listing(&self, county: &County) -> Result<ListingReport, SyncError> {
        let outcome = self.client.fetch_listing(county).await?;

        let (stubs, absent) = match outcome {
            FetchOutcome::Document(bytes) => {
                let stubs = self.parser.parse_listing(county, &bytes).map_err(|source| {
                    SyncError::Parse {
                        target: county.name.clone(),
                        source,
                    }
                })?;
                (stubs, false)
            }
            FetchOutcome::Absent => (Vec::new(), true),
        };

        let counts = self.store.upsert_stubs(county, &stubs).await?;
        let report = ListingReport {
            county: county.name.clone(),
            found: stubs.len(),
            inserted: counts.inserted,
            updated: counts.updated,
            absent,
        };

        tracing::info!(
            county = %report.county,
            found = report.found,
            inserted = report.inserted,
            updated = report.updated,
            absent = report.absent,
            "listing refreshed"
        );
        Ok(report)
    }

    /// Refreshes the county whose listing was processed least recently and
    /// marks it scraped. Returns `None` when there are no counties.
    ///
    /// # Errors
    ///
    /// Same as [`CountySynchronizer::refresh_listing`]. On error the county
    /// is not marked, so it is picked again next time.
    pub async fn refresh_next_county(&self) -> Result<Option<ListingReport>, SyncError> {
        let Some(county) = self.store.oldest_county().await? else {
            tracing::info!("no counties to refresh");
            return Ok(None);
        };

        let report = self.refresh_listing(&county).await?;
        self.store
            .mark_county_scraped(&county.name, Utc::now())
            .await?;
        Ok(Some(report))
    }
}
