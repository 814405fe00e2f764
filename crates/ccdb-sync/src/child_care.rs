use std::sync::Arc;

use ccdb_core::{ChildCareKind, Entity, Store};
use ccdb_scraper::{ChildCareParser, FetchOutcome, OdjfsClient};
use chrono::Utc;

use crate::SyncError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Nothing to refresh.
    Idle,
    Refreshed {
        external_url_id: String,
        kind: ChildCareKind,
        /// No detailed record existed before this fetch.
        promoted: bool,
    },
    /// The source has no data; the checked marker advanced.
    Absent { external_url_id: String },
}

/// Fetches detail pages one record per call, oldest first.
///
/// Rate limiting is the caller's job: each call performs at most one fetch.
pub struct ChildCareSynchronizer {
    client: OdjfsClient,
    parser: Arc<dyn ChildCareParser>,
    store: Arc<dyn Store>,
}

impl ChildCareSynchronizer {
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

    /// Refreshes the record selected by the store's oldest-first policy.
    ///
    /// # Errors
    ///
    /// See [`ChildCareSynchronizer::refresh_one`].
    pub async fn refresh_next(&self) -> Result<RefreshOutcome, SyncError> {
        match self.store.oldest_unrefreshed().await? {
            Some(external_url_id) => self.refresh_one(&external_url_id).await,
            None => {
                tracing::debug!("no child care to refresh");
                Ok(RefreshOutcome::Idle)
            }
        }
    }

    /// Fetches and stores one record, bypassing selection.
    ///
    /// On a temporary or unknown response nothing is written, so the same
    /// record is selected again on the next tick.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Fetch`] if the fetch fails or is rejected,
    /// [`SyncError::Parse`] if the page matches no known layout, and
    /// [`SyncError::Store`] if reading or writing the store fails.
    pub async fn refresh_one(&self, external_url_id: &str) -> Result<RefreshOutcome, SyncError> {
        match self.client.fetch_detail(external_url_id).await? {
            FetchOutcome::Document(bytes) => {
                let previous = self.store.get_by_external_id(external_url_id).await?;
                let mut child_care = self
                    .parser
                    .parse_detail(external_url_id, previous.as_ref(), &bytes)
                    .map_err(|source| SyncError::Parse {
                        target: external_url_id.to_string(),
                        source,
                    })?;
                child_care.last_scraped_on = Some(Utc::now());

                self.store.upsert_child_care(&child_care).await?;

                let promoted = !matches!(previous, Some(Entity::ChildCare(_)));
                tracing::info!(
                    external_url_id,
                    kind = %child_care.kind(),
                    promoted,
                    "child care refreshed"
                );
                Ok(RefreshOutcome::Refreshed {
                    external_url_id: external_url_id.to_string(),
                    kind: child_care.kind(),
                    promoted,
                })
            }
            FetchOutcome::Absent => {
                let known = self.store.mark_checked(external_url_id, Utc::now()).await?;
                if known {
                    tracing::info!(external_url_id, "source has no data; marked checked");
                } else {
                    tracing::warn!(external_url_id, "source has no data for an untracked id");
                }
                Ok(RefreshOutcome::Absent {
                    external_url_id: external_url_id.to_string(),
                })
            }
        }
    }
}
