//! Persistence capability consumed by the synchronizers.
//!
//! Every mutation is keyed by external URL id and must be applied atomically:
//! a reader never observes a half-written record. Implementations live in
//! `ccdb-db` (PostgreSQL) and `ccdb-sync` (in-memory).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{
    validate_county_name, validate_external_url_id, ChildCare, County, Entity, ListingStub,
};

#[derive(Debug, Error)]
pub enum StoreError {
    /// The record violates a constraint and was rejected before any write.
    #[error("invalid record {external_url_id}: {reason}")]
    InvalidRecord {
        external_url_id: String,
        reason: String,
    },

    /// The referenced county is not part of the reference data.
    #[error("unknown county: {0}")]
    UnknownCounty(String),

    /// Connectivity or query failure in the underlying backend.
    #[error("store backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Result of a batch stub upsert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertCounts {
    pub inserted: u64,
    pub updated: u64,
}

impl UpsertCounts {
    #[must_use]
    pub fn total(self) -> u64 {
        self.inserted + self.updated
    }
}

/// Rejects a record whose key or county could never be stored.
///
/// # Errors
///
/// Returns [`StoreError::InvalidRecord`] naming the failed check.
pub fn validate_record_key(external_url_id: &str, county: &str) -> Result<(), StoreError> {
    let invalid = |reason: String| StoreError::InvalidRecord {
        external_url_id: external_url_id.to_string(),
        reason,
    };
    validate_external_url_id(external_url_id).map_err(|e| invalid(e.to_string()))?;
    validate_county_name(county).map_err(|e| invalid(e.to_string()))
}

/// Checks every stub of a listing batch, including that it belongs to `county`.
///
/// # Errors
///
/// Returns [`StoreError::InvalidRecord`] for the first offending stub.
pub fn validate_stub_batch(county: &County, stubs: &[ListingStub]) -> Result<(), StoreError> {
    for stub in stubs {
        validate_record_key(&stub.external_url_id, &stub.county)?;
        if stub.county != county.name {
            return Err(StoreError::InvalidRecord {
                external_url_id: stub.external_url_id.clone(),
                reason: format!(
                    "stub belongs to county {} but was listed under {}",
                    stub.county, county.name
                ),
            });
        }
    }
    Ok(())
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Returns the external URL id that should be fetched next.
    ///
    /// Candidates are all child cares plus every stub that has no child care
    /// yet. The smallest selection key wins, with never-touched records first
    /// and ties broken by external URL id ascending.
    async fn oldest_unrefreshed(&self) -> Result<Option<String>, StoreError>;

    /// Returns the child care for `external_url_id`, or the stub if no child
    /// care has been written yet.
    async fn get_by_external_id(&self, external_url_id: &str)
        -> Result<Option<Entity>, StoreError>;

    /// Inserts or refreshes the shallow fields of every stub in one
    /// transaction. `last_checked_on` of existing stubs is preserved.
    async fn upsert_stubs(
        &self,
        county: &County,
        stubs: &[ListingStub],
    ) -> Result<UpsertCounts, StoreError>;

    /// Writes a full child care record in one transaction.
    ///
    /// `last_scraped_on` never moves backwards and geocoding columns of an
    /// existing row are left untouched.
    async fn upsert_child_care(&self, child_care: &ChildCare) -> Result<(), StoreError>;

    /// Records that `external_url_id` was checked and confirmed absent.
    ///
    /// Returns `false` when neither a stub nor a child care exists for the id.
    async fn mark_checked(
        &self,
        external_url_id: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// County whose listing was processed least recently, never-scraped first.
    async fn oldest_county(&self) -> Result<Option<County>, StoreError>;

    async fn mark_county_scraped(&self, name: &str, at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Child cares with an address whose coordinates are missing or older than
    /// the last fetch. Never-attempted records come first, then the least
    /// recently attempted, ties by external URL id.
    async fn geocode_candidates(&self, limit: usize) -> Result<Vec<ChildCare>, StoreError>;

    /// Stores coordinates and stamps both `last_geocoded_on` and
    /// `last_geocode_attempt_on`.
    async fn record_geocode(
        &self,
        external_url_id: &str,
        latitude: f64,
        longitude: f64,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Advances `last_geocode_attempt_on` after a failed lookup. Coordinates
    /// and `last_geocoded_on` are left as they are.
    async fn record_geocode_failure(
        &self,
        external_url_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}
