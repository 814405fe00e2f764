use std::sync::Arc;

use ccdb_core::{GeocodeError, Geocoder, Store};
use chrono::Utc;

use crate::SyncError;

#[derive(Debug)]
pub struct GeocodeFailure {
    pub external_url_id: String,
    pub error: GeocodeError,
}

#[derive(Debug, Default)]
pub struct GeocodeReport {
    pub attempted: usize,
    pub geocoded: usize,
    pub failures: Vec<GeocodeFailure>,
}

/// Fills in coordinates for records whose address changed or was never geocoded.
pub struct GeocodeSynchronizer {
    store: Arc<dyn Store>,
    geocoder: Arc<dyn Geocoder>,
}

impl GeocodeSynchronizer {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, geocoder: Arc<dyn Geocoder>) -> Self {
        Self { store, geocoder }
    }

    /// Geocodes up to `limit` candidates.
    ///
    /// A failed lookup is recorded in the report and stamps the record's
    /// attempt time, leaving its coordinates untouched. The stamp moves the
    /// record behind every candidate not yet tried, so repeated failures
    /// cannot crowd out the rest. The pass continues with the next candidate.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Store`] if the store cannot be read or written.
    pub async fn geocode_pass(&self, limit: usize) -> Result<GeocodeReport, SyncError> {
        let candidates = self.store.geocode_candidates(limit).await?;
        let mut report = GeocodeReport::default();

        for child_care in candidates {
            let Some(address) = child_care.full_address() else {
                continue;
            };
            report.attempted += 1;

            match self.geocoder.geocode(&address).await {
                Ok(coordinates) => {
                    self.store
                        .record_geocode(
                            &child_care.external_url_id,
                            coordinates.latitude,
                            coordinates.longitude,
                            Utc::now(),
                        )
                        .await?;
                    report.geocoded += 1;
                }
                Err(error) => {
                    self.store
                        .record_geocode_failure(&child_care.external_url_id, Utc::now())
                        .await?;
                    tracing::warn!(
                        external_url_id = %child_care.external_url_id,
                        error = %error,
                        "geocoding failed"
                    );
                    report.failures.push(GeocodeFailure {
                        external_url_id: child_care.external_url_id,
                        error,
                    });
                }
            }
        }

        tracing::info!(
            attempted = report.attempted,
            geocoded = report.geocoded,
            failed = report.failures.len(),
            "geocode pass finished"
        );
        Ok(report)
    }
}
