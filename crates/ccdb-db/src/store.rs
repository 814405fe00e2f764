//! PostgreSQL implementation of [`Store`].

use async_trait::async_trait;
use ccdb_core::{
    validate_record_key, validate_stub_batch, ChildCare, County, Entity, ListingStub, Store,
    StoreError, UpsertCounts,
};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{child_cares, counties, stubs, DbError};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Translates constraint violations into domain errors; everything else is a
/// backend failure.
fn write_error(err: DbError, external_url_id: &str, county: &str) -> StoreError {
    if let DbError::Sqlx(sqlx::Error::Database(db_err)) = &err {
        if db_err.is_foreign_key_violation() {
            return StoreError::UnknownCounty(county.to_string());
        }
        if db_err.is_check_violation() {
            return StoreError::InvalidRecord {
                external_url_id: external_url_id.to_string(),
                reason: db_err.message().to_string(),
            };
        }
    }
    err.into()
}

fn backend(err: sqlx::Error) -> StoreError {
    DbError::from(err).into()
}

#[async_trait]
impl Store for PgStore {
    async fn oldest_unrefreshed(&self) -> Result<Option<String>, StoreError> {
        let id = sqlx::query_scalar::<_, String>(
            "SELECT external_url_id FROM ( \
                 SELECT external_url_id, GREATEST(last_scraped_on, last_checked_on) AS touched \
                 FROM child_cares \
                 UNION ALL \
                 SELECT s.external_url_id, s.last_checked_on AS touched \
                 FROM child_care_stubs s \
                 WHERE NOT EXISTS ( \
                     SELECT 1 FROM child_cares c WHERE c.external_url_id = s.external_url_id) \
             ) candidates \
             ORDER BY touched ASC NULLS FIRST, external_url_id ASC \
             LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        Ok(id)
    }

    async fn get_by_external_id(
        &self,
        external_url_id: &str,
    ) -> Result<Option<Entity>, StoreError> {
        if let Some(row) = child_cares::get_child_care(&self.pool, external_url_id).await? {
            return Ok(Some(Entity::ChildCare(ChildCare::try_from(row)?)));
        }
        if let Some(row) = stubs::get_stub(&self.pool, external_url_id).await? {
            return Ok(Some(Entity::Stub(ListingStub::try_from(row)?)));
        }
        Ok(None)
    }

    async fn upsert_stubs(
        &self,
        county: &County,
        batch: &[ListingStub],
    ) -> Result<UpsertCounts, StoreError> {
        validate_stub_batch(county, batch)?;

        let mut tx = self.pool.begin().await.map_err(backend)?;
        let (inserted, updated) = stubs::upsert_stubs(&mut *tx, batch)
            .await
            .map_err(|e| write_error(e, &county.name, &county.name))?;
        tx.commit().await.map_err(backend)?;

        tracing::debug!(county = %county.name, inserted, updated, "upserted stubs");
        Ok(UpsertCounts { inserted, updated })
    }

    async fn upsert_child_care(&self, child_care: &ChildCare) -> Result<(), StoreError> {
        validate_record_key(&child_care.external_url_id, &child_care.county)?;

        let mut tx = self.pool.begin().await.map_err(backend)?;
        let is_new = child_cares::upsert_child_care(&mut *tx, child_care)
            .await
            .map_err(|e| write_error(e, &child_care.external_url_id, &child_care.county))?;
        tx.commit().await.map_err(backend)?;

        tracing::debug!(
            external_url_id = %child_care.external_url_id,
            kind = %child_care.kind(),
            is_new,
            "upserted child care"
        );
        Ok(())
    }

    async fn mark_checked(
        &self,
        external_url_id: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;
        let child_care_rows =
            child_cares::mark_child_care_checked(&mut *tx, external_url_id, at).await?;
        let stub_rows = stubs::mark_stub_checked(&mut *tx, external_url_id, at).await?;
        tx.commit().await.map_err(backend)?;
        Ok(child_care_rows + stub_rows > 0)
    }

    async fn oldest_county(&self) -> Result<Option<County>, StoreError> {
        let row = counties::oldest_county(&self.pool).await?;
        Ok(row.map(County::from))
    }

    async fn mark_county_scraped(&self, name: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        if counties::mark_county_scraped(&self.pool, name, at).await? {
            Ok(())
        } else {
            Err(StoreError::UnknownCounty(name.to_string()))
        }
    }

    async fn geocode_candidates(&self, limit: usize) -> Result<Vec<ChildCare>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        child_cares::geocode_candidates(&self.pool, limit)
            .await?
            .into_iter()
            .map(|row| ChildCare::try_from(row).map_err(StoreError::from))
            .collect()
    }

    async fn record_geocode(
        &self,
        external_url_id: &str,
        latitude: f64,
        longitude: f64,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let found =
            child_cares::record_geocode(&self.pool, external_url_id, latitude, longitude, at)
                .await?;
        if found {
            Ok(())
        } else {
            Err(unknown_child_care(external_url_id))
        }
    }

    async fn record_geocode_failure(
        &self,
        external_url_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if child_cares::record_geocode_failure(&self.pool, external_url_id, at).await? {
            Ok(())
        } else {
            Err(unknown_child_care(external_url_id))
        }
    }
}

fn unknown_child_care(external_url_id: &str) -> StoreError {
    StoreError::InvalidRecord {
        external_url_id: external_url_id.to_string(),
        reason: "no child care with this id".to_string(),
    }
}
