//! Database operations for the `counties` table.

use ccdb_core::County;
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};

use crate::DbError;

/// A row from the `counties` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CountyRow {
    pub name: String,
    pub last_scraped_on: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CountyRow> for County {
    fn from(row: CountyRow) -> Self {
        County {
            name: row.name,
            last_scraped_on: row.last_scraped_on,
        }
    }
}

/// Insert every county that is not already present.
///
/// Existing rows, including their `last_scraped_on`, are left as they are.
/// Returns the number of counties newly inserted. Runs in one transaction.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_counties(pool: &PgPool, counties: &[County]) -> Result<u64, DbError> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0u64;

    for county in counties {
        let result = sqlx::query(
            "INSERT INTO counties (name) VALUES ($1) \
             ON CONFLICT (name) DO NOTHING",
        )
        .bind(&county.name)
        .execute(&mut *tx)
        .await?;
        inserted += result.rows_affected();
    }

    tx.commit().await?;
    Ok(inserted)
}

pub(crate) async fn oldest_county<'e>(
    executor: impl PgExecutor<'e>,
) -> Result<Option<CountyRow>, DbError> {
    let row = sqlx::query_as::<_, CountyRow>(
        "SELECT name, last_scraped_on, created_at, updated_at FROM counties \
         ORDER BY last_scraped_on ASC NULLS FIRST, name ASC \
         LIMIT 1",
    )
    .fetch_optional(executor)
    .await?;
    Ok(row)
}

/// Returns `false` when no county has this name.
pub(crate) async fn mark_county_scraped<'e>(
    executor: impl PgExecutor<'e>,
    name: &str,
    at: DateTime<Utc>,
) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE counties \
         SET last_scraped_on = GREATEST(last_scraped_on, $2), updated_at = NOW() \
         WHERE name = $1",
    )
    .bind(name)
    .bind(at)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}
