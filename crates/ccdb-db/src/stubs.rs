//! Database operations for the `child_care_stubs` table.

use ccdb_core::{ChildCareKind, ListingStub};
use chrono::{DateTime, Utc};
use sqlx::PgExecutor;

use crate::DbError;

/// A row from the `child_care_stubs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StubRow {
    pub id: i64,
    pub external_url_id: String,
    pub county: String,
    pub child_care_type: String,
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub last_checked_on: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<StubRow> for ListingStub {
    type Error = DbError;

    fn try_from(row: StubRow) -> Result<Self, Self::Error> {
        let kind = parse_kind(&row.external_url_id, &row.child_care_type)?;
        Ok(ListingStub {
            external_url_id: row.external_url_id,
            county: row.county,
            kind,
            name: row.name,
            address: row.address,
            city: row.city,
            last_checked_on: row.last_checked_on,
        })
    }
}

pub(crate) fn parse_kind(external_url_id: &str, value: &str) -> Result<ChildCareKind, DbError> {
    ChildCareKind::from_discriminator(value).ok_or_else(|| DbError::InvalidRow {
        external_url_id: external_url_id.to_string(),
        reason: format!("unknown child_care_type '{value}'"),
    })
}

pub(crate) async fn get_stub<'e>(
    executor: impl PgExecutor<'e>,
    external_url_id: &str,
) -> Result<Option<StubRow>, DbError> {
    let row = sqlx::query_as::<_, StubRow>(
        "SELECT id, external_url_id, county, child_care_type, name, address, city, \
                last_checked_on, created_at, updated_at \
         FROM child_care_stubs \
         WHERE external_url_id = $1",
    )
    .bind(external_url_id)
    .fetch_optional(executor)
    .await?;
    Ok(row)
}

/// Insert new stubs and refresh the shallow fields of existing ones.
///
/// Returns `(new_count, updated_count)`. The whole batch is one
/// `INSERT … SELECT * FROM UNNEST(…) ON CONFLICT` statement.
/// `last_checked_on` of existing rows is never overwritten.
pub(crate) async fn upsert_stubs<'e>(
    executor: impl PgExecutor<'e>,
    stubs: &[ListingStub],
) -> Result<(u64, u64), DbError> {
    if stubs.is_empty() {
        return Ok((0, 0));
    }

    let mut external_url_ids: Vec<&str> = Vec::with_capacity(stubs.len());
    let mut counties: Vec<&str> = Vec::with_capacity(stubs.len());
    let mut kinds: Vec<&str> = Vec::with_capacity(stubs.len());
    let mut names: Vec<&str> = Vec::with_capacity(stubs.len());
    let mut addresses: Vec<Option<&str>> = Vec::with_capacity(stubs.len());
    let mut cities: Vec<Option<&str>> = Vec::with_capacity(stubs.len());

    for stub in stubs {
        external_url_ids.push(&stub.external_url_id);
        counties.push(&stub.county);
        kinds.push(stub.kind.as_str());
        names.push(&stub.name);
        addresses.push(stub.address.as_deref());
        cities.push(stub.city.as_deref());
    }

    let rows: Vec<bool> = sqlx::query_scalar::<_, bool>(
        "INSERT INTO child_care_stubs \
             (external_url_id, county, child_care_type, name, address, city) \
         SELECT * FROM UNNEST($1::text[], $2::text[], $3::text[], $4::text[], $5::text[], $6::text[]) \
         ON CONFLICT (external_url_id) DO UPDATE SET \
             county          = EXCLUDED.county, \
             child_care_type = EXCLUDED.child_care_type, \
             name            = EXCLUDED.name, \
             address         = EXCLUDED.address, \
             city            = EXCLUDED.city, \
             updated_at      = NOW() \
         RETURNING (xmax = 0) AS is_new",
    )
    .bind(&external_url_ids)
    .bind(&counties)
    .bind(&kinds)
    .bind(&names)
    .bind(&addresses)
    .bind(&cities)
    .fetch_all(executor)
    .await?;

    let new_count = rows.iter().filter(|&&is_new| is_new).count() as u64;
    let updated_count = rows.len() as u64 - new_count;

    Ok((new_count, updated_count))
}

/// Returns the number of rows touched (zero or one).
pub(crate) async fn mark_stub_checked<'e>(
    executor: impl PgExecutor<'e>,
    external_url_id: &str,
    at: DateTime<Utc>,
) -> Result<u64, DbError> {
    let result = sqlx::query(
        "UPDATE child_care_stubs \
         SET last_checked_on = GREATEST(last_checked_on, $2), updated_at = NOW() \
         WHERE external_url_id = $1",
    )
    .bind(external_url_id)
    .bind(at)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}
