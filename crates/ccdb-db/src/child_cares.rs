//! Database operations for the `child_cares` table.

use ccdb_core::{ChildCare, ChildCareDetail, ChildCareKind, DetailedFields};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgExecutor;

use crate::stubs::parse_kind;
use crate::DbError;

const CHILD_CARE_COLUMNS: &str = "id, external_url_id, county, child_care_type, \
    detailed_child_care_type, external_id, name, address, city, state, zip_code, phone_number, \
    program_email, license_begin_date, license_expiration_date, sutq_rating, administrators, \
    infants, young_toddlers, older_toddlers, preschoolers, school_age, child_care_food_program, \
    center_status, last_scraped_on, last_checked_on, latitude, longitude, last_geocoded_on, \
    last_geocode_attempt_on, created_at, updated_at";

/// A row from the `child_cares` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChildCareRow {
    pub id: i64,
    pub external_url_id: String,
    pub county: String,
    pub child_care_type: String,
    pub detailed_child_care_type: Option<String>,
    pub external_id: Option<String>,
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub phone_number: Option<String>,
    pub program_email: Option<String>,
    pub license_begin_date: Option<NaiveDate>,
    pub license_expiration_date: Option<NaiveDate>,
    pub sutq_rating: Option<i16>,
    pub administrators: Option<String>,
    pub infants: Option<bool>,
    pub young_toddlers: Option<bool>,
    pub older_toddlers: Option<bool>,
    pub preschoolers: Option<bool>,
    pub school_age: Option<bool>,
    pub child_care_food_program: Option<bool>,
    pub center_status: Option<String>,
    pub last_scraped_on: Option<DateTime<Utc>>,
    pub last_checked_on: Option<DateTime<Utc>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub last_geocoded_on: Option<DateTime<Utc>>,
    pub last_geocode_attempt_on: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChildCareRow {
    fn detailed_fields(&self) -> DetailedFields {
        DetailedFields {
            program_email: self.program_email.clone(),
            license_begin_date: self.license_begin_date,
            license_expiration_date: self.license_expiration_date,
            sutq_rating: self.sutq_rating,
            administrators: self.administrators.clone(),
            infants: self.infants.unwrap_or(false),
            young_toddlers: self.young_toddlers.unwrap_or(false),
            older_toddlers: self.older_toddlers.unwrap_or(false),
            preschoolers: self.preschoolers.unwrap_or(false),
            school_age: self.school_age.unwrap_or(false),
            child_care_food_program: self.child_care_food_program.unwrap_or(false),
        }
    }

    fn detail(&self) -> Result<ChildCareDetail, DbError> {
        let kind = parse_kind(&self.external_url_id, &self.child_care_type)?;
        let expected = kind.has_detailed_variant().then(|| kind.as_str());
        if self.detailed_child_care_type.as_deref() != expected {
            return Err(DbError::InvalidRow {
                external_url_id: self.external_url_id.clone(),
                reason: format!(
                    "detailed_child_care_type {:?} does not match child_care_type '{}'",
                    self.detailed_child_care_type, self.child_care_type
                ),
            });
        }

        Ok(match kind {
            ChildCareKind::TypeAHome => ChildCareDetail::TypeAHome(self.detailed_fields()),
            ChildCareKind::LicensedCenter => ChildCareDetail::LicensedCenter {
                fields: self.detailed_fields(),
                center_status: self.center_status.clone(),
            },
            ChildCareKind::TypeBHome => ChildCareDetail::TypeBHome,
            ChildCareKind::DayCamp => ChildCareDetail::DayCamp,
        })
    }
}

impl TryFrom<ChildCareRow> for ChildCare {
    type Error = DbError;

    fn try_from(row: ChildCareRow) -> Result<Self, Self::Error> {
        let detail = row.detail()?;
        Ok(ChildCare {
            external_url_id: row.external_url_id,
            county: row.county,
            external_id: row.external_id,
            name: row.name,
            address: row.address,
            city: row.city,
            state: row.state,
            zip_code: row.zip_code,
            phone_number: row.phone_number,
            last_scraped_on: row.last_scraped_on,
            last_checked_on: row.last_checked_on,
            latitude: row.latitude,
            longitude: row.longitude,
            last_geocoded_on: row.last_geocoded_on,
            last_geocode_attempt_on: row.last_geocode_attempt_on,
            detail,
        })
    }
}

pub(crate) async fn get_child_care<'e>(
    executor: impl PgExecutor<'e>,
    external_url_id: &str,
) -> Result<Option<ChildCareRow>, DbError> {
    let row = sqlx::query_as::<_, ChildCareRow>(&format!(
        "SELECT {CHILD_CARE_COLUMNS} FROM child_cares WHERE external_url_id = $1"
    ))
    .bind(external_url_id)
    .fetch_optional(executor)
    .await?;
    Ok(row)
}

/// Insert or fully overwrite a child care.
///
/// `last_scraped_on` and `last_checked_on` only move forward. Coordinates
/// and geocoding timestamps of an existing row are left untouched.
pub(crate) async fn upsert_child_care<'e>(
    executor: impl PgExecutor<'e>,
    child_care: &ChildCare,
) -> Result<bool, DbError> {
    let fields = child_care.detail.detailed_fields();
    let center_status = match &child_care.detail {
        ChildCareDetail::LicensedCenter { center_status, .. } => center_status.as_deref(),
        _ => None,
    };

    let is_new: bool = sqlx::query_scalar(
        "INSERT INTO child_cares ( \
             external_url_id, county, child_care_type, detailed_child_care_type, external_id, \
             name, address, city, state, zip_code, phone_number, \
             program_email, license_begin_date, license_expiration_date, sutq_rating, \
             administrators, infants, young_toddlers, older_toddlers, preschoolers, school_age, \
             child_care_food_program, center_status, \
             last_scraped_on, last_checked_on, latitude, longitude, last_geocoded_on, \
             last_geocode_attempt_on) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, \
                 $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29) \
         ON CONFLICT (external_url_id) DO UPDATE SET \
             county                   = EXCLUDED.county, \
             child_care_type          = EXCLUDED.child_care_type, \
             detailed_child_care_type = EXCLUDED.detailed_child_care_type, \
             external_id              = EXCLUDED.external_id, \
             name                     = EXCLUDED.name, \
             address                  = EXCLUDED.address, \
             city                     = EXCLUDED.city, \
             state                    = EXCLUDED.state, \
             zip_code                 = EXCLUDED.zip_code, \
             phone_number             = EXCLUDED.phone_number, \
             program_email            = EXCLUDED.program_email, \
             license_begin_date       = EXCLUDED.license_begin_date, \
             license_expiration_date  = EXCLUDED.license_expiration_date, \
             sutq_rating              = EXCLUDED.sutq_rating, \
             administrators           = EXCLUDED.administrators, \
             infants                  = EXCLUDED.infants, \
             young_toddlers           = EXCLUDED.young_toddlers, \
             older_toddlers           = EXCLUDED.older_toddlers, \
             preschoolers             = EXCLUDED.preschoolers, \
             school_age               = EXCLUDED.school_age, \
             child_care_food_program  = EXCLUDED.child_care_food_program, \
             center_status            = EXCLUDED.center_status, \
             last_scraped_on  = GREATEST(child_cares.last_scraped_on, EXCLUDED.last_scraped_on), \
             last_checked_on  = GREATEST(child_cares.last_checked_on, EXCLUDED.last_checked_on), \
             updated_at               = NOW() \
         RETURNING (xmax = 0) AS is_new",
    )
    .bind(&child_care.external_url_id)
    .bind(&child_care.county)
    .bind(child_care.kind().as_str())
    .bind(child_care.detail.detailed_discriminator())
    .bind(&child_care.external_id)
    .bind(&child_care.name)
    .bind(&child_care.address)
    .bind(&child_care.city)
    .bind(&child_care.state)
    .bind(&child_care.zip_code)
    .bind(&child_care.phone_number)
    .bind(fields.and_then(|f| f.program_email.as_deref()))
    .bind(fields.and_then(|f| f.license_begin_date))
    .bind(fields.and_then(|f| f.license_expiration_date))
    .bind(fields.and_then(|f| f.sutq_rating))
    .bind(fields.and_then(|f| f.administrators.as_deref()))
    .bind(fields.map(|f| f.infants))
    .bind(fields.map(|f| f.young_toddlers))
    .bind(fields.map(|f| f.older_toddlers))
    .bind(fields.map(|f| f.preschoolers))
    .bind(fields.map(|f| f.school_age))
    .bind(fields.map(|f| f.child_care_food_program))
    .bind(center_status)
    .bind(child_care.last_scraped_on)
    .bind(child_care.last_checked_on)
    .bind(child_care.latitude)
    .bind(child_care.longitude)
    .bind(child_care.last_geocoded_on)
    .bind(child_care.last_geocode_attempt_on)
    .fetch_one(executor)
    .await?;

    Ok(is_new)
}

pub(crate) async fn mark_child_care_checked<'e>(
    executor: impl PgExecutor<'e>,
    external_url_id: &str,
    at: DateTime<Utc>,
) -> Result<u64, DbError> {
    let result = sqlx::query(
        "UPDATE child_cares \
         SET last_checked_on = GREATEST(last_checked_on, $2), updated_at = NOW() \
         WHERE external_url_id = $1",
    )
    .bind(external_url_id)
    .bind(at)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

/// Rows with a street address whose coordinates are missing or predate the
/// last successful fetch. Never-attempted rows come first, then the least
/// recently attempted.
pub(crate) async fn geocode_candidates<'e>(
    executor: impl PgExecutor<'e>,
    limit: i64,
) -> Result<Vec<ChildCareRow>, DbError> {
    let rows = sqlx::query_as::<_, ChildCareRow>(&format!(
        "SELECT {CHILD_CARE_COLUMNS} FROM child_cares \
         WHERE address IS NOT NULL AND btrim(address) <> '' \
           AND (latitude IS NULL OR longitude IS NULL OR last_geocoded_on IS NULL \
                OR last_geocoded_on < last_scraped_on) \
         ORDER BY last_geocode_attempt_on ASC NULLS FIRST, external_url_id ASC \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(executor)
    .await?;
    Ok(rows)
}

/// Returns `false` when no child care has this id.
pub(crate) async fn record_geocode<'e>(
    executor: impl PgExecutor<'e>,
    external_url_id: &str,
    latitude: f64,
    longitude: f64,
    at: DateTime<Utc>,
) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE child_cares \
         SET latitude = $2, longitude = $3, last_geocoded_on = $4, \
             last_geocode_attempt_on = GREATEST(last_geocode_attempt_on, $4), \
             updated_at = NOW() \
         WHERE external_url_id = $1",
    )
    .bind(external_url_id)
    .bind(latitude)
    .bind(longitude)
    .bind(at)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Stamps a failed attempt without touching coordinates. Returns `false` when
/// no child care has this id.
pub(crate) async fn record_geocode_failure<'e>(
    executor: impl PgExecutor<'e>,
    external_url_id: &str,
    at: DateTime<Utc>,
) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE child_cares \
         SET last_geocode_attempt_on = GREATEST(last_geocode_attempt_on, $2), \
             updated_at = NOW() \
         WHERE external_url_id = $1",
    )
    .bind(external_url_id)
    .bind(at)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}
