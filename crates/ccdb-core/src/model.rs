//! Domain model for counties, listing stubs, and detailed child care records.
//!
//! The four program types form a closed set ([`ChildCareKind`]). Detailed
//! records carry a second, narrower variant set ([`ChildCareDetail`]) in which
//! only Type A homes and licensed centers have fields beyond the base record.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum length of a county name as used in the listing query string.
pub const MAX_COUNTY_NAME_LEN: usize = 10;

/// Maximum length of the source's `provider_number` identifier.
pub const MAX_EXTERNAL_URL_ID_LEN: usize = 18;

/// Administrative region whose listing page enumerates child cares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct County {
    pub name: String,
    /// Last time the county's listing page was processed. Bookkeeping only.
    pub last_scraped_on: Option<DateTime<Utc>>,
}

impl County {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            last_scraped_on: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildCareKind {
    TypeAHome,
    TypeBHome,
    LicensedCenter,
    DayCamp,
}

impl ChildCareKind {
    pub const ALL: [ChildCareKind; 4] = [
        ChildCareKind::TypeAHome,
        ChildCareKind::TypeBHome,
        ChildCareKind::LicensedCenter,
        ChildCareKind::DayCamp,
    ];

    /// Stable storage discriminator.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ChildCareKind::TypeAHome => "type_a_home",
            ChildCareKind::TypeBHome => "type_b_home",
            ChildCareKind::LicensedCenter => "licensed_center",
            ChildCareKind::DayCamp => "day_camp",
        }
    }

    #[must_use]
    pub fn from_discriminator(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }

    /// Recognises the human-readable program type label printed on listing and
    /// detail pages, e.g. `"Licensed Child Care Center"` or `"Type B Home"`.
    #[must_use]
    pub fn from_program_type(label: &str) -> Option<Self> {
        let lower = label.trim().to_lowercase();
        if lower.contains("type a") {
            Some(ChildCareKind::TypeAHome)
        } else if lower.contains("type b") {
            Some(ChildCareKind::TypeBHome)
        } else if lower.contains("day camp") {
            Some(ChildCareKind::DayCamp)
        } else if lower.contains("center") || lower.contains("centre") {
            Some(ChildCareKind::LicensedCenter)
        } else {
            None
        }
    }

    /// Whether detail pages of this kind carry the richer detailed section.
    #[must_use]
    pub fn has_detailed_variant(self) -> bool {
        matches!(self, ChildCareKind::TypeAHome | ChildCareKind::LicensedCenter)
    }
}

impl std::fmt::Display for ChildCareKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shallow record discovered on a county listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingStub {
    pub external_url_id: String,
    pub county: String,
    pub kind: ChildCareKind,
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    /// Set when a detail fetch confirmed the record has no data.
    pub last_checked_on: Option<DateTime<Utc>>,
}

impl ListingStub {
    #[must_use]
    pub fn selection_key(&self) -> Option<DateTime<Utc>> {
        self.last_checked_on
    }
}

/// Fields only present on Type A home and licensed center detail pages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedFields {
    pub program_email: Option<String>,
    pub license_begin_date: Option<NaiveDate>,
    pub license_expiration_date: Option<NaiveDate>,
    pub sutq_rating: Option<i16>,
    pub administrators: Option<String>,
    pub infants: bool,
    pub young_toddlers: bool,
    pub older_toddlers: bool,
    pub preschoolers: bool,
    pub school_age: bool,
    pub child_care_food_program: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChildCareDetail {
    TypeAHome(DetailedFields),
    LicensedCenter {
        fields: DetailedFields,
        center_status: Option<String>,
    },
    TypeBHome,
    DayCamp,
}

impl ChildCareDetail {
    #[must_use]
    pub fn kind(&self) -> ChildCareKind {
        match self {
            ChildCareDetail::TypeAHome(_) => ChildCareKind::TypeAHome,
            ChildCareDetail::LicensedCenter { .. } => ChildCareKind::LicensedCenter,
            ChildCareDetail::TypeBHome => ChildCareKind::TypeBHome,
            ChildCareDetail::DayCamp => ChildCareKind::DayCamp,
        }
    }

    #[must_use]
    pub fn detailed_fields(&self) -> Option<&DetailedFields> {
        match self {
            ChildCareDetail::TypeAHome(fields) | ChildCareDetail::LicensedCenter { fields, .. } => {
                Some(fields)
            }
            ChildCareDetail::TypeBHome | ChildCareDetail::DayCamp => None,
        }
    }

    /// Secondary discriminator, present only for the detailed variants.
    #[must_use]
    pub fn detailed_discriminator(&self) -> Option<&'static str> {
        self.detailed_fields().map(|_| self.kind().as_str())
    }
}

/// Fully fetched, authoritative child care record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildCare {
    pub external_url_id: String,
    pub county: String,
    /// License number printed on the detail page.
    pub external_id: Option<String>,
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub phone_number: Option<String>,
    pub last_scraped_on: Option<DateTime<Utc>>,
    pub last_checked_on: Option<DateTime<Utc>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub last_geocoded_on: Option<DateTime<Utc>>,
    /// Last geocoding attempt, successful or not. Candidates are served in
    /// this order, so a record that keeps failing moves behind the others.
    pub last_geocode_attempt_on: Option<DateTime<Utc>>,
    pub detail: ChildCareDetail,
}

impl ChildCare {
    #[must_use]
    pub fn kind(&self) -> ChildCareKind {
        self.detail.kind()
    }

    /// The later of the last successful fetch and the last confirmed-absent check.
    #[must_use]
    pub fn selection_key(&self) -> Option<DateTime<Utc>> {
        self.last_scraped_on.max(self.last_checked_on)
    }

    /// Single-line address suitable for a geocoding query.
    #[must_use]
    pub fn full_address(&self) -> Option<String> {
        let street = self.address.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let mut parts = vec![street.to_string()];
        if let Some(city) = self.city.as_deref().filter(|s| !s.trim().is_empty()) {
            parts.push(city.trim().to_string());
        }
        let state_zip = [self.state.as_deref(), self.zip_code.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !state_zip.is_empty() {
            parts.push(state_zip);
        }
        Some(parts.join(", "))
    }

    /// True when the record has an address and its coordinates are missing or
    /// older than the last successful fetch.
    #[must_use]
    pub fn needs_geocode(&self) -> bool {
        if self.full_address().is_none() {
            return false;
        }
        if self.latitude.is_none() || self.longitude.is_none() {
            return true;
        }
        match (self.last_geocoded_on, self.last_scraped_on) {
            (None, _) => true,
            (Some(geocoded), Some(scraped)) => geocoded < scraped,
            (Some(_), None) => false,
        }
    }
}

/// Either shape a stored record can take for a given external URL id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entity", rename_all = "snake_case")]
pub enum Entity {
    Stub(ListingStub),
    ChildCare(ChildCare),
}

impl Entity {
    #[must_use]
    pub fn external_url_id(&self) -> &str {
        match self {
            Entity::Stub(stub) => &stub.external_url_id,
            Entity::ChildCare(child_care) => &child_care.external_url_id,
        }
    }

    #[must_use]
    pub fn county(&self) -> &str {
        match self {
            Entity::Stub(stub) => &stub.county,
            Entity::ChildCare(child_care) => &child_care.county,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ChildCareKind {
        match self {
            Entity::Stub(stub) => stub.kind,
            Entity::ChildCare(child_care) => child_care.kind(),
        }
    }

    #[must_use]
    pub fn selection_key(&self) -> Option<DateTime<Utc>> {
        match self {
            Entity::Stub(stub) => stub.selection_key(),
            Entity::ChildCare(child_care) => child_care.selection_key(),
        }
    }
}

/// A request target that cannot be sent to the source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("{field} must not be blank")]
    Blank { field: &'static str },

    #[error("{field} is {len} characters; at most {max} are allowed")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("{field} \"{value}\" must be ASCII alphanumeric")]
    InvalidCharacters { field: &'static str, value: String },

    #[error("{field} \"{value}\" has leading or trailing whitespace")]
    SurroundingWhitespace { field: &'static str, value: String },
}

/// Checks a county name before it is used as a query parameter.
///
/// # Errors
///
/// Returns [`TargetError`] if the name is blank, padded with whitespace, or
/// longer than [`MAX_COUNTY_NAME_LEN`].
pub fn validate_county_name(name: &str) -> Result<(), TargetError> {
    const FIELD: &str = "county.name";
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(TargetError::Blank { field: FIELD });
    }
    if trimmed.len() != name.len() {
        return Err(TargetError::SurroundingWhitespace {
            field: FIELD,
            value: name.to_string(),
        });
    }
    let len = name.chars().count();
    if len > MAX_COUNTY_NAME_LEN {
        return Err(TargetError::TooLong {
            field: FIELD,
            len,
            max: MAX_COUNTY_NAME_LEN,
        });
    }
    Ok(())
}

/// Checks an external URL id (`provider_number`) before it is fetched or stored.
///
/// # Errors
///
/// Returns [`TargetError`] if the id is blank, too long, or contains anything
/// other than ASCII letters and digits.
pub fn validate_external_url_id(id: &str) -> Result<(), TargetError> {
    const FIELD: &str = "external_url_id";
    if id.trim().is_empty() {
        return Err(TargetError::Blank { field: FIELD });
    }
    if id.len() > MAX_EXTERNAL_URL_ID_LEN {
        return Err(TargetError::TooLong {
            field: FIELD,
            len: id.len(),
            max: MAX_EXTERNAL_URL_ID_LEN,
        });
    }
    if !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(TargetError::InvalidCharacters {
            field: FIELD,
            value: id.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;
