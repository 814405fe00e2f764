use std::collections::HashMap;

use ccdb_core::counties::normalize_county_name;
use ccdb_core::{
    validate_county_name, ChildCare, ChildCareDetail, ChildCareKind, DetailedFields, Entity,
};
use chrono::NaiveDate;
use scraper::Html;

use super::cells::{
    cell_text, collapse_whitespace, has_nested_table, text_lines, CELL_SELECTOR, ROW_SELECTOR,
};
use super::ParseError;

const DATE_FORMAT: &str = "%m/%d/%Y";

/// Label rows keyed by lowercase label without the trailing colon. Values keep
/// their `<br>`-separated lines. Only the first occurrence of a label counts.
struct Labels(HashMap<String, Vec<String>>);

impl Labels {
    fn from_document(document: &Html) -> Self {
        let mut map = HashMap::new();
        for row in document.select(&ROW_SELECTOR) {
            if has_nested_table(row) {
                continue;
            }
            let cells: Vec<_> = row.select(&CELL_SELECTOR).collect();
            let [label, value] = cells.as_slice() else {
                continue;
            };
            let label = cell_text(*label);
            let Some(key) = label.strip_suffix(':') else {
                continue;
            };
            map.entry(collapse_whitespace(key).to_lowercase())
                .or_insert_with(|| text_lines(*value));
        }
        Self(map)
    }

    fn text(&self, key: &str) -> Option<String> {
        self.0
            .get(key)
            .map(|lines| lines.join(" "))
            .filter(|value| !value.is_empty())
    }

    fn list(&self, key: &str) -> Option<String> {
        self.0
            .get(key)
            .filter(|lines| !lines.is_empty())
            .map(|lines| lines.join(", "))
    }

    fn required(&self, key: &str, field: &'static str) -> Result<String, ParseError> {
        self.text(key).ok_or(ParseError::MissingField(field))
    }

    fn date(&self, key: &str, field: &'static str) -> Result<Option<NaiveDate>, ParseError> {
        self.text(key)
            .map(|value| {
                NaiveDate::parse_from_str(&value, DATE_FORMAT).map_err(|e| {
                    ParseError::InvalidValue {
                        field,
                        value,
                        reason: e.to_string(),
                    }
                })
            })
            .transpose()
    }

    /// Missing flags read as `false`.
    fn flag(&self, key: &str, field: &'static str) -> Result<bool, ParseError> {
        let Some(value) = self.text(key) else {
            return Ok(false);
        };
        match value.to_lowercase().as_str() {
            "yes" | "y" | "x" => Ok(true),
            "no" | "n" => Ok(false),
            _ => Err(ParseError::InvalidValue {
                field,
                value,
                reason: "expected Yes or No".to_string(),
            }),
        }
    }

    /// First run of digits, so `"3 Star"` reads as 3 and `"Not Rated"` as none.
    fn rating(&self, key: &str, field: &'static str) -> Result<Option<i16>, ParseError> {
        let Some(value) = self.text(key) else {
            return Ok(None);
        };
        let digits: String = value
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(char::is_ascii_digit)
            .collect();
        if digits.is_empty() {
            return Ok(None);
        }
        digits
            .parse::<i16>()
            .map(Some)
            .map_err(|e| ParseError::InvalidValue {
                field,
                value,
                reason: e.to_string(),
            })
    }
}

pub(super) fn parse_detail(
    external_url_id: &str,
    previous: Option<&Entity>,
    html: &str,
) -> Result<ChildCare, ParseError> {
    let document = Html::parse_document(html);
    let labels = Labels::from_document(&document);

    let program_type = labels.required("program type", "Program Type")?;
    let kind = ChildCareKind::from_program_type(&program_type)
        .ok_or(ParseError::UnknownProgramType(program_type))?;
    let name = labels.required("name", "Name")?;

    let county = match labels.text("county") {
        Some(county) => normalize_county_name(&county),
        None => previous
            .map(|entity| entity.county().to_string())
            .ok_or(ParseError::MissingField("County"))?,
    };
    validate_county_name(&county).map_err(|e| ParseError::InvalidValue {
        field: "County",
        value: county.clone(),
        reason: e.to_string(),
    })?;

    let detail = match kind {
        ChildCareKind::TypeAHome => ChildCareDetail::TypeAHome(detailed_fields(&labels)?),
        ChildCareKind::LicensedCenter => ChildCareDetail::LicensedCenter {
            fields: detailed_fields(&labels)?,
            center_status: labels.text("center status"),
        },
        ChildCareKind::TypeBHome => ChildCareDetail::TypeBHome,
        ChildCareKind::DayCamp => ChildCareDetail::DayCamp,
    };

    let mut child_care = ChildCare {
        external_url_id: external_url_id.to_string(),
        county,
        external_id: labels.text("license number"),
        name,
        address: labels.text("address"),
        city: labels.text("city"),
        state: labels.text("state"),
        zip_code: labels.text("zip").or_else(|| labels.text("zip code")),
        phone_number: labels.text("phone"),
        last_scraped_on: None,
        last_checked_on: None,
        latitude: None,
        longitude: None,
        last_geocoded_on: None,
        last_geocode_attempt_on: None,
        detail,
    };
    carry_over(&mut child_care, previous);
    Ok(child_care)
}

fn detailed_fields(labels: &Labels) -> Result<DetailedFields, ParseError> {
    Ok(DetailedFields {
        program_email: labels.text("email"),
        license_begin_date: labels.date("license begin date", "License Begin Date")?,
        license_expiration_date: labels
            .date("license expiration date", "License Expiration Date")?,
        sutq_rating: labels.rating("sutq rating", "SUTQ Rating")?,
        administrators: labels.list("administrators"),
        infants: labels.flag("infants", "Infants")?,
        young_toddlers: labels.flag("young toddlers", "Young Toddlers")?,
        older_toddlers: labels.flag("older toddlers", "Older Toddlers")?,
        preschoolers: labels.flag("preschoolers", "Preschoolers")?,
        school_age: labels.flag("school age", "School Age")?,
        child_care_food_program: labels.flag("child care food program", "Child Care Food Program")?,
    })
}

fn carry_over(child_care: &mut ChildCare, previous: Option<&Entity>) {
    match previous {
        Some(Entity::ChildCare(prev)) => {
            child_care.last_scraped_on = prev.last_scraped_on;
            child_care.last_checked_on = prev.last_checked_on;
            child_care.latitude = prev.latitude;
            child_care.longitude = prev.longitude;
            child_care.last_geocoded_on = prev.last_geocoded_on;
            child_care.last_geocode_attempt_on = prev.last_geocode_attempt_on;
        }
        Some(Entity::Stub(stub)) => {
            child_care.last_checked_on = stub.last_checked_on;
        }
        None => {}
    }
}

#[cfg(test)]
#[path = "detail_test.rs"]
mod tests;
