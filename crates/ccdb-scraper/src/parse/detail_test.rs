use chrono::{TimeZone, Utc};

use ccdb_core::ListingStub;

use super::*;

const CENTER_DETAIL: &str = include_str!("../../fixtures/detail_center.html");
const TYPE_B_DETAIL: &str = include_str!("../../fixtures/detail_type_b.html");

fn page(rows: &[(&str, &str)]) -> String {
    let body: String = rows
        .iter()
        .map(|(label, value)| format!("<tr><td>{label}:</td><td>{value}</td></tr>"))
        .collect();
    format!("<html><body><table>{body}</table></body></html>")
}

#[test]
fn parses_licensed_center() {
    let child_care = parse_detail("AAAA", None, CENTER_DETAIL).unwrap();
    assert_eq!(child_care.external_url_id, "AAAA");
    assert_eq!(child_care.kind(), ChildCareKind::LicensedCenter);
    assert_eq!(child_care.name, "Little Acorns Learning Center");
    assert_eq!(child_care.county, "FRANKLIN");
    assert_eq!(child_care.external_id.as_deref(), Some("000123456789"));
    assert_eq!(child_care.address.as_deref(), Some("123 Main St"));
    assert_eq!(child_care.city.as_deref(), Some("Columbus"));
    assert_eq!(child_care.state.as_deref(), Some("OH"));
    assert_eq!(child_care.zip_code.as_deref(), Some("43215"));
    assert_eq!(child_care.phone_number.as_deref(), Some("(614) 555-0100"));

    let ChildCareDetail::LicensedCenter {
        fields,
        center_status,
    } = &child_care.detail
    else {
        panic!("expected LicensedCenter, got {:?}", child_care.detail);
    };
    assert_eq!(center_status.as_deref(), Some("Full Time"));
    assert_eq!(
        fields.program_email.as_deref(),
        Some("director@littleacorns.example")
    );
    assert_eq!(fields.license_begin_date, NaiveDate::from_ymd_opt(2009, 1, 15));
    assert_eq!(
        fields.license_expiration_date,
        NaiveDate::from_ymd_opt(2011, 1, 15)
    );
    assert_eq!(fields.sutq_rating, Some(3));
    assert_eq!(fields.administrators.as_deref(), Some("Jane Doe, John Roe"));
    assert!(fields.infants);
    assert!(fields.young_toddlers);
    assert!(!fields.older_toddlers);
    assert!(fields.preschoolers);
    assert!(!fields.school_age);
    assert!(fields.child_care_food_program);
}

#[test]
fn parses_type_b_home_without_detailed_fields() {
    let child_care = parse_detail("CCCC", None, TYPE_B_DETAIL).unwrap();
    assert_eq!(child_care.detail, ChildCareDetail::TypeBHome);
    assert!(child_care.address.is_none());
    assert_eq!(child_care.city.as_deref(), Some("Westerville"));
    assert!(child_care.detail.detailed_discriminator().is_none());
}

#[test]
fn type_a_home_uses_detailed_variant() {
    let html = page(&[
        ("Program Type", "Type A Home"),
        ("Name", "Sunny Days Home Care"),
        ("County", "FRANKLIN"),
        ("SUTQ Rating", "Not Rated"),
        ("Infants", "Yes"),
    ]);
    let child_care = parse_detail("BBBB", None, &html).unwrap();
    let ChildCareDetail::TypeAHome(fields) = &child_care.detail else {
        panic!("expected TypeAHome, got {:?}", child_care.detail);
    };
    assert!(fields.sutq_rating.is_none());
    assert!(fields.infants);
    assert!(!fields.school_age);
    assert!(fields.license_begin_date.is_none());
}

#[test]
fn day_camp_is_recognised() {
    let html = page(&[
        ("Program Type", "Day Camp"),
        ("Name", "Camp Sunshine"),
        ("County", "ADAMS"),
    ]);
    let child_care = parse_detail("DDDD", None, &html).unwrap();
    assert_eq!(child_care.detail, ChildCareDetail::DayCamp);
}

#[test]
fn missing_program_type_is_an_error() {
    let html = page(&[("Name", "Nameless"), ("County", "FRANKLIN")]);
    let err = parse_detail("AAAA", None, &html).unwrap_err();
    assert!(
        matches!(err, ParseError::MissingField("Program Type")),
        "got: {err:?}"
    );
}

#[test]
fn missing_name_is_an_error() {
    let html = page(&[("Program Type", "Type B Home"), ("County", "FRANKLIN")]);
    let err = parse_detail("AAAA", None, &html).unwrap_err();
    assert!(matches!(err, ParseError::MissingField("Name")), "got: {err:?}");
}

#[test]
fn empty_document_is_an_error() {
    let err = parse_detail("AAAA", None, "").unwrap_err();
    assert!(matches!(err, ParseError::MissingField(_)), "got: {err:?}");
}

#[test]
fn malformed_date_is_an_error() {
    let html = page(&[
        ("Program Type", "Type A Home"),
        ("Name", "X"),
        ("County", "FRANKLIN"),
        ("License Begin Date", "2009-01-15"),
    ]);
    let err = parse_detail("AAAA", None, &html).unwrap_err();
    assert!(
        matches!(err, ParseError::InvalidValue { field: "License Begin Date", .. }),
        "got: {err:?}"
    );
}

#[test]
fn malformed_flag_is_an_error() {
    let html = page(&[
        ("Program Type", "Licensed Child Care Center"),
        ("Name", "X"),
        ("County", "FRANKLIN"),
        ("Infants", "Sometimes"),
    ]);
    let err = parse_detail("AAAA", None, &html).unwrap_err();
    assert!(
        matches!(err, ParseError::InvalidValue { field: "Infants", .. }),
        "got: {err:?}"
    );
}

#[test]
fn county_falls_back_to_previous_entity() {
    let html = page(&[("Program Type", "Type B Home"), ("Name", "Mary's Place")]);
    let stub = Entity::Stub(ListingStub {
        external_url_id: "CCCC".to_string(),
        county: "FRANKLIN".to_string(),
        kind: ChildCareKind::TypeBHome,
        name: "Mary's Place".to_string(),
        address: None,
        city: None,
        last_checked_on: None,
    });
    let child_care = parse_detail("CCCC", Some(&stub), &html).unwrap();
    assert_eq!(child_care.county, "FRANKLIN");

    let err = parse_detail("CCCC", None, &html).unwrap_err();
    assert!(matches!(err, ParseError::MissingField("County")), "got: {err:?}");
}

#[test]
fn overlong_county_is_an_error() {
    let html = page(&[
        ("Program Type", "Type B Home"),
        ("Name", "X"),
        ("County", "NOT A REAL COUNTY"),
    ]);
    let err = parse_detail("AAAA", None, &html).unwrap_err();
    assert!(
        matches!(err, ParseError::InvalidValue { field: "County", .. }),
        "got: {err:?}"
    );
}

#[test]
fn carries_bookkeeping_from_previous_child_care() {
    let scraped = Utc.with_ymd_and_hms(2010, 3, 1, 12, 0, 0).unwrap();
    let geocoded = Utc.with_ymd_and_hms(2010, 3, 2, 12, 0, 0).unwrap();
    let mut previous = parse_detail("CCCC", None, TYPE_B_DETAIL).unwrap();
    previous.last_scraped_on = Some(scraped);
    previous.latitude = Some(40.1);
    previous.longitude = Some(-83.0);
    previous.last_geocoded_on = Some(geocoded);

    let child_care =
        parse_detail("CCCC", Some(&Entity::ChildCare(previous)), TYPE_B_DETAIL).unwrap();
    assert_eq!(child_care.last_scraped_on, Some(scraped));
    assert_eq!(child_care.latitude, Some(40.1));
    assert_eq!(child_care.longitude, Some(-83.0));
    assert_eq!(child_care.last_geocoded_on, Some(geocoded));
}

#[test]
fn carries_checked_marker_from_stub() {
    let checked = Utc.with_ymd_and_hms(2010, 3, 1, 0, 0, 0).unwrap();
    let stub = Entity::Stub(ListingStub {
        external_url_id: "CCCC".to_string(),
        county: "FRANKLIN".to_string(),
        kind: ChildCareKind::TypeBHome,
        name: "Mary's Place".to_string(),
        address: None,
        city: None,
        last_checked_on: Some(checked),
    });
    let child_care = parse_detail("CCCC", Some(&stub), TYPE_B_DETAIL).unwrap();
    assert_eq!(child_care.last_checked_on, Some(checked));
    assert!(child_care.last_scraped_on.is_none());
}

#[test]
fn page_program_type_overrides_stub_kind() {
    let stub = Entity::Stub(ListingStub {
        external_url_id: "CCCC".to_string(),
        county: "FRANKLIN".to_string(),
        kind: ChildCareKind::TypeAHome,
        name: "Mary's Place".to_string(),
        address: None,
        city: None,
        last_checked_on: None,
    });
    let child_care = parse_detail("CCCC", Some(&stub), TYPE_B_DETAIL).unwrap();
    assert_eq!(child_care.kind(), ChildCareKind::TypeBHome);
}
