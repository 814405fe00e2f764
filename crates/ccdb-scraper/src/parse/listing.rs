use std::collections::HashSet;
use std::sync::LazyLock;

use ccdb_core::{validate_external_url_id, ChildCareKind, County, ListingStub};
use regex::Regex;
use scraper::{Html, Selector};

use super::cells::{cell_text, has_nested_table, non_empty, CELL_SELECTOR, ROW_SELECTOR};
use super::ParseError;

static PROVIDER_LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a[href*='provider_number=']")
        .expect("Failed to parse provider link selector - this is a bug")
});

static PROVIDER_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)provider_number=([^&#\s]*)")
        .expect("Failed to compile provider number regex - this is a bug")
});

/// Rows are `[name, address, city, program type, ...]` with the name cell
/// linking to the detail page.
pub(super) fn parse_listing(county: &County, html: &str) -> Result<Vec<ListingStub>, ParseError> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut stubs = Vec::new();

    for row in document.select(&ROW_SELECTOR) {
        if has_nested_table(row) {
            continue;
        }
        let Some(link) = row.select(&PROVIDER_LINK_SELECTOR).next() else {
            continue;
        };
        let href = link.value().attr("href").unwrap_or_default();
        let external_url_id = PROVIDER_NUMBER
            .captures(href)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();
        validate_external_url_id(&external_url_id).map_err(|e| ParseError::InvalidValue {
            field: "provider_number",
            value: external_url_id.clone(),
            reason: e.to_string(),
        })?;

        let cells: Vec<String> = row.select(&CELL_SELECTOR).map(cell_text).collect();
        if cells.len() < 4 {
            return Err(ParseError::MalformedRow {
                external_url_id,
                cells: cells.len(),
            });
        }

        let kind = ChildCareKind::from_program_type(&cells[3])
            .ok_or_else(|| ParseError::UnknownProgramType(cells[3].clone()))?;
        let name = non_empty(&cell_text(link))
            .or_else(|| non_empty(&cells[0]))
            .ok_or(ParseError::MissingField("Name"))?;

        // ShowAllPages can repeat a provider that straddles a page boundary.
        if !seen.insert(external_url_id.clone()) {
            continue;
        }

        stubs.push(ListingStub {
            external_url_id,
            county: county.name.clone(),
            kind,
            name,
            address: non_empty(&cells[1]),
            city: non_empty(&cells[2]),
            last_checked_on: None,
        });
    }

    Ok(stubs)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRANKLIN_LISTING: &str = include_str!("../../fixtures/listing_franklin.html");

    fn franklin() -> County {
        County::new("FRANKLIN")
    }

    #[test]
    fn parses_every_provider_row() {
        let stubs = parse_listing(&franklin(), FRANKLIN_LISTING).unwrap();
        let ids: Vec<&str> = stubs.iter().map(|s| s.external_url_id.as_str()).collect();
        assert_eq!(ids, vec!["AAAA", "BBBB", "CCCC"]);
        assert!(stubs.iter().all(|s| s.county == "FRANKLIN"));
        assert!(stubs.iter().all(|s| s.last_checked_on.is_none()));
    }

    #[test]
    fn reads_shallow_fields() {
        let stubs = parse_listing(&franklin(), FRANKLIN_LISTING).unwrap();
        let first = &stubs[0];
        assert_eq!(first.name, "Little Acorns Learning Center");
        assert_eq!(first.address.as_deref(), Some("123 Main St"));
        assert_eq!(first.city.as_deref(), Some("Columbus"));
        assert_eq!(first.kind, ChildCareKind::LicensedCenter);
        assert_eq!(stubs[1].kind, ChildCareKind::TypeAHome);
        assert_eq!(stubs[2].kind, ChildCareKind::TypeBHome);
    }

    #[test]
    fn page_without_providers_yields_no_stubs() {
        let html = "<html><body><p>No providers match your search.</p></body></html>";
        assert!(parse_listing(&franklin(), html).unwrap().is_empty());
    }

    #[test]
    fn empty_document_yields_no_stubs() {
        assert!(parse_listing(&franklin(), "").unwrap().is_empty());
    }

    #[test]
    fn duplicate_rows_are_collapsed() {
        let row = r#"<tr><td><a href="results2.asp?provider_number=AAAA&Printable=Y">A</a></td>
            <td>1 Elm</td><td>Columbus</td><td>Type A Home</td></tr>"#;
        let html = format!("<table>{row}{row}</table>");
        let stubs = parse_listing(&franklin(), &html).unwrap();
        assert_eq!(stubs.len(), 1);
    }

    #[test]
    fn unknown_program_type_is_an_error() {
        let html = r#"<table><tr><td><a href="results2.asp?provider_number=AAAA">A</a></td>
            <td>1 Elm</td><td>Columbus</td><td>Preschool Program</td></tr></table>"#;
        let err = parse_listing(&franklin(), html).unwrap_err();
        assert!(
            matches!(err, ParseError::UnknownProgramType(ref t) if t == "Preschool Program"),
            "got: {err:?}"
        );
    }

    #[test]
    fn provider_number_with_punctuation_is_rejected() {
        let html = r#"<table><tr><td><a href="results2.asp?provider_number=AA-01">A</a></td>
            <td>1 Elm</td><td>Columbus</td><td>Type A Home</td></tr></table>"#;
        let err = parse_listing(&franklin(), html).unwrap_err();
        assert!(
            matches!(err, ParseError::InvalidValue { field: "provider_number", .. }),
            "got: {err:?}"
        );
    }

    #[test]
    fn short_row_is_malformed() {
        let html = r#"<table><tr><td><a href="results2.asp?provider_number=AAAA">A</a></td>
            <td>Type A Home</td></tr></table>"#;
        let err = parse_listing(&franklin(), html).unwrap_err();
        assert!(
            matches!(err, ParseError::MalformedRow { cells: 2, .. }),
            "got: {err:?}"
        );
    }
}
