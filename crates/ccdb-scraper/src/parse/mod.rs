//! Turns fetched documents into domain records.

mod cells;
mod detail;
mod listing;

use ccdb_core::{ChildCare, County, Entity, ListingStub};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unrecognised program type \"{0}\"")]
    UnknownProgramType(String),

    #[error("missing required field \"{0}\"")]
    MissingField(&'static str),

    #[error("invalid {field} \"{value}\": {reason}")]
    InvalidValue {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("listing row for {external_url_id} has {cells} cells; expected at least 4")]
    MalformedRow {
        external_url_id: String,
        cells: usize,
    },
}

/// Extracts records from raw source documents.
///
/// Implementations must be pure: the same bytes and previous entity always
/// produce the same result.
pub trait ChildCareParser: Send + Sync {
    /// Parses a county listing page into stubs, one per distinct provider.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if a provider row cannot be interpreted.
    fn parse_listing(&self, county: &County, bytes: &[u8]) -> Result<Vec<ListingStub>, ParseError>;

    /// Parses a detail page into a full record.
    ///
    /// `previous` is whatever the store held for `external_url_id`; its
    /// bookkeeping timestamps and coordinates carry over to the result.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if the page lacks a program type or name, or a
    /// field value is malformed.
    fn parse_detail(
        &self,
        external_url_id: &str,
        previous: Option<&Entity>,
        bytes: &[u8],
    ) -> Result<ChildCare, ParseError>;
}

/// [`ChildCareParser`] for the printable HTML pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlParser;

impl ChildCareParser for HtmlParser {
    fn parse_listing(&self, county: &County, bytes: &[u8]) -> Result<Vec<ListingStub>, ParseError> {
        listing::parse_listing(county, &String::from_utf8_lossy(bytes))
    }

    fn parse_detail(
        &self,
        external_url_id: &str,
        previous: Option<&Entity>,
        bytes: &[u8],
    ) -> Result<ChildCare, ParseError> {
        detail::parse_detail(external_url_id, previous, &String::from_utf8_lossy(bytes))
    }
}
