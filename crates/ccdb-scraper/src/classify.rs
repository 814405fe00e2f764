//! Maps a raw HTTP response onto the four fetch outcomes.
//!
//! The source serves database failures as ordinary HTML pages, so the status
//! code alone says little. Classification inspects the status, the `Location`
//! header of redirects, and the body for a fixed set of error banners.

use std::fmt;

use reqwest::header::{HeaderMap, LOCATION};
use reqwest::StatusCode;

/// Banners meaning the backend is down or overloaded; retrying later may work.
pub const TEMPORARY_BANNERS: &[&str] = &[
    "Provider error '80004005' Unspecified error",
    "ORA-03114: not connected to ORACLE",
    "ORA-01034: ORACLE not available",
    "ORA-01089: immediate shutdown in progress",
    "ORA-01033: ORACLE initialization or shutdown in progress",
];

/// Banners meaning the requested record has no data; retrying will not help.
pub const PERMANENT_BANNERS: &[&str] = &[
    "ORA-01858: a non-numeric character was found where a numeric was expected",
    "ORA-01850: hour must be between 0 and 23",
    "Either BOF or EOF is True, or the current record has been deleted",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemporaryReason {
    /// The source redirected, typically to a maintenance page.
    Redirect {
        status: u16,
        location: Option<String>,
    },
    /// The body carried a known temporary error banner.
    Banner(&'static str),
}

impl fmt::Display for TemporaryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemporaryReason::Redirect {
                status,
                location: Some(location),
            } => write!(f, "redirected ({status}) to {location}"),
            TemporaryReason::Redirect {
                status,
                location: None,
            } => write!(f, "redirected ({status})"),
            TemporaryReason::Banner(banner) => write!(f, "error banner \"{banner}\""),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Success,
    Permanent { banner: &'static str },
    Temporary(TemporaryReason),
    Unknown,
}

/// Classifies a response. Checks run in a fixed order: redirect, temporary
/// banner, permanent banner, then status code.
#[must_use]
pub fn classify(status: StatusCode, headers: &HeaderMap, body: &[u8]) -> Classification {
    if status.is_redirection() {
        let location = headers
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        return Classification::Temporary(TemporaryReason::Redirect {
            status: status.as_u16(),
            location,
        });
    }

    let text = String::from_utf8_lossy(body);

    if let Some(banner) = find_banner(&text, TEMPORARY_BANNERS) {
        return Classification::Temporary(TemporaryReason::Banner(banner));
    }
    if let Some(banner) = find_banner(&text, PERMANENT_BANNERS) {
        return Classification::Permanent { banner };
    }

    match status {
        StatusCode::OK => Classification::Success,
        StatusCode::INTERNAL_SERVER_ERROR if !text.trim().is_empty() => Classification::Success,
        _ => Classification::Unknown,
    }
}

fn find_banner(text: &str, banners: &[&'static str]) -> Option<&'static str> {
    banners.iter().copied().find(|banner| text.contains(banner))
}
