pub mod classify;
pub mod client;
pub mod error;
pub mod geocode;
pub mod parse;

pub use classify::{classify, Classification, TemporaryReason};
pub use client::{FetchOutcome, OdjfsClient};
pub use error::FetchError;
pub use geocode::MapQuestGeocoder;
pub use parse::{ChildCareParser, HtmlParser, ParseError};
