//! Geocoding capability used by the enrichment pass.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("no geocoding match for \"{address}\"")]
    NoMatch { address: String },

    #[error("geocoding service rejected the request: {0}")]
    Rejected(String),

    #[error("geocoding transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Coordinates, GeocodeError>;
}
