pub mod app_config;
pub mod config;
pub mod counties;
pub mod geocode;
pub mod model;
pub mod store;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env, DEFAULT_SCRAPER_BASE_URL};
pub use counties::{load_counties, CountiesFile};
pub use geocode::{Coordinates, GeocodeError, Geocoder};
pub use model::{
    validate_county_name, validate_external_url_id, ChildCare, ChildCareDetail, ChildCareKind,
    County, DetailedFields, Entity, ListingStub, TargetError, MAX_COUNTY_NAME_LEN,
    MAX_EXTERNAL_URL_ID_LEN,
};
pub use store::{validate_record_key, validate_stub_batch, Store, StoreError, UpsertCounts};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read counties file {path}: {source}")]
    CountiesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse counties file: {0}")]
    CountiesFileParse(#[source] serde_yaml::Error),

    #[error("counties validation failed: {0}")]
    Validation(String),
}
