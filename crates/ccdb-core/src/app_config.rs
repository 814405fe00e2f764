use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    pub counties_path: PathBuf,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub scraper_base_url: String,
    pub scraper_user_agent: String,
    pub scraper_request_timeout_secs: u64,
    /// Lower bound of the jittered sleep before each driver tick.
    pub sleep_min_ms: u64,
    pub sleep_max_ms: u64,
    pub tick_timeout_secs: u64,
    pub mapquest_api_key: Option<String>,
    pub geocode_batch_size: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("counties_path", &self.counties_path)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("scraper_base_url", &self.scraper_base_url)
            .field("scraper_user_agent", &self.scraper_user_agent)
            .field(
                "scraper_request_timeout_secs",
                &self.scraper_request_timeout_secs,
            )
            .field("sleep_min_ms", &self.sleep_min_ms)
            .field("sleep_max_ms", &self.sleep_max_ms)
            .field("tick_timeout_secs", &self.tick_timeout_secs)
            .field(
                "mapquest_api_key",
                &self.mapquest_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("geocode_batch_size", &self.geocode_batch_size)
            .finish()
    }
}
