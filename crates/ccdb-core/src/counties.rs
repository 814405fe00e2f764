use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::model::{validate_county_name, County};
use crate::ConfigError;

#[derive(Debug, Deserialize)]
pub struct CountiesFile {
    pub counties: Vec<String>,
}

impl CountiesFile {
    #[must_use]
    pub fn to_counties(&self) -> Vec<County> {
        self.counties
            .iter()
            .map(|name| County::new(normalize_county_name(name)))
            .collect()
    }
}

/// Upper-cases and trims a county name the way the source expects it.
#[must_use]
pub fn normalize_county_name(name: &str) -> String {
    name.trim().to_uppercase()
}

/// Load and validate the county reference data from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_counties(path: &Path) -> Result<CountiesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CountiesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_counties(&content)
}

/// Parse and validate county reference data from YAML text.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_counties(content: &str) -> Result<CountiesFile, ConfigError> {
    let counties_file: CountiesFile =
        serde_yaml::from_str(content).map_err(ConfigError::CountiesFileParse)?;

    validate_counties(&counties_file)?;

    Ok(counties_file)
}

fn validate_counties(counties_file: &CountiesFile) -> Result<(), ConfigError> {
    if counties_file.counties.is_empty() {
        return Err(ConfigError::Validation(
            "counties list must not be empty".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for name in &counties_file.counties {
        let normalized = normalize_county_name(name);
        validate_county_name(&normalized)
            .map_err(|e| ConfigError::Validation(format!("county '{name}': {e}")))?;

        if !seen.insert(normalized) {
            return Err(ConfigError::Validation(format!(
                "duplicate county name: '{name}'"
            )));
        }
    }

    Ok(())
}
