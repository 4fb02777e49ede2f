//! Configuration and constants for the engine and CLI.

use crate::aggregator::{Granularity, WordSource};
use crate::utils::error::{ConfigError, EngineError};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Current report schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Separator between title number and department name ("7—Agriculture")
pub const DEFAULT_DELIMITER: &str = "\u{2014}";

/// Default time-series window, in years ending "now"
pub const DEFAULT_LOOKBACK_YEARS: u32 = 50;

/// Records processed between yield points
pub const DEFAULT_CHUNK_SIZE: usize = 5_000;

/// Upper bound on the lookback window
pub const MAX_LOOKBACK_YEARS: u32 = 500;

/// Number of memoized results kept by the engine
pub const DEFAULT_CACHE_CAPACITY: usize = 8;

// Field names under which an object-wrapped record array may live
pub const RECORD_FIELD_NAMES: &[&str] = &["records", "data", "items", "results"];

// Filter values that select every group
pub const ALL_GROUP_ALIASES: &[&str] = &["All", "All Titles"];

/// Label used for the synthetic combined row
pub const ALL_GROUPS_LABEL: &str = "All";

/// Engine settings, loadable from a TOML file.
///
/// Every field is optional in the file; missing fields take the defaults
/// above.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Separator between group key and display name
    pub delimiter: String,

    /// Records processed between yield points
    pub chunk_size: usize,

    /// Time-series lookback window in years
    pub lookback_years: u32,

    /// Time-series bucket granularity
    pub granularity: Granularity,

    /// Where per-record word counts come from
    pub word_source: WordSource,

    /// Memoized results kept by the engine
    pub cache_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            lookback_years: DEFAULT_LOOKBACK_YEARS,
            granularity: Granularity::Monthly,
            word_source: WordSource::Label,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl EngineConfig {
    /// Check values that serde cannot reject on its own
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.delimiter.is_empty() {
            return Err(EngineError::EmptyDelimiter);
        }
        if self.chunk_size == 0 {
            return Err(EngineError::InvalidChunkSize);
        }
        if self.lookback_years > MAX_LOOKBACK_YEARS {
            return Err(EngineError::InvalidLookback(self.lookback_years));
        }
        Ok(())
    }
}

/// Load engine settings from a TOML file
///
/// # Errors
/// * `ConfigError::ReadFailed` - If file cannot be read
/// * `ConfigError::ParseFailed` - If TOML is invalid or names an unknown option
/// * `ConfigError::Invalid` - If a value is out of range
///
/// # Example
/// ```ignore
/// let config = load_config("ecfr-insight.toml")?;
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<EngineConfig, ConfigError> {
    let path = path.as_ref();
    debug!("Loading engine config from: {}", path.display());

    let contents = fs::read_to_string(path)?;
    let config: EngineConfig = toml::from_str(&contents)?;
    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_load_partial_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "granularity = \"Quarterly\"\nlookback_years = 10").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.granularity, Granularity::Quarterly);
        assert_eq!(config.lookback_years, 10);
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(config.delimiter, DEFAULT_DELIMITER);
    }

    #[test]
    fn test_load_config_rejects_unknown_granularity() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "granularity = \"hourly\"").unwrap();

        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::ParseFailed(_))
        ));
    }

    #[test]
    fn test_load_config_rejects_zero_chunk_size() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "chunk_size = 0").unwrap();

        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::Invalid(EngineError::InvalidChunkSize))
        ));
    }

    #[test]
    fn test_load_config_rejects_unknown_option() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "lookback = 5").unwrap();

        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::ParseFailed(_))
        ));
    }
}
