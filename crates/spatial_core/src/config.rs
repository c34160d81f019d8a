//! Environment-driven engine configuration.
//!
//! # Invariants
//! - Absent variables fall back to defaults; present but invalid values are
//!   errors, never silently replaced.
//! - `pool_size` always lies in `1..=MAX_POOL_SIZE`.

use crate::db::MAX_POOL_SIZE;
use crate::logging::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_VAR: &str = "SPATIAL_DB_PATH";
pub const POOL_SIZE_VAR: &str = "SPATIAL_POOL_SIZE";
pub const LOG_LEVEL_VAR: &str = "SPATIAL_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "SPATIAL_LOG_DIR";

pub const DEFAULT_POOL_SIZE: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpatialConfig {
    /// SQLite file; `None` selects an in-memory store.
    pub db_path: Option<PathBuf>,
    pub pool_size: usize,
    pub log_level: String,
    /// Rolling log directory; `None` leaves logging off.
    pub log_dir: Option<PathBuf>,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            pool_size: DEFAULT_POOL_SIZE,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl SpatialConfig {
    /// Reads `SPATIAL_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable source.
    ///
    /// Empty values count as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let pool_size = match read(POOL_SIZE_VAR) {
            Some(raw) => parse_pool_size(&raw)?,
            None => defaults.pool_size,
        };

        Ok(Self {
            db_path: read(DB_PATH_VAR).map(PathBuf::from),
            pool_size,
            log_level: read(LOG_LEVEL_VAR).unwrap_or(defaults.log_level),
            log_dir: read(LOG_DIR_VAR).map(PathBuf::from),
        })
    }
}

/// Parses and range-checks a pool size.
pub fn parse_pool_size(raw: &str) -> Result<usize, ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        variable: POOL_SIZE_VAR,
        value: raw.to_string(),
        expected: "an integer between 1 and 64",
    };
    let size = raw.trim().parse::<usize>().map_err(|_| invalid())?;
    if size == 0 || size > MAX_POOL_SIZE {
        return Err(invalid());
    }
    Ok(size)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        variable: &'static str,
        value: String,
        expected: &'static str,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue {
                variable,
                value,
                expected,
            } => write!(f, "{variable}=`{value}` is invalid; expected {expected}"),
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::{ConfigError, SpatialConfig, DEFAULT_POOL_SIZE};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn config_from(pairs: &[(&str, &str)]) -> Result<SpatialConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        SpatialConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config, SpatialConfig::default());
        assert_eq!(config.pool_size, DEFAULT_POOL_SIZE);
        assert!(config.db_path.is_none());
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn reads_all_variables() {
        let config = config_from(&[
            ("SPATIAL_DB_PATH", "/tmp/spatial.db"),
            ("SPATIAL_POOL_SIZE", " 8 "),
            ("SPATIAL_LOG_LEVEL", "warn"),
            ("SPATIAL_LOG_DIR", "/tmp/spatial-logs"),
        ])
        .unwrap();
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/spatial.db")));
        assert_eq!(config.pool_size, 8);
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, Some(PathBuf::from("/tmp/spatial-logs")));
    }

    #[test]
    fn blank_values_count_as_absent() {
        let config = config_from(&[("SPATIAL_DB_PATH", "  "), ("SPATIAL_POOL_SIZE", "")]).unwrap();
        assert!(config.db_path.is_none());
        assert_eq!(config.pool_size, DEFAULT_POOL_SIZE);
    }

    #[test]
    fn out_of_range_pool_size_is_rejected() {
        for raw in ["0", "65", "four", "-1"] {
            let err = config_from(&[("SPATIAL_POOL_SIZE", raw)]).unwrap_err();
            assert!(err.to_string().starts_with("SPATIAL_POOL_SIZE="), "{err}");
        }
    }
}
