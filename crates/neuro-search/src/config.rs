use std::path::{Path, PathBuf};

use crate::error::AppError;

const DEFAULT_TREATMENTS_FILE: &str = "treatments.json";
const DEFAULT_PATHOLOGIES_FILE: &str = "headaches.json";
const DEFAULT_CACHE_CAPACITY: usize = 256;
const DEFAULT_SEARCH_LIMIT: usize = 12;
pub const MAX_SEARCH_LIMIT: usize = 50;

/// Application configuration loaded explicitly from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the JSON data files.
    pub data_dir: String,
    /// Treatments file name, relative to `data_dir`.
    pub treatments_file: String,
    /// Pathologies file name, relative to `data_dir`.
    pub pathologies_file: String,
    /// Search result cache size. 0 disables caching.
    pub cache_capacity: usize,
    /// Result count when a search call gives no limit.
    pub default_limit: usize,
}

impl Config {
    /// Required:
    /// - `NEUROTRACKER_DATA_DIR`
    ///
    /// Optional:
    /// - `NEUROTRACKER_TREATMENTS_FILE` (default: "treatments.json")
    /// - `NEUROTRACKER_PATHOLOGIES_FILE` (default: "headaches.json")
    /// - `SEARCH_CACHE_CAPACITY` (default: 256)
    /// - `SEARCH_DEFAULT_LIMIT` (default: 12, max: 50)
    pub fn from_env() -> Result<Self, AppError> {
        let data_dir = std::env::var("NEUROTRACKER_DATA_DIR").map_err(|_| {
            AppError::Config("NEUROTRACKER_DATA_DIR environment variable is required".to_string())
        })?;

        let config = Self {
            data_dir,
            treatments_file: std::env::var("NEUROTRACKER_TREATMENTS_FILE")
                .unwrap_or_else(|_| DEFAULT_TREATMENTS_FILE.to_string()),
            pathologies_file: std::env::var("NEUROTRACKER_PATHOLOGIES_FILE")
                .unwrap_or_else(|_| DEFAULT_PATHOLOGIES_FILE.to_string()),
            cache_capacity: parse_env("SEARCH_CACHE_CAPACITY")?.unwrap_or(DEFAULT_CACHE_CAPACITY),
            default_limit: parse_env("SEARCH_DEFAULT_LIMIT")?
                .unwrap_or(DEFAULT_SEARCH_LIMIT)
                .clamp(1, MAX_SEARCH_LIMIT),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        for file in [self.treatments_path(), self.pathologies_path()] {
            if !file.exists() {
                return Err(AppError::Config(format!(
                    "required file not found: {}",
                    file.display()
                )));
            }
        }
        Ok(())
    }

    pub fn treatments_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.treatments_file)
    }

    pub fn pathologies_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.pathologies_file)
    }
}

fn parse_env(name: &str) -> Result<Option<usize>, AppError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|e| AppError::Config(format!("{name} must be a non-negative integer: {e}"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(dir: &Path) -> Config {
        Config {
            data_dir: dir.to_string_lossy().to_string(),
            treatments_file: DEFAULT_TREATMENTS_FILE.to_string(),
            pathologies_file: DEFAULT_PATHOLOGIES_FILE.to_string(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            default_limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    #[test]
    fn validate_requires_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        assert!(matches!(config.validate(), Err(AppError::Config(_))));

        std::fs::write(dir.path().join("treatments.json"), "{}").unwrap();
        assert!(config.validate().is_err());

        std::fs::write(dir.path().join("headaches.json"), "{}").unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.pathologies_path(), dir.path().join("headaches.json"));
    }
}
