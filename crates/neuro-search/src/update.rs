/// Reload service for the data files.
///
/// The data set is identified by a SHA-256 fingerprint over both files. A
/// reload re-parses and rebuilds the catalog only when that fingerprint moved.
/// Runs at startup and on demand through the `reload_data` MCP tool.
use std::path::Path;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::info;

use crate::cache::SearchCache;
use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::AppError;
use crate::parser;

/// Result of an update operation.
pub struct UpdateResult {
    /// Whether the catalog was rebuilt.
    pub updated: bool,
    /// Fingerprint of the data files on disk.
    pub fingerprint: String,
}

pub struct UpdateService {
    config: Config,
    cache: Arc<SearchCache>,
}

impl UpdateService {
    pub fn new(config: Config, cache: Arc<SearchCache>) -> Self {
        Self { config, cache }
    }

    pub fn data_fingerprint(&self) -> Result<String, AppError> {
        let mut hasher = Sha256::new();
        for path in [self.config.treatments_path(), self.config.pathologies_path()] {
            hasher.update(read_bytes(&path)?);
            hasher.update(b"\0");
        }
        Ok(format!("{:x}", hasher.finalize()))
    }

    pub fn needs_update(&self, current: &str) -> Result<bool, AppError> {
        Ok(self.data_fingerprint()? != current)
    }

    /// Parse both files and build a fresh catalog. Clears the search cache.
    pub fn full_reload(&self) -> Result<Catalog, AppError> {
        let fingerprint = self.data_fingerprint()?;
        info!(fingerprint = %fingerprint, "loading data files");

        let treatments = parser::load_treatments(&self.config.treatments_path())?;
        let pathologies = parser::load_pathologies(&self.config.pathologies_path())?;
        info!(
            treatments = treatments.len(),
            pathologies = pathologies.len(),
            "parsed data files"
        );

        let catalog = Catalog::new(pathologies, treatments, fingerprint);
        self.cache.invalidate_all();
        Ok(catalog)
    }

    /// Check the fingerprint against `current` and reload when it differs.
    pub fn update(&self, current: &str) -> Result<(UpdateResult, Option<Catalog>), AppError> {
        if !self.needs_update(current)? {
            info!(fingerprint = %current, "data files unchanged, skipping reload");
            return Ok((
                UpdateResult {
                    updated: false,
                    fingerprint: current.to_string(),
                },
                None,
            ));
        }

        let catalog = self.full_reload()?;
        Ok((
            UpdateResult {
                updated: true,
                fingerprint: catalog.fingerprint().to_string(),
            },
            Some(catalog),
        ))
    }
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, AppError> {
    std::fs::read(path).map_err(|source| AppError::Io {
        path: path.to_path_buf(),
        source,
    })
}
