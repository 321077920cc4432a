pub mod config;
pub mod extract;
pub mod search;

use faultbook_core::config::{load_config, validate_config, ExtractConfig};
use faultbook_core::error::FaultbookError;
use std::path::PathBuf;

/// Global options shared by every subcommand.
pub struct Settings {
    pub config: Option<PathBuf>,
    pub db: Option<PathBuf>,
}

impl Settings {
    /// Settings file (or defaults) with command-line overrides applied.
    pub fn resolve(&self) -> Result<ExtractConfig, FaultbookError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ExtractConfig::default(),
        };
        if let Some(db) = &self.db {
            config.database = db.clone();
        }
        validate_config(&config)?;
        Ok(config)
    }
}
