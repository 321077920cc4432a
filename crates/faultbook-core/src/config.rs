use crate::error::FaultbookError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the store used when no database path is configured.
pub const DEFAULT_DATABASE: &str = "errorCodesTechnologies.db";

/// Settings for an extraction or search session.
///
/// Every field is optional in the JSON file; missing fields take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Path of the SQLite store.
    pub database: PathBuf,
    pub extractor: ExtractorSettings,
    pub generic: GenericSettings,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        ExtractConfig {
            database: PathBuf::from(DEFAULT_DATABASE),
            extractor: ExtractorSettings::default(),
            generic: GenericSettings::default(),
        }
    }
}

/// Geometry thresholds used to turn positioned words into table rows.
/// All distances are in PDF points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorSettings {
    /// Max vertical distance between word centre lines in the same row.
    pub row_tolerance: f32,
    /// Min horizontal gap between two words that starts a new cell.
    pub column_gap: f32,
    /// Cells whose left edges lie within this distance share a column.
    pub column_snap: f32,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        ExtractorSettings {
            row_tolerance: 3.0,
            column_gap: 8.0,
            column_snap: 12.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenericSettings {
    /// Longest token accepted as an error code in generic mode.
    pub max_code_len: usize,
}

impl Default for GenericSettings {
    fn default() -> Self {
        GenericSettings { max_code_len: 16 }
    }
}

/// Load settings from a JSON file.
pub fn load_config(path: &Path) -> Result<ExtractConfig, FaultbookError> {
    let content = std::fs::read_to_string(path).map_err(|e| FaultbookError::ConfigLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_config(&content, path)
}

/// Parse settings from a JSON string.
pub fn parse_config(json: &str, source: &Path) -> Result<ExtractConfig, FaultbookError> {
    let config: ExtractConfig =
        serde_json::from_str(json).map_err(|e| FaultbookError::ConfigLoad {
            path: source.to_path_buf(),
            reason: e.to_string(),
        })?;
    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &ExtractConfig) -> Result<(), FaultbookError> {
    if config.database.as_os_str().is_empty() {
        return Err(FaultbookError::ConfigInvalid(
            "database path must not be empty".into(),
        ));
    }

    let ex = &config.extractor;
    for (name, value) in [
        ("row_tolerance", ex.row_tolerance),
        ("column_gap", ex.column_gap),
        ("column_snap", ex.column_snap),
    ] {
        if !value.is_finite() || value <= 0.0 {
            return Err(FaultbookError::ConfigInvalid(format!(
                "extractor.{name} must be a positive number, got {value}"
            )));
        }
    }

    if config.generic.max_code_len == 0 {
        return Err(FaultbookError::ConfigInvalid(
            "generic.max_code_len must be at least 1".into(),
        ));
    }

    Ok(())
}
