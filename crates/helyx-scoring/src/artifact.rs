//! The calibration artifact: a small TOML file written by the offline
//! helyx-calibrate job and loaded by the service at startup.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classify::CalibrationParameters;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("TOML encode error: {0}")]
    Encode(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationArtifact {
    pub calibration: CalibrationParameters,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Provenance>,
}

/// Where the constants came from. Informational; the service only reads
/// `[calibration]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provenance {
    pub dataset: String,
    pub checkpoint: String,
    pub genome: String,
    pub window_size: usize,
    pub n_lof: usize,
    pub n_func: usize,
    pub n_skipped: usize,
    pub auroc: f64,
    pub fitted_at: DateTime<Utc>,
}

impl CalibrationArtifact {
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ArtifactError> {
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }
}
