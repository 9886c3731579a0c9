//! Configuration loading for the Helyx service.
//! Reads helyx.toml from the current directory or the path in the
//! HELYX_CONFIG env var; a missing file falls back to full defaults so the
//! service always comes up (with the mock scorer).

use std::path::Path;

use helyx_common::error::HelyxError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub genome: GenomeConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub calibration: CalibrationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 3001 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenomeConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,
}

fn default_api_base() -> String { helyx_genome::client::DEFAULT_API_BASE.to_string() }
fn default_window_size() -> usize { 8192 }
fn default_fetch_timeout() -> u64 { 30 }

impl Default for GenomeConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            window_size: default_window_size(),
            timeout_secs: default_fetch_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// "http" for a live inference endpoint, "mock" for local bring-up.
    #[serde(default = "default_backend")]
    pub backend: String,
    pub endpoint: Option<String>,
    #[serde(default = "default_checkpoint")]
    pub checkpoint: String,
    #[serde(default = "default_score_timeout")]
    pub timeout_secs: u64,
}

fn default_backend() -> String { "mock".to_string() }
fn default_checkpoint() -> String { "evo2_7b".to_string() }
fn default_score_timeout() -> u64 { 120 }

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            endpoint: None,
            checkpoint: default_checkpoint(),
            timeout_secs: default_score_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CalibrationConfig {
    /// Path to a calibration artifact written by helyx-calibrate. Absent →
    /// the published BRCA1 constants.
    pub artifact: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, HelyxError> {
        let path = std::env::var("HELYX_CONFIG").unwrap_or_else(|_| "helyx.toml".to_string());
        Self::from_path(Path::new(&path))
    }

    pub fn from_path(path: &Path) -> Result<Self, HelyxError> {
        if !path.exists() {
            tracing::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|e| HelyxError::Config(format!("reading {}: {}", path.display(), e)))?;
        toml::from_str(&raw)
            .map_err(|e| HelyxError::Config(format!("parsing {}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.genome.window_size, 8192);
        assert_eq!(config.model.backend, "mock");
        assert_eq!(config.model.checkpoint, "evo2_7b");
        assert!(config.calibration.artifact.is_none());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [model]
            backend = "http"
            endpoint = "http://localhost:8000/score"

            [genome]
            window_size = 4096
            "#,
        )
        .unwrap();
        assert_eq!(config.model.backend, "http");
        assert_eq!(config.model.endpoint.as_deref(), Some("http://localhost:8000/score"));
        assert_eq!(config.model.timeout_secs, 120);
        assert_eq!(config.genome.window_size, 4096);
        assert_eq!(config.genome.api_base, helyx_genome::client::DEFAULT_API_BASE);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_missing_file_is_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::from_path(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.model.backend, "mock");
    }
}
