//! Shared application state for the web server.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use helyx_genome::GenomeClient;
use helyx_model::{HttpScorer, MockScorer, SequenceScorer};
use helyx_scoring::{CalibrationArtifact, CalibrationParameters, DeltaScorer};
use tracing::{info, warn};

use crate::config::Config;

/// Shared state injected into every Axum handler. Built once at startup;
/// everything in here is read-only across requests.
pub struct AppState {
    pub genome: GenomeClient,
    pub scorer: DeltaScorer,
    pub calibration: CalibrationParameters,
    pub window_size: usize,
}

impl AppState {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let genome = GenomeClient::new(
            &config.genome.api_base,
            Duration::from_secs(config.genome.timeout_secs),
        )?;

        let backend: Arc<dyn SequenceScorer> = match config.model.backend.as_str() {
            "http" => {
                let endpoint = config
                    .model
                    .endpoint
                    .clone()
                    .context("model.backend = \"http\" needs model.endpoint")?;
                info!(
                    "Scoring against {} with checkpoint {}",
                    endpoint, config.model.checkpoint
                );
                Arc::new(HttpScorer::new(
                    endpoint,
                    &config.model.checkpoint,
                    Duration::from_secs(config.model.timeout_secs),
                ))
            }
            "mock" => {
                warn!("Scoring with the mock backend; predictions are meaningless");
                Arc::new(MockScorer::new())
            }
            other => bail!("unknown model.backend {:?} (expected \"http\" or \"mock\")", other),
        };

        let calibration = match &config.calibration.artifact {
            Some(path) => {
                let artifact = CalibrationArtifact::load(std::path::Path::new(path))
                    .with_context(|| format!("loading calibration artifact {}", path))?;
                info!("Loaded calibration artifact from {}", path);
                artifact.calibration
            }
            None => {
                info!("No calibration artifact configured, using BRCA1 defaults");
                CalibrationParameters::brca1_defaults()
            }
        };

        Ok(Self {
            genome,
            scorer: DeltaScorer::new(backend),
            calibration,
            window_size: config.genome.window_size,
        })
    }
}

pub type SharedState = Arc<AppState>;
