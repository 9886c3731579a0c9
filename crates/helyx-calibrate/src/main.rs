//! helyx-calibrate — Offline calibration job.
//!
//! Scores a labeled SNV dataset through the sequence model, fits the
//! classification threshold (Youden's J over the ROC curve) and per-class
//! spreads, and writes the calibration artifact the service loads at startup.
//!
//! Run with: cargo run -p helyx-calibrate -- --dataset brca1.csv --endpoint <url>

mod dataset;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use chrono::Utc;
use clap::Parser;
use helyx_genome::{window_span, GenomeClient, GenomeWindow};
use helyx_model::{HttpScorer, MockScorer, SequenceScorer};
use helyx_scoring::artifact::{CalibrationArtifact, Provenance};
use helyx_scoring::calibrate::{self, LabeledDelta};
use helyx_scoring::variant::apply_variant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "helyx-calibrate",
    about = "Fit the SNV classification threshold from a labeled variant dataset"
)]
struct Args {
    /// CSV dataset with chrom,pos,ref,alt,class columns
    #[arg(long)]
    dataset: PathBuf,

    /// Genome assembly the dataset coordinates refer to
    #[arg(long, default_value = "hg19")]
    genome: String,

    /// Reference window size in bases
    #[arg(long, default_value_t = 8192)]
    window_size: usize,

    /// Cap on the number of dataset rows scored
    #[arg(long, default_value_t = 500)]
    limit: usize,

    /// Genome-browser sequence API base URL
    #[arg(long, default_value = helyx_genome::client::DEFAULT_API_BASE)]
    genome_api: String,

    /// Scoring endpoint URL
    #[arg(long, env = "HELYX_MODEL_ENDPOINT")]
    endpoint: Option<String>,

    /// Pretrained checkpoint name
    #[arg(long, default_value = "evo2_7b")]
    checkpoint: String,

    /// Per-fetch budget in seconds
    #[arg(long, default_value_t = 30)]
    fetch_timeout_secs: u64,

    /// Per-scoring-call budget in seconds
    #[arg(long, default_value_t = 600)]
    score_timeout_secs: u64,

    /// Score with the mock backend (plumbing checks only)
    #[arg(long)]
    mock: bool,

    /// Output artifact path
    #[arg(long, default_value = "calibration.toml")]
    output: PathBuf,
}

struct Pending {
    ref_idx: usize,
    var_seq: String,
    is_lof: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    run(args).await
}

async fn run(args: Args) -> anyhow::Result<()> {
    let all_rows = dataset::load_dataset(&args.dataset)?;
    let rows: Vec<_> = all_rows.iter().take(args.limit).cloned().collect();
    info!(
        "Loaded {} variants from {}, scoring {}",
        all_rows.len(),
        args.dataset.display(),
        rows.len()
    );

    let genome_client = GenomeClient::new(
        &args.genome_api,
        Duration::from_secs(args.fetch_timeout_secs),
    )?;

    let scorer: Arc<dyn SequenceScorer> = if args.mock {
        warn!("Scoring with the mock backend; the fitted constants are meaningless");
        Arc::new(MockScorer::new())
    } else {
        let endpoint = args
            .endpoint
            .clone()
            .context("--endpoint (or HELYX_MODEL_ENDPOINT) is required unless --mock is set")?;
        Arc::new(HttpScorer::new(
            endpoint,
            &args.checkpoint,
            Duration::from_secs(args.score_timeout_secs),
        ))
    };

    // Saturation datasets list several alternates per position; fetch and
    // score each distinct reference window once.
    let mut window_index: HashMap<(String, u64, u64), usize> = HashMap::new();
    let mut windows: Vec<GenomeWindow> = Vec::new();
    let mut pending: Vec<Pending> = Vec::new();
    let mut skipped = 0usize;

    for row in &rows {
        let (start, end) = window_span(row.pos, args.window_size);
        let key = (row.chrom.clone(), start, end);
        let ref_idx = match window_index.get(&key).copied() {
            Some(idx) => idx,
            None => {
                let w = genome_client
                    .fetch_window(&args.genome, &row.chrom, row.pos, args.window_size)
                    .await?;
                windows.push(w);
                let idx = windows.len() - 1;
                window_index.insert(key, idx);
                idx
            }
        };

        let window = &windows[ref_idx];
        let Some(offset) = window.offset_of(row.pos) else {
            warn!(
                "{}:{} not covered by its fetched window, skipping",
                row.chrom, row.pos
            );
            skipped += 1;
            continue;
        };
        let observed = window.base_at(offset);
        if observed != Some(row.reference) {
            warn!(
                "{}:{} lists reference {} but the {} window holds {}, skipping",
                row.chrom,
                row.pos,
                row.reference,
                args.genome,
                observed.map(String::from).unwrap_or_else(|| "nothing".into())
            );
            skipped += 1;
            continue;
        }

        let var_seq = apply_variant(&window.sequence, offset, row.alt)?;
        pending.push(Pending {
            ref_idx,
            var_seq,
            is_lof: row.class.is_lof(),
        });
    }

    if pending.is_empty() {
        bail!("no scorable variants left after validation");
    }
    if skipped > 0 {
        warn!("{} variants skipped during validation", skipped);
    }

    let ref_seqs: Vec<String> = windows.iter().map(|w| w.sequence.clone()).collect();
    info!("Scoring {} unique reference windows...", ref_seqs.len());
    let ref_scores = scorer.score_batch(&ref_seqs).await?;

    let var_seqs: Vec<String> = pending.iter().map(|p| p.var_seq.clone()).collect();
    info!("Scoring {} variant sequences...", var_seqs.len());
    let var_scores = scorer.score_batch(&var_seqs).await?;

    let samples: Vec<LabeledDelta> = pending
        .iter()
        .zip(var_scores.iter())
        .map(|(p, &var_score)| LabeledDelta {
            delta: var_score - ref_scores[p.ref_idx],
            is_lof: p.is_lof,
        })
        .collect();

    let fit = calibrate::fit(&samples)?;
    info!(
        "AUROC {:.4} over {} LOF / {} FUNC+INT variants",
        fit.auroc, fit.n_lof, fit.n_func
    );
    info!(
        "threshold {:+.7}, lof_std {:.7}, func_std {:.7}",
        fit.params.threshold, fit.params.lof_std, fit.params.func_std
    );

    let artifact = CalibrationArtifact {
        calibration: fit.params,
        provenance: Some(Provenance {
            dataset: args.dataset.display().to_string(),
            checkpoint: scorer.checkpoint().to_string(),
            genome: args.genome.clone(),
            window_size: args.window_size,
            n_lof: fit.n_lof,
            n_func: fit.n_func,
            n_skipped: skipped,
            auroc: fit.auroc,
            fitted_at: Utc::now(),
        }),
    };
    artifact.save(&args.output)?;
    info!("Wrote calibration artifact to {}", args.output.display());

    Ok(())
}
