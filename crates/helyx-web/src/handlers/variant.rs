//! Single-variant analysis endpoint: fetch the reference window, delta-score
//! the substitution, classify against the calibration constants.

use axum::extract::{Json, State};
use helyx_common::dna::parse_base;
use helyx_common::error::ApiError;
use helyx_genome::{GenomeError, GenomeWindow};
use helyx_model::ScorerError;
use helyx_scoring::variant::ScoringError;
use helyx_scoring::{classify, CalibrationParameters, DeltaScorer, Prediction, Variant};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct AnalyseVariantRequest {
    /// 1-based chromosome position of the variant.
    pub variant_pos: u64,
    /// Genome assembly id, e.g. "hg38".
    pub genome: String,
    /// Alternate base.
    pub alt: String,
    pub chromosome: String,
}

#[derive(Debug, Serialize)]
pub struct AnalyseVariantResponse {
    pub prediction: Prediction,
    pub classification_conf: f64,
    pub delta_score: f64,
    /// Reference base observed in the fetched window.
    pub reference: String,
    pub alternative: String,
    pub position: u64,
}

/// POST /api/variant/analyse
pub async fn analyse_variant(
    State(state): State<SharedState>,
    Json(req): Json<AnalyseVariantRequest>,
) -> Result<Json<AnalyseVariantResponse>, ApiError> {
    let alt = parse_base(&req.alt).ok_or_else(|| {
        ApiError::BadRequest(format!("alt must be a single A/C/G/T base, got {:?}", req.alt))
    })?;
    if req.variant_pos < 1 {
        return Err(ApiError::BadRequest(
            "variant_pos is 1-based and must be >= 1".into(),
        ));
    }
    if req.genome.trim().is_empty() || req.chromosome.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "genome and chromosome must be non-empty".into(),
        ));
    }

    info!(
        "Analysing variant at {}:{} with alt {} in {}",
        req.chromosome, req.variant_pos, alt, req.genome
    );

    let window = state
        .genome
        .fetch_window(&req.genome, &req.chromosome, req.variant_pos, state.window_size)
        .await
        .map_err(genome_api_error)?;

    if window.truncated {
        warn!(
            "window for {}:{} came back short ({} bases), continuing",
            req.chromosome,
            req.variant_pos,
            window.len()
        );
    }

    let result = analyse_window(
        &window,
        req.variant_pos,
        alt,
        &state.scorer,
        &state.calibration,
    )
    .await?;
    Ok(Json(result))
}

/// Pipeline stage after the fetch, split out so tests can drive it with a
/// constructed window and a stub scorer.
pub(crate) async fn analyse_window(
    window: &GenomeWindow,
    variant_pos: u64,
    alt: char,
    scorer: &DeltaScorer,
    calibration: &CalibrationParameters,
) -> Result<AnalyseVariantResponse, ApiError> {
    let offset = window.offset_of(variant_pos).ok_or_else(|| {
        ApiError::BadRequest(format!(
            "variant position {} is outside the window {}:{}-{}",
            variant_pos,
            window.chromosome,
            window.start,
            window.end()
        ))
    })?;

    let reference = window
        .base_at(offset)
        .ok_or_else(|| ApiError::Internal("window offset out of bounds".into()))?;
    let variant = Variant {
        chromosome: window.chromosome.clone(),
        position: variant_pos,
        reference,
        alt,
    };

    let pair = scorer
        .score(&window.sequence, offset, variant.alt)
        .await
        .map_err(scoring_api_error)?;
    let delta = pair.delta();
    let classification = classify(delta, calibration);

    info!(
        "{}:{} {}>{} delta {:+.6} classified {:?} (conf {:.3})",
        variant.chromosome,
        variant.position,
        variant.reference,
        variant.alt,
        delta,
        classification.prediction,
        classification.confidence
    );

    Ok(AnalyseVariantResponse {
        prediction: classification.prediction,
        classification_conf: classification.confidence,
        delta_score: delta,
        reference: variant.reference.to_string(),
        alternative: variant.alt.to_string(),
        position: variant.position,
    })
}

fn genome_api_error(err: GenomeError) -> ApiError {
    match err {
        GenomeError::Timeout(_) => ApiError::Timeout(err.to_string()),
        _ => ApiError::Upstream(err.to_string()),
    }
}

fn scoring_api_error(err: ScoringError) -> ApiError {
    match &err {
        ScoringError::OffsetOutOfRange { .. } | ScoringError::InvalidBase(_) => {
            ApiError::BadRequest(err.to_string())
        }
        ScoringError::Backend(ScorerError::Timeout(_)) => ApiError::Timeout(err.to_string()),
        ScoringError::Backend(_) => ApiError::Scoring(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helyx_model::MockScorer;
    use helyx_scoring::apply_variant;
    use std::sync::Arc;

    fn window(start: u64, sequence: &str) -> GenomeWindow {
        GenomeWindow {
            genome: "hg38".to_string(),
            chromosome: "chr17".to_string(),
            start,
            sequence: sequence.to_string(),
            truncated: false,
        }
    }

    fn params() -> CalibrationParameters {
        CalibrationParameters {
            threshold: -0.02,
            lof_std: 0.01,
            func_std: 0.01,
        }
    }

    #[tokio::test]
    async fn test_end_to_end_with_mocked_scores() {
        // 21-base window starting at chromosome offset 100; the variant sits
        // at relative offset 10, i.e. 1-based position 111.
        let w = window(100, "AAAAAAAAAAAAAAAAAAAAA");
        let var_seq = apply_variant(&w.sequence, 10, 'T').unwrap();
        let scorer = DeltaScorer::new(Arc::new(
            MockScorer::new().with(&w.sequence, 0.10).with(&var_seq, 0.05),
        ));

        let resp = analyse_window(&w, 111, 'T', &scorer, &params()).await.unwrap();
        assert_eq!(resp.prediction, Prediction::LikelyPathogenic);
        assert_eq!(resp.classification_conf, 1.0);
        assert!((resp.delta_score - (-0.05)).abs() < 1e-12);
        assert_eq!(resp.reference, "A");
        assert_eq!(resp.alternative, "T");
        assert_eq!(resp.position, 111);
    }

    #[tokio::test]
    async fn test_position_outside_window_is_client_error() {
        let w = window(100, "ACGTACGTAC");
        let scorer = DeltaScorer::new(Arc::new(MockScorer::new()));
        let err = analyse_window(&w, 50, 'T', &scorer, &params()).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err = analyse_window(&w, 200, 'T', &scorer, &params()).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_reference_comes_from_the_window() {
        let w = window(0, "ACGTACGTAC");
        let scorer = DeltaScorer::new(Arc::new(MockScorer::new().with_default(0.0)));
        // 1-based position 3 is relative offset 2 → 'G'
        let resp = analyse_window(&w, 3, 'A', &scorer, &params()).await.unwrap();
        assert_eq!(resp.reference, "G");
    }

    #[tokio::test]
    async fn test_truncated_window_still_analysable() {
        // Clipped window at the chromosome start still covers the variant.
        let mut w = window(0, "ACGTACGTAC");
        w.truncated = true;
        let scorer = DeltaScorer::new(Arc::new(MockScorer::new().with_default(-0.5)));
        let resp = analyse_window(&w, 1, 'C', &scorer, &params()).await.unwrap();
        assert_eq!(resp.reference, "A");
        assert_eq!(resp.position, 1);
    }
}
