//! Variant sequence construction and delta scoring.

use std::sync::Arc;

use helyx_common::dna::is_dna_base;
use helyx_model::{ScorerError, SequenceScorer};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("variant offset {offset} outside window of length {len}")]
    OffsetOutOfRange { offset: usize, len: usize },

    #[error("'{0}' is not a DNA base")]
    InvalidBase(char),

    #[error("scoring backend error: {0}")]
    Backend(#[from] ScorerError),
}

/// A single-nucleotide variant. `reference` is the base observed in the
/// fetched window, never the caller's claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    pub chromosome: String,
    /// 1-based chromosome position.
    pub position: u64,
    pub reference: char,
    pub alt: char,
}

/// Log-likelihoods of the reference window and its variant counterpart.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ScorePair {
    pub ref_score: f64,
    pub var_score: f64,
}

impl ScorePair {
    pub fn delta(&self) -> f64 {
        self.var_score - self.ref_score
    }
}

/// Builds the variant sequence by substituting the single base at `offset`.
pub fn apply_variant(window: &str, offset: usize, alt: char) -> Result<String, ScoringError> {
    let alt = alt.to_ascii_uppercase();
    if !is_dna_base(alt) {
        return Err(ScoringError::InvalidBase(alt));
    }
    if offset >= window.chars().count() {
        return Err(ScoringError::OffsetOutOfRange {
            offset,
            len: window.chars().count(),
        });
    }
    Ok(window
        .chars()
        .enumerate()
        .map(|(i, c)| if i == offset { alt } else { c })
        .collect())
}

/// Scores reference/variant pairs through an injected scorer. One batch call
/// of two sequences per variant; the model invocation is opaque and slow,
/// and nothing here retries it.
#[derive(Clone)]
pub struct DeltaScorer {
    scorer: Arc<dyn SequenceScorer>,
}

impl DeltaScorer {
    pub fn new(scorer: Arc<dyn SequenceScorer>) -> Self {
        Self { scorer }
    }

    pub fn checkpoint(&self) -> &str {
        self.scorer.checkpoint()
    }

    pub async fn score(
        &self,
        window: &str,
        offset: usize,
        alt: char,
    ) -> Result<ScorePair, ScoringError> {
        let var_seq = apply_variant(window, offset, alt)?;
        let scores = self
            .scorer
            .score_batch(&[window.to_string(), var_seq])
            .await?;
        if scores.len() != 2 {
            return Err(ScoringError::Backend(ScorerError::ShapeMismatch {
                expected: 2,
                got: scores.len(),
            }));
        }
        Ok(ScorePair {
            ref_score: scores[0],
            var_score: scores[1],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helyx_model::MockScorer;

    #[test]
    fn test_substitution_changes_only_target_base() {
        let window = "AAAAAAAAAACAAAAAAAAAA"; // 21 bases
        let variant = apply_variant(window, 10, 'T').unwrap();
        assert_eq!(variant.len(), window.len());
        for (i, (w, v)) in window.chars().zip(variant.chars()).enumerate() {
            if i == 10 {
                assert_eq!(v, 'T');
            } else {
                assert_eq!(v, w);
            }
        }
    }

    #[test]
    fn test_substitution_uppercases_alt() {
        assert_eq!(apply_variant("ACGT", 0, 'g').unwrap(), "GCGT");
    }

    #[test]
    fn test_offset_out_of_range() {
        let err = apply_variant("ACGT", 4, 'A').unwrap_err();
        assert!(matches!(
            err,
            ScoringError::OffsetOutOfRange { offset: 4, len: 4 }
        ));
    }

    #[test]
    fn test_non_base_alt_rejected() {
        assert!(matches!(
            apply_variant("ACGT", 1, 'N'),
            Err(ScoringError::InvalidBase('N'))
        ));
    }

    #[tokio::test]
    async fn test_delta_scorer_scores_ref_and_var() {
        let window = "AAAAAAAAAAAAAAAAAAAAA";
        let var_seq = apply_variant(window, 10, 'T').unwrap();
        let scorer = MockScorer::new().with(window, 0.10).with(&var_seq, 0.05);
        let pair = DeltaScorer::new(Arc::new(scorer))
            .score(window, 10, 'T')
            .await
            .unwrap();
        assert_eq!(pair.ref_score, 0.10);
        assert_eq!(pair.var_score, 0.05);
        assert!((pair.delta() - (-0.05)).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_delta_scorer_propagates_bad_offset() {
        let scorer = DeltaScorer::new(Arc::new(MockScorer::new()));
        let err = scorer.score("ACGT", 99, 'T').await.unwrap_err();
        assert!(matches!(err, ScoringError::OffsetOutOfRange { .. }));
    }
}
