//! Sequence scorer trait and concrete implementations.
//!
//! Backends:
//!   HttpScorer — remote inference endpoint holding the pretrained genomic
//!                model (loaded once per worker behind that endpoint)
//!   MockScorer — fixed in-memory scores for tests and local bring-up
//!
//! A scorer maps a batch of DNA sequences to one scalar log-likelihood per
//! sequence, same order. Scoring is slow (seconds on GPU hardware), so every
//! remote call carries its own budget; there are no retries at this layer.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::instrument;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ScorerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
    #[error("API error [{status}]: {message}")]
    Api { status: u16, message: String },
    #[error("scoring timed out after {0}s")]
    Timeout(u64),
    #[error("backend returned {got} scores for {expected} sequences")]
    ShapeMismatch { expected: usize, got: usize },
}

// ── Trait ─────────────────────────────────────────────────────────────────────

/// Capability interface over the pretrained sequence model. The live service
/// injects an `HttpScorer`; tests inject a `MockScorer`.
#[async_trait]
pub trait SequenceScorer: Send + Sync {
    /// Score a batch of sequences, one log-likelihood per input, same order.
    async fn score_batch(&self, sequences: &[String]) -> Result<Vec<f64>, ScorerError>;

    /// Named pretrained checkpoint backing this scorer.
    fn checkpoint(&self) -> &str;
}

// ── Helpers ──────────────────────────────────────────────────────────────────

async fn check_response_status(resp: reqwest::Response) -> Result<serde_json::Value, ScorerError> {
    let status = resp.status().as_u16();
    let body: serde_json::Value = resp.json().await?;
    if status >= 400 {
        let msg = body["error"]["message"]
            .as_str()
            .or_else(|| body["error"].as_str())
            .or_else(|| body["message"].as_str())
            .unwrap_or("unknown inference error")
            .to_string();
        return Err(ScorerError::Api { status, message: msg });
    }
    Ok(body)
}

// ── 1. HTTP inference endpoint ───────────────────────────────────────────────

/// Client for a remote scoring endpoint. POSTs
/// `{ "checkpoint": ..., "sequences": [...] }` and expects
/// `{ "scores": [...] }` back.
pub struct HttpScorer {
    pub endpoint: String,
    pub checkpoint: String,
    budget: Duration,
    client: reqwest::Client,
}

impl HttpScorer {
    pub fn new(
        endpoint: impl Into<String>,
        checkpoint: impl Into<String>,
        budget: Duration,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            checkpoint: checkpoint.into(),
            budget,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SequenceScorer for HttpScorer {
    #[instrument(skip(self, sequences), fields(batch = sequences.len()))]
    async fn score_batch(&self, sequences: &[String]) -> Result<Vec<f64>, ScorerError> {
        let body = serde_json::json!({
            "checkpoint": self.checkpoint,
            "sequences":  sequences,
        });

        let send = self.client.post(&self.endpoint).json(&body).send();
        let resp = tokio::time::timeout(self.budget, send)
            .await
            .map_err(|_| ScorerError::Timeout(self.budget.as_secs()))??;

        let json = tokio::time::timeout(self.budget, check_response_status(resp))
            .await
            .map_err(|_| ScorerError::Timeout(self.budget.as_secs()))??;

        let scores: Vec<f64> = serde_json::from_value(json["scores"].clone())?;
        if scores.len() != sequences.len() {
            return Err(ScorerError::ShapeMismatch {
                expected: sequences.len(),
                got: scores.len(),
            });
        }
        Ok(scores)
    }

    fn checkpoint(&self) -> &str {
        &self.checkpoint
    }
}

// ── 2. Mock scorer for testing ───────────────────────────────────────────────

pub struct MockScorer {
    scores: HashMap<String, f64>,
    default_score: f64,
}

impl MockScorer {
    pub fn new() -> Self {
        Self {
            scores: HashMap::new(),
            default_score: 0.0,
        }
    }

    /// Pin the score returned for one exact sequence.
    pub fn with(mut self, sequence: &str, score: f64) -> Self {
        self.scores.insert(sequence.to_string(), score);
        self
    }

    /// Score returned for sequences without a pinned value.
    pub fn with_default(mut self, score: f64) -> Self {
        self.default_score = score;
        self
    }
}

impl Default for MockScorer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SequenceScorer for MockScorer {
    async fn score_batch(&self, sequences: &[String]) -> Result<Vec<f64>, ScorerError> {
        Ok(sequences
            .iter()
            .map(|s| self.scores.get(s).copied().unwrap_or(self.default_score))
            .collect())
    }

    fn checkpoint(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_scorer_pinned_and_default() {
        let scorer = MockScorer::new().with("ACGT", 0.10).with_default(-1.0);
        let scores = scorer
            .score_batch(&["ACGT".to_string(), "TTTT".to_string()])
            .await
            .unwrap();
        assert_eq!(scores, vec![0.10, -1.0]);
    }

    #[tokio::test]
    async fn test_mock_scorer_preserves_order() {
        let scorer = MockScorer::new().with("A", 1.0).with("C", 2.0);
        let scores = scorer
            .score_batch(&["C".to_string(), "A".to_string(), "C".to_string()])
            .await
            .unwrap();
        assert_eq!(scores, vec![2.0, 1.0, 2.0]);
    }

    #[test]
    fn test_http_scorer_request_body_shape() {
        // The wire contract the inference side is built against.
        let body = serde_json::json!({
            "checkpoint": "evo2_7b",
            "sequences":  ["ACGT", "AGGT"],
        });
        assert_eq!(body["checkpoint"], "evo2_7b");
        assert_eq!(body["sequences"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_score_parse_and_shape_check() {
        let json = serde_json::json!({ "scores": [0.1, 0.2, 0.3] });
        let scores: Vec<f64> = serde_json::from_value(json["scores"].clone()).unwrap();
        assert_eq!(scores.len(), 3);

        let err = ScorerError::ShapeMismatch { expected: 2, got: 3 };
        assert!(err.to_string().contains("3 scores for 2 sequences"));
    }
}
