//! UCSC genome-browser sequence API client.
//!
//! Endpoint used:
//!   getData/sequence: https://api.genome.ucsc.edu/getData/sequence
//!
//! The API answers JSON with a `dna` field holding the requested span, or an
//! `error` field when the assembly/chromosome/range is bad.

use std::time::Duration;

use helyx_common::egress::EgressClient;
use helyx_common::error::HelyxError;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

use crate::error::GenomeError;
use crate::window::{window_span, GenomeWindow};

pub const DEFAULT_API_BASE: &str = "https://api.genome.ucsc.edu";

pub struct GenomeClient {
    client: EgressClient,
    api_base: String,
    budget: Duration,
}

impl GenomeClient {
    /// `budget` bounds every fetch end to end; an exceeded budget surfaces
    /// as `GenomeError::Timeout`, distinct from ordinary fetch failures.
    pub fn new(api_base: impl Into<String>, budget: Duration) -> Result<Self, HelyxError> {
        let api_base = api_base.into();
        let mut client = EgressClient::with_timeout(budget)?;
        client.allow_url(&api_base);
        Ok(Self { client, api_base, budget })
    }

    fn map_reqwest(&self, e: reqwest::Error) -> GenomeError {
        if e.is_timeout() {
            GenomeError::Timeout(self.budget.as_secs())
        } else {
            GenomeError::Http(e)
        }
    }

    /// Fetch the reference window of `window_size` bases centred on the
    /// 1-based `pos`. The span clips at the chromosome origin; a clipped or
    /// otherwise short answer comes back flagged `truncated`, not as an error.
    #[instrument(skip(self))]
    pub async fn fetch_window(
        &self,
        genome: &str,
        chromosome: &str,
        pos: u64,
        window_size: usize,
    ) -> Result<GenomeWindow, GenomeError> {
        let (start, end) = window_span(pos, window_size);
        let url = format!("{}/getData/sequence", self.api_base);

        debug!("Fetching {}:{}-{} from {}", chromosome, start, end, genome);

        let request = self
            .client
            .get(&url)
            .map_err(|e| GenomeError::Egress(e.to_string()))?
            .query(&[("genome", genome), ("chrom", chromosome)])
            .query(&[("start", start.to_string()), ("end", end.to_string())]);

        let resp = timeout(self.budget, request.send())
            .await
            .map_err(|_| GenomeError::Timeout(self.budget.as_secs()))?
            .map_err(|e| self.map_reqwest(e))?;

        let status = resp.status().as_u16();
        let body: serde_json::Value = timeout(self.budget, resp.json())
            .await
            .map_err(|_| GenomeError::Timeout(self.budget.as_secs()))?
            .map_err(|e| self.map_reqwest(e))?;

        window_from_response(status, &body, genome, chromosome, start, end)
    }
}

/// Turns a raw sequence API answer into a `GenomeWindow`.
fn window_from_response(
    status: u16,
    body: &serde_json::Value,
    genome: &str,
    chromosome: &str,
    start: u64,
    end: u64,
) -> Result<GenomeWindow, GenomeError> {
    if status >= 400 {
        let message = body["error"]
            .as_str()
            .unwrap_or("unknown sequence API error")
            .to_string();
        return Err(GenomeError::Api { status, message });
    }

    // The API reports some failures with a 200 status and an `error` field.
    if let Some(message) = body["error"].as_str() {
        return Err(GenomeError::Api {
            status,
            message: message.to_string(),
        });
    }

    let dna = match body["dna"].as_str() {
        Some(dna) => dna,
        None => {
            let snippet: String = body.to_string().chars().take(200).collect();
            return Err(GenomeError::MissingSequence(snippet));
        }
    };

    let sequence = dna.to_ascii_uppercase();
    let expected = (end - start) as usize;
    let truncated = sequence.len() != expected;
    if truncated {
        warn!(
            "sequence length mismatch for {}:{}-{}: expected {}, got {}",
            chromosome,
            start,
            end,
            expected,
            sequence.len()
        );
    }

    Ok(GenomeWindow {
        genome: genome.to_string(),
        chromosome: chromosome.to_string(),
        start,
        sequence,
        truncated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_window_from_dna_field() {
        let body = json!({ "dna": "acgtacgt" });
        let w = window_from_response(200, &body, "hg38", "chr17", 100, 108).unwrap();
        assert_eq!(w.sequence, "ACGTACGT");
        assert_eq!(w.start, 100);
        assert!(!w.truncated);
    }

    #[test]
    fn test_short_answer_is_flagged_not_rejected() {
        // Clipped window at a chromosome boundary: fewer bases than the span.
        let body = json!({ "dna": "ACGT" });
        let w = window_from_response(200, &body, "hg38", "chr17", 0, 4097).unwrap();
        assert!(w.truncated);
        assert_eq!(w.len(), 4);
    }

    #[test]
    fn test_error_field_with_200_status() {
        let body = json!({ "error": "chrom not found" });
        let err = window_from_response(200, &body, "hg38", "chrBogus", 0, 10).unwrap_err();
        match err {
            GenomeError::Api { status, message } => {
                assert_eq!(status, 200);
                assert_eq!(message, "chrom not found");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_http_error_status() {
        let body = json!({ "error": "no such genome" });
        let err = window_from_response(400, &body, "hg99", "chr1", 0, 10).unwrap_err();
        assert!(matches!(err, GenomeError::Api { status: 400, .. }));
    }

    #[test]
    fn test_missing_dna_field() {
        let body = json!({ "unexpected": true });
        let err = window_from_response(200, &body, "hg38", "chr1", 0, 10).unwrap_err();
        assert!(matches!(err, GenomeError::MissingSequence(_)));
    }
}
