//! helyx-model — Sequence scoring model abstraction layer.
//! Implements the SequenceScorer trait plus the concrete backends the
//! service and the calibration job choose between.

pub mod backend;

pub use backend::{HttpScorer, MockScorer, ScorerError, SequenceScorer};
