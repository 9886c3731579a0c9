//! helyx-scoring — Delta-likelihood variant scoring and classification.
//!
//! The pipeline is three small pieces: build the variant sequence by a
//! single-base substitution, score reference and variant through an injected
//! `SequenceScorer`, and classify the delta against calibration constants
//! fitted offline (see `calibrate` and the helyx-calibrate binary).

pub mod artifact;
pub mod calibrate;
pub mod classify;
pub mod variant;

pub use artifact::CalibrationArtifact;
pub use classify::{classify, CalibrationParameters, Classification, Prediction};
pub use variant::{apply_variant, DeltaScorer, ScorePair, ScoringError, Variant};
