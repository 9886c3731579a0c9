//! Threshold classification of delta scores.

use serde::{Deserialize, Serialize};

/// Constants produced by the offline calibration fit and loaded once at
/// service startup. Immutable for the service lifetime.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CalibrationParameters {
    /// Decision threshold in delta space: below → likely pathogenic.
    pub threshold: f64,
    /// Sample std of delta scores within the LOF class.
    pub lof_std: f64,
    /// Sample std of delta scores within the FUNC/INT class.
    pub func_std: f64,
}

impl CalibrationParameters {
    /// Constants fitted on the first 500 variants of the BRCA1
    /// saturation-mutagenesis dataset (Findlay et al. 2018) with the
    /// evo2_7b checkpoint. Fallback when no calibration artifact is
    /// configured; refit with helyx-calibrate for other checkpoints.
    pub fn brca1_defaults() -> Self {
        Self {
            threshold: -0.000_917_851_9,
            lof_std: 0.001_514_023_9,
            func_std: 0.000_901_658_9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Prediction {
    #[serde(rename = "Likely pathogenic")]
    LikelyPathogenic,
    #[serde(rename = "Likely benign")]
    LikelyBenign,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Classification {
    pub prediction: Prediction,
    /// In [0, 1]: distance from the threshold in units of the predicted
    /// class's spread, capped at 1.
    pub confidence: f64,
}

/// Pure decision rule over a delta score. A delta below the threshold reads
/// as loss of function. A zero or non-finite class spread clamps confidence
/// to 1 instead of dividing.
pub fn classify(delta: f64, params: &CalibrationParameters) -> Classification {
    let (prediction, spread) = if delta < params.threshold {
        (Prediction::LikelyPathogenic, params.lof_std)
    } else {
        (Prediction::LikelyBenign, params.func_std)
    };

    let confidence = if spread.is_finite() && spread > 0.0 {
        ((delta - params.threshold).abs() / spread).min(1.0)
    } else {
        1.0
    };

    Classification {
        prediction,
        confidence,
    }
}
