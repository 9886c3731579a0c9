//! Calibration fit: threshold selection by Youden's J over the ROC curve of
//! `-delta` (LOF as the positive class), plus per-class spreads.
//!
//! Runs offline in the helyx-calibrate job; the service only ever consumes
//! the resulting `CalibrationParameters`.

use thiserror::Error;

use crate::classify::CalibrationParameters;

#[derive(Debug, Error)]
pub enum CalibrateError {
    #[error("calibration needs both classes, got {n_lof} LOF and {n_func} FUNC/INT deltas")]
    MissingClass { n_lof: usize, n_func: usize },
}

/// One calibration sample: a scored variant and its functional label.
#[derive(Debug, Clone, Copy)]
pub struct LabeledDelta {
    pub delta: f64,
    pub is_lof: bool,
}

/// One operating point on the ROC sweep. `score` is in `-delta` space
/// (higher score = more LOF-like).
#[derive(Debug, Clone, Copy)]
pub struct RocPoint {
    pub fpr: f64,
    pub tpr: f64,
    pub score: f64,
}

/// Result of a calibration fit, with enough context to judge it.
#[derive(Debug, Clone)]
pub struct CalibrationFit {
    pub params: CalibrationParameters,
    pub auroc: f64,
    pub n_lof: usize,
    pub n_func: usize,
}

/// ROC sweep over `-delta` with LOF positive. Points come back in
/// descending-score order, so FPR/TPR are non-decreasing along the curve;
/// tied scores collapse into one point. Assumes both classes are present.
pub fn roc_points(samples: &[LabeledDelta]) -> Vec<RocPoint> {
    let mut order: Vec<usize> = (0..samples.len()).collect();
    order.sort_by(|&a, &b| (-samples[b].delta).total_cmp(&-samples[a].delta));

    let positives = samples.iter().filter(|s| s.is_lof).count();
    let negatives = samples.len() - positives;

    let mut points = Vec::new();
    let (mut tp, mut fp) = (0usize, 0usize);
    let mut i = 0;
    while i < order.len() {
        let score = -samples[order[i]].delta;
        while i < order.len() && -samples[order[i]].delta == score {
            if samples[order[i]].is_lof {
                tp += 1;
            } else {
                fp += 1;
            }
            i += 1;
        }
        points.push(RocPoint {
            fpr: fp as f64 / negatives as f64,
            tpr: tp as f64 / positives as f64,
            score,
        });
    }
    points
}

/// Fits calibration constants from labeled deltas: the threshold maximizing
/// TPR − FPR (first maximum on ties, matching an argmax sweep), mapped back
/// to delta space, and the per-class sample standard deviations.
pub fn fit(samples: &[LabeledDelta]) -> Result<CalibrationFit, CalibrateError> {
    let lof: Vec<f64> = samples.iter().filter(|s| s.is_lof).map(|s| s.delta).collect();
    let func: Vec<f64> = samples
        .iter()
        .filter(|s| !s.is_lof)
        .map(|s| s.delta)
        .collect();

    if lof.is_empty() || func.is_empty() {
        return Err(CalibrateError::MissingClass {
            n_lof: lof.len(),
            n_func: func.len(),
        });
    }

    let points = roc_points(samples);

    let mut best = points[0];
    let mut best_j = best.tpr - best.fpr;
    for p in &points[1..] {
        let j = p.tpr - p.fpr;
        if j > best_j {
            best_j = j;
            best = *p;
        }
    }

    Ok(CalibrationFit {
        params: CalibrationParameters {
            // back from -delta space
            threshold: -best.score,
            lof_std: sample_std(&lof),
            func_std: sample_std(&func),
        },
        auroc: auroc(&points),
        n_lof: lof.len(),
        n_func: func.len(),
    })
}

/// Sample standard deviation (ddof = 1, matching how the published BRCA1
/// constants were computed). Zero for fewer than two samples; the classifier
/// clamps on that.
pub fn sample_std(xs: &[f64]) -> f64 {
    if xs.len() < 2 {
        return 0.0;
    }
    let mean = xs.iter().sum::<f64>() / xs.len() as f64;
    let var = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (xs.len() - 1) as f64;
    var.sqrt()
}

/// Trapezoidal area under the ROC curve, anchored at (0, 0).
fn auroc(points: &[RocPoint]) -> f64 {
    let (mut area, mut prev_fpr, mut prev_tpr) = (0.0, 0.0, 0.0);
    for p in points {
        area += (p.fpr - prev_fpr) * (p.tpr + prev_tpr) / 2.0;
        prev_fpr = p.fpr;
        prev_tpr = p.tpr;
    }
    area
}
