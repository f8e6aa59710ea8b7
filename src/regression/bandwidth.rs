use std::cmp::Ordering;

use super::error::FitError;
use super::fit::{validate_inputs, LocalRegression};
use super::kernel::Kernel;

// ---------------------------------------------------------------------------
// Leave-one-out bandwidth selection
// ---------------------------------------------------------------------------

/// Result of scoring a set of candidate bandwidths.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Candidate with the lowest score.
    pub bandwidth: f64,
    /// `(bandwidth, rmse)` for every candidate, in candidate order.
    pub scores: Vec<(f64, f64)>,
}

/// Leave-one-out RMSE of `reg` on the training data.
///
/// A held-out point that cannot be predicted (e.g. no other point inside a
/// compact kernel's window) makes the whole score infinite.
pub fn loocv_score(reg: &LocalRegression, xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len();
    if n < 2 {
        return f64::INFINITY;
    }

    let mut train_x = Vec::with_capacity(n - 1);
    let mut train_y = Vec::with_capacity(n - 1);
    let mut total = 0.0;

    for i in 0..n {
        train_x.clear();
        train_y.clear();
        for j in (0..n).filter(|&j| j != i) {
            train_x.push(xs[j]);
            train_y.push(ys[j]);
        }

        match reg.predict(&train_x, &train_y, xs[i]) {
            Ok(predicted) => {
                let error = ys[i] - predicted;
                total += error * error;
            }
            Err(_) => return f64::INFINITY,
        }
    }

    (total / n as f64).sqrt()
}

/// Geometric grid of `count` bandwidths spanning the smallest gap between
/// distinct x values up to the full x range.
pub fn candidate_bandwidths(xs: &[f64], count: usize) -> Vec<f64> {
    let mut sorted: Vec<f64> = xs.iter().copied().filter(|x| x.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup();

    if sorted.len() < 2 || count == 0 {
        return Vec::new();
    }

    let range = sorted[sorted.len() - 1] - sorted[0];
    let min_gap = sorted
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold(f64::INFINITY, f64::min);

    if count == 1 || min_gap >= range {
        return vec![range];
    }

    let ratio = (range / min_gap).powf(1.0 / (count - 1) as f64);
    (0..count)
        .map(|i| min_gap * ratio.powi(i as i32))
        .collect()
}

/// Score every candidate and pick the one with the lowest LOOCV RMSE.
pub fn select_bandwidth(
    kernel: Kernel,
    order: usize,
    xs: &[f64],
    ys: &[f64],
    candidates: &[f64],
) -> Result<Selection, FitError> {
    validate_inputs(xs, ys)?;

    let mut scores = Vec::with_capacity(candidates.len());
    for &h in candidates {
        let reg = LocalRegression::new(kernel, h, order)?;
        scores.push((h, loocv_score(&reg, xs, ys)));
    }

    let best = scores
        .iter()
        .filter(|(_, score)| score.is_finite())
        .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(Ordering::Equal))
        .map(|&(h, _)| h);

    match best {
        Some(bandwidth) => Ok(Selection { bandwidth, scores }),
        None => Err(FitError::NoValidBandwidth),
    }
}
