//! Order-independent reductions shared by the aggregators.

use average::{Estimate, Variance};

/// Mean and sample standard deviation of a group of values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeanStd {
    /// Arithmetic mean.
    pub mean: f64,

    /// Sample standard deviation (n - 1 denominator); 0 for a single value.
    pub std: f64,

    /// Number of contributing values.
    pub n: usize,
}

impl MeanStd {
    /// Summarizes the finite values of `values`. NaN and infinities do not
    /// participate; `None` when nothing is left.
    pub fn of<I: IntoIterator<Item = f64>>(values: I) -> Option<MeanStd> {
        let values = canonical(values);
        if values.is_empty() {
            return None;
        }

        let mut v = Variance::new();
        for &x in &values {
            v.add(x);
        }

        let std = if values.len() < 2 {
            0.0
        } else {
            v.sample_variance().sqrt()
        };
        Some(MeanStd {
            mean: v.mean(),
            std: std,
            n: values.len(),
        })
    }
}

/// Finite values sorted ascending. Every reduction goes through this so that
/// the result does not depend on the order records arrived in.
pub fn canonical<I: IntoIterator<Item = f64>>(values: I) -> Vec<f64> {
    let mut v = values
        .into_iter()
        .filter(|x| x.is_finite())
        .collect::<Vec<f64>>();
    v.sort_by(|a, b| a.total_cmp(b));
    v
}

/// Sum in canonical order; `None` for an empty group.
pub fn sum<I: IntoIterator<Item = f64>>(values: I) -> Option<f64> {
    let v = canonical(values);
    if v.is_empty() {
        None
    } else {
        Some(v.iter().sum())
    }
}

/// Mean in canonical order; `None` for an empty group.
pub fn mean<I: IntoIterator<Item = f64>>(values: I) -> Option<f64> {
    let v = canonical(values);
    if v.is_empty() {
        None
    } else {
        Some(v.iter().sum::<f64>() / v.len() as f64)
    }
}

/// Nearest-rank quantile of an ascending slice (`q` in [0, 1]).
pub fn nearest_rank(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let idx = (sorted.len() as f64 * q) as usize;
    Some(sorted[idx.min(sorted.len() - 1)])
}
