//! Descriptive statistics over `f64` samples
//!
//! Every helper returns a finite value. Statistics over an empty sample
//! (or a standard deviation over a single value) are reported as `0.0`
//! rather than NaN so they can be emitted as plain JSON numbers.

use serde::Serialize;

/// Replace NaN/infinite values with `0.0`
#[inline]
pub fn finite(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    finite(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator)
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    finite((sum_sq / (values.len() - 1) as f64).sqrt())
}

pub fn min(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::min).map_or(0.0, finite)
}

pub fn max(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::max).map_or(0.0, finite)
}

/// Sort a copy of `values` ascending
fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Percentile (`q` in `[0, 1]`) of an already sorted sample, with linear
/// interpolation between the closest ranks
fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => finite(sorted[0]),
        n => {
            let rank = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            let weight = rank - lower as f64;
            finite(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
        }
    }
}

pub fn median(values: &[f64]) -> f64 {
    percentile_sorted(&sorted(values), 0.5)
}

/// Count/mean/std/min/quartiles/max summary of a sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Distribution {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    #[serde(rename = "25%")]
    pub p25: f64,
    #[serde(rename = "50%")]
    pub p50: f64,
    #[serde(rename = "75%")]
    pub p75: f64,
    pub max: f64,
}

impl Distribution {
    pub fn describe(values: &[f64]) -> Self {
        let sorted = sorted(values);
        Self {
            count: values.len(),
            mean: mean(values),
            std: std_dev(values),
            min: min(values),
            p25: percentile_sorted(&sorted, 0.25),
            p50: percentile_sorted(&sorted, 0.5),
            p75: percentile_sorted(&sorted, 0.75),
            max: max(values),
        }
    }
}
