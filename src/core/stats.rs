//! Descriptive statistics shared by the metrology and pull-test analyses
//!
//! Sample statistics follow the usual n-1 convention. Medians of even-sized
//! sets average the two middle values.

use thiserror::Error;

/// Errors raised when a statistic is undefined for the given data
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    #[error("Not enough data points: need {needed}, have {available}")]
    InsufficientData { needed: usize, available: usize },
}

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median, `None` for an empty slice
///
/// Sorted with `total_cmp`: positive NaN sorts after every number and
/// negative NaN before, so a lone NaN of either sign shifts the median by
/// one position instead of poisoning it.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Median absolute deviation around the median
pub fn median_absolute_deviation(values: &[f64]) -> Option<(f64, f64)> {
    let m = median(values)?;
    let deviations: Vec<f64> = values.iter().map(|z| (z - m).abs()).collect();
    let mad = median(&deviations)?;
    Some((m, mad))
}

/// Sample standard deviation (n-1 denominator)
pub fn sample_stdev(values: &[f64]) -> Result<f64, StatsError> {
    if values.len() < 2 {
        return Err(StatsError::InsufficientData {
            needed: 2,
            available: values.len(),
        });
    }
    let m = values.iter().sum::<f64>() / values.len() as f64;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Ok((ss / (values.len() - 1) as f64).sqrt())
}

/// Per-subset summary used for pooling
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubsetSpread {
    pub count: usize,
    pub mean: f64,
    pub stdev: f64,
}

/// Standard deviation of the union of several subsets, from their counts,
/// means and deviations.
///
/// Uses the count-weighted mean and the combined variance
/// `Σ Nᵢ(σᵢ² + (μᵢ − μ̄)²) / Σ Nᵢ`.
pub fn pooled_deviation(subsets: &[SubsetSpread]) -> Option<f64> {
    let total: usize = subsets.iter().map(|s| s.count).sum();
    if total == 0 {
        return None;
    }
    let total = total as f64;
    let weighted_mean = subsets
        .iter()
        .map(|s| s.count as f64 * s.mean)
        .sum::<f64>()
        / total;
    let variance = subsets
        .iter()
        .map(|s| s.count as f64 * (s.stdev.powi(2) + (s.mean - weighted_mean).powi(2)))
        .sum::<f64>()
        / total;
    Some(variance.sqrt())
}

/// Round to `places` decimal places, ties to even
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round_ties_even() / factor
}
