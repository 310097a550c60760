//! Percentiles, distribution shape and outlier detection

use tracing::debug;
use crate::{
    config::MIN_OUTLIER_POINTS,
    types::{DistributionProfile, OutlierMethod},
    utils::{mean, median, quantile_sorted, sample_std, sorted},
};

/// One quantile per requested `p`; every entry is missing on empty input.
pub fn percentiles(values: &[f64], ps: &[f64]) -> Vec<(f64, Option<f64>)> {
    let ordered = sorted(values);
    ps.iter().map(|&p| (p, quantile_sorted(&ordered, p))).collect()
}

/// Bias-corrected sample skewness; 0 for a constant series.
pub fn skewness(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 3 {
        return None;
    }
    let (m, s) = (mean(values)?, sample_std(values)?);
    if s == 0.0 {
        return Some(0.0);
    }
    let n = n as f64;
    let sum: f64 = values.iter().map(|v| ((v - m) / s).powi(3)).sum();
    Some(n / ((n - 1.0) * (n - 2.0)) * sum)
}

/// Bias-corrected excess kurtosis; 0 for a constant series.
pub fn kurtosis(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 4 {
        return None;
    }
    let (m, s) = (mean(values)?, sample_std(values)?);
    if s == 0.0 {
        return Some(0.0);
    }
    let n = n as f64;
    let sum: f64 = values.iter().map(|v| ((v - m) / s).powi(4)).sum();
    let scale = n * (n + 1.0) / ((n - 1.0) * (n - 2.0) * (n - 3.0));
    let correction = 3.0 * (n - 1.0).powi(2) / ((n - 2.0) * (n - 3.0));
    Some(scale * sum - correction)
}

pub fn distribution(values: &[f64]) -> DistributionProfile {
    let valid: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if valid.len() < 2 {
        return DistributionProfile {
            mean: None,
            median: None,
            std: None,
            skewness: None,
            kurtosis: None,
            count: valid.len(),
        };
    }
    DistributionProfile {
        mean: mean(&valid),
        median: median(&valid),
        std: sample_std(&valid),
        skewness: skewness(&valid),
        kurtosis: kurtosis(&valid),
        count: valid.len(),
    }
}

/// Flags per input position. Missing entries are never outliers, and fewer
/// than four valid points flags nothing.
pub fn detect_outliers(values: &[Option<f64>], method: OutlierMethod, threshold: f64) -> Vec<bool> {
    let valid: Vec<f64> = values.iter().flatten().copied().collect();
    let none = vec![false; values.len()];
    if valid.len() < MIN_OUTLIER_POINTS {
        debug!(points = valid.len(), "Insufficient data for outlier detection");
        return none;
    }

    match method {
        OutlierMethod::Iqr => {
            let ordered = sorted(&valid);
            let (Some(q1), Some(q3)) = (quantile_sorted(&ordered, 0.25), quantile_sorted(&ordered, 0.75)) else {
                return none;
            };
            let iqr = q3 - q1;
            let (lower, upper) = (q1 - threshold * iqr, q3 + threshold * iqr);
            values
                .iter()
                .map(|v| v.is_some_and(|x| x < lower || x > upper))
                .collect()
        }
        OutlierMethod::ZScore => {
            let (Some(m), Some(s)) = (mean(&valid), sample_std(&valid)) else {
                return none;
            };
            if s == 0.0 {
                debug!("Zero standard deviation, no z-score outliers");
                return none;
            }
            values
                .iter()
                .map(|v| v.is_some_and(|x| ((x - m) / s).abs() > threshold))
                .collect()
        }
    }
}
