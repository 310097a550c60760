//! Mathematical utility functions

use rust_decimal::prelude::*;
use statrs::distribution::{ContinuousCDF, StudentsT};
use crate::errors::{AnalysisError, AnalysisResult};
use crate::types::LinearFit;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

/// Sample standard deviation (n - 1 denominator). Needs two values.
#[inline]
pub fn sample_std(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some((ss / (n - 1) as f64).sqrt())
}

pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let first = *values.first()?;
    Some(
        values
            .iter()
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
    )
}

pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.total_cmp(b));
    out
}

/// Quantile of already sorted values, linear interpolation between closest ranks.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&p) {
        return None;
    }
    let pos = p * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

pub fn quantile(values: &[f64], p: f64) -> Option<f64> {
    quantile_sorted(&sorted(values), p)
}

/// Pearson correlation coefficient of paired samples.
pub fn pearson(xs: &[f64], ys: &[f64]) -> AnalysisResult<f64> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return Err(AnalysisError::insufficient("pearson correlation", 2, n));
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);
    let mx = xs.iter().sum::<f64>() / n as f64;
    let my = ys.iter().sum::<f64>() / n as f64;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        sxy += (x - mx) * (y - my);
        sxx += (x - mx) * (x - mx);
        syy += (y - my) * (y - my);
    }

    if sxx == 0.0 || syy == 0.0 {
        return Err(AnalysisError::degenerate("pearson correlation (zero variance)"));
    }
    Ok((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

/// Ordinary least squares of `ys` on `xs` with a two-sided t-test on the slope.
pub fn linear_regression(xs: &[f64], ys: &[f64]) -> AnalysisResult<LinearFit> {
    let n = xs.len().min(ys.len());
    if n < 3 {
        return Err(AnalysisError::insufficient("linear regression", 3, n));
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);
    let mx = xs.iter().sum::<f64>() / n as f64;
    let my = ys.iter().sum::<f64>() / n as f64;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        sxy += (x - mx) * (y - my);
        sxx += (x - mx) * (x - mx);
        syy += (y - my) * (y - my);
    }
    if sxx == 0.0 {
        return Err(AnalysisError::degenerate("linear regression (constant regressor)"));
    }

    let slope = sxy / sxx;
    let intercept = my - slope * mx;
    // A constant response has no correlation with the regressor.
    let r = if syy == 0.0 {
        0.0
    } else {
        (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
    };
    let df = (n - 2) as f64;
    let unexplained = (1.0 - r * r).max(0.0);

    let p_value = if unexplained == 0.0 {
        0.0
    } else {
        let t = r * (df / unexplained).sqrt();
        let dist = StudentsT::new(0.0, 1.0, df)
            .map_err(|_| AnalysisError::degenerate("student t distribution"))?;
        (2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0)
    };
    let std_err = (unexplained * syy / sxx / df).sqrt();

    Ok(LinearFit {
        slope,
        intercept,
        r_squared: r * r,
        p_value,
        std_err,
        n,
    })
}

/// Rounds half to even at `decimals` places. Non-finite values pass through.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    Decimal::from_f64(value)
        .map(|d| d.round_dp(decimals))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}
