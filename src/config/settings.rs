//! Analysis configuration settings and environment variable handling

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use crate::errors::{AnalysisError, AnalysisResult};
use crate::types::{ClassificationMethod, OutlierMethod, SingleSamplePolicy};

// Windowing constants
pub const DEFAULT_LOCAL_UTC_OFFSET_HOURS: i32 = 9; // JST
pub const DEFAULT_PRE_WINDOW_MINUTES: u32 = 5;
pub const DEFAULT_POST_WINDOW_MINUTES: [u32; 3] = [5, 15, 30];
pub const DEFAULT_REFERENCE_SCALE_MINUTES: u32 = 15;
pub const LAST_MINUTE_WINDOW_MINUTES: u32 = 1;
pub const MAX_WINDOW_MINUTES: u32 = 24 * 60;

// Statistics constants
pub const DEFAULT_MIN_SAMPLES: usize = 5;
pub const MIN_PROPAGATION_ROWS: usize = 5;
pub const MIN_SCALING_RECORDS: usize = 5;
pub const MIN_SCALING_HORIZONS: usize = 3;
pub const MIN_GROWTH_RECORDS: usize = 3;
pub const MIN_OUTLIER_POINTS: usize = 4;
pub const CATEGORY_PERCENTILES: (f64, f64) = (0.33, 0.67);
pub const DEFAULT_ABSOLUTE_THRESHOLDS: (f64, f64) = (0.0005, 0.001);
pub const SCALING_LINEAR_TOLERANCE: f64 = 0.1;
pub const DEFAULT_IQR_MULTIPLIER: f64 = 1.5;
pub const DEFAULT_ZSCORE_THRESHOLD: f64 = 3.0;

// Output constants
pub const DEFAULT_OUTPUT_DECIMALS: u32 = 4;
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Sentinel the indicator export uses for "no data" (i64::MIN).
pub const NO_DATA_SENTINEL: f64 = -9_223_372_036_854_775_808.0;

#[derive(Debug, Clone)]
pub struct Config {
    // Inputs
    pub pivot_files: Vec<PathBuf>,
    pub pivot_delimiter: u8,
    pub events_file: Option<PathBuf>,
    pub output_dir: PathBuf,
    // Windowing
    pub local_utc_offset_hours: i32,
    pub pre_window_minutes: u32,
    pub post_window_minutes: Vec<u32>,
    pub reference_scale_minutes: u32,
    // Statistics
    pub min_samples: usize,
    pub classification_method: ClassificationMethod,
    pub category_thresholds: Option<(f64, f64)>,
    pub single_sample_policy: SingleSamplePolicy,
    pub outlier_method: OutlierMethod,
    pub outlier_threshold: f64,
    // Output
    pub output_decimals: u32,
    pub parallel_events: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pivot_files: Vec::new(),
            pivot_delimiter: b'\t',
            events_file: None,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            local_utc_offset_hours: DEFAULT_LOCAL_UTC_OFFSET_HOURS,
            pre_window_minutes: DEFAULT_PRE_WINDOW_MINUTES,
            post_window_minutes: DEFAULT_POST_WINDOW_MINUTES.to_vec(),
            reference_scale_minutes: DEFAULT_REFERENCE_SCALE_MINUTES,
            min_samples: DEFAULT_MIN_SAMPLES,
            classification_method: ClassificationMethod::Percentile,
            category_thresholds: None,
            single_sample_policy: SingleSamplePolicy::ZeroStd,
            outlier_method: OutlierMethod::Iqr,
            outlier_threshold: DEFAULT_IQR_MULTIPLIER,
            output_decimals: DEFAULT_OUTPUT_DECIMALS,
            parallel_events: true,
        }
    }
}

impl Config {
    pub fn load() -> Self {
        let defaults = Self::default();
        let outlier_method = env::var("OUTLIER_METHOD")
            .ok()
            .and_then(|s| OutlierMethod::from_str(&s).ok())
            .unwrap_or(defaults.outlier_method);
        Self {
            pivot_files: env::var("PIVOT_FILES")
                .map(|s| {
                    s.split(',')
                        .map(str::trim)
                        .filter(|p| !p.is_empty())
                        .map(PathBuf::from)
                        .collect()
                })
                .unwrap_or_default(),
            pivot_delimiter: env::var("PIVOT_DELIMITER")
                .ok()
                .and_then(|s| parse_delimiter(&s))
                .unwrap_or(defaults.pivot_delimiter),
            events_file: env::var("EVENTS_FILE").ok().map(PathBuf::from),
            output_dir: env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            local_utc_offset_hours: env::var("LOCAL_UTC_OFFSET_HOURS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_LOCAL_UTC_OFFSET_HOURS),
            pre_window_minutes: env::var("PRE_WINDOW_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_PRE_WINDOW_MINUTES),
            post_window_minutes: env::var("POST_WINDOW_MINUTES")
                .ok()
                .and_then(|s| parse_minutes_list(&s))
                .unwrap_or(defaults.post_window_minutes),
            reference_scale_minutes: env::var("REFERENCE_SCALE_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_REFERENCE_SCALE_MINUTES),
            min_samples: env::var("MIN_SAMPLES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MIN_SAMPLES),
            classification_method: env::var("CLASSIFICATION_METHOD")
                .ok()
                .and_then(|s| ClassificationMethod::from_str(&s).ok())
                .unwrap_or(defaults.classification_method),
            category_thresholds: env::var("CATEGORY_THRESHOLDS")
                .ok()
                .and_then(|s| parse_threshold_pair(&s)),
            single_sample_policy: env::var("SINGLE_SAMPLE_POLICY")
                .ok()
                .and_then(|s| SingleSamplePolicy::from_str(&s).ok())
                .unwrap_or(defaults.single_sample_policy),
            outlier_method,
            outlier_threshold: env::var("OUTLIER_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(match outlier_method {
                    OutlierMethod::Iqr => DEFAULT_IQR_MULTIPLIER,
                    OutlierMethod::ZScore => DEFAULT_ZSCORE_THRESHOLD,
                }),
            output_decimals: env::var("OUTPUT_DECIMALS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_OUTPUT_DECIMALS)
                .min(12),
            parallel_events: env::var("PARALLEL_EVENTS")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
        }
    }

    pub fn validate(&self) -> AnalysisResult<()> {
        if !(-12..=14).contains(&self.local_utc_offset_hours) {
            return Err(AnalysisError::InvalidConfig(format!(
                "local UTC offset {}h is outside -12..=14",
                self.local_utc_offset_hours
            )));
        }
        if self.pre_window_minutes == 0 || self.pre_window_minutes > MAX_WINDOW_MINUTES {
            return Err(AnalysisError::InvalidConfig(format!(
                "pre window must be 1..={} minutes, got {}",
                MAX_WINDOW_MINUTES, self.pre_window_minutes
            )));
        }
        if self.post_window_minutes.is_empty() {
            return Err(AnalysisError::InvalidConfig("no post windows configured".into()));
        }
        if let Some(bad) = self
            .post_window_minutes
            .iter()
            .find(|&&m| m == 0 || m > MAX_WINDOW_MINUTES)
        {
            return Err(AnalysisError::InvalidConfig(format!(
                "post window must be 1..={} minutes, got {}",
                MAX_WINDOW_MINUTES, bad
            )));
        }
        if self.reference_scale_minutes == 0 {
            return Err(AnalysisError::InvalidConfig("reference scale must be positive".into()));
        }
        if let Some((q1, q2)) = self.category_thresholds {
            if !(q1.is_finite() && q2.is_finite()) || q1 > q2 {
                return Err(AnalysisError::InvalidConfig(format!(
                    "category thresholds must satisfy q1 <= q2, got ({}, {})",
                    q1, q2
                )));
            }
        }
        if !(self.outlier_threshold.is_finite() && self.outlier_threshold > 0.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "outlier threshold must be positive, got {}",
                self.outlier_threshold
            )));
        }
        Ok(())
    }

    /// Post windows in ascending order without duplicates.
    pub fn sorted_post_windows(&self) -> Vec<u32> {
        let mut windows = self.post_window_minutes.clone();
        windows.sort_unstable();
        windows.dedup();
        windows
    }
}

fn parse_delimiter(s: &str) -> Option<u8> {
    match s {
        "\\t" | "tab" | "\t" => Some(b'\t'),
        "comma" => Some(b','),
        other if other.len() == 1 => other.bytes().next(),
        _ => None,
    }
}

fn parse_minutes_list(s: &str) -> Option<Vec<u32>> {
    let parsed: Result<Vec<u32>, _> = s
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::parse)
        .collect();
    parsed.ok().filter(|v| !v.is_empty())
}

fn parse_threshold_pair(s: &str) -> Option<(f64, f64)> {
    let mut parts = s.split(',').map(str::trim);
    let q1 = parts.next()?.parse().ok()?;
    let q2 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((q1, q2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.post_window_minutes, vec![5, 15, 30]);
        assert_eq!(config.local_utc_offset_hours, 9);
    }

    #[test]
    fn rejects_reversed_thresholds() {
        let config = Config {
            category_thresholds: Some((2.0, 1.0)),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(AnalysisError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_empty_and_zero_post_windows() {
        let empty = Config {
            post_window_minutes: vec![],
            ..Config::default()
        };
        assert!(empty.validate().is_err());

        let zero = Config {
            post_window_minutes: vec![5, 0],
            ..Config::default()
        };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn parses_list_values() {
        assert_eq!(parse_minutes_list("30, 5,15"), Some(vec![30, 5, 15]));
        assert_eq!(parse_minutes_list("5,x"), None);
        assert_eq!(parse_threshold_pair("1.0, 2.5"), Some((1.0, 2.5)));
        assert_eq!(parse_threshold_pair("1.0"), None);
        assert_eq!(parse_delimiter("tab"), Some(b'\t'));
        assert_eq!(parse_delimiter(";"), Some(b';'));
    }

    #[test]
    fn sorted_post_windows_dedups() {
        let config = Config {
            post_window_minutes: vec![30, 5, 15, 5],
            ..Config::default()
        };
        assert_eq!(config.sorted_post_windows(), vec![5, 15, 30]);
    }
}
