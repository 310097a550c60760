//! Descriptive statistics and classification types

use std::fmt;
use std::str::FromStr;
use serde::Serialize;
use crate::errors::AnalysisError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationMethod {
    Percentile,
    Absolute,
}

impl FromStr for ClassificationMethod {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "percentile" => Ok(ClassificationMethod::Percentile),
            "absolute" => Ok(ClassificationMethod::Absolute),
            other => Err(AnalysisError::InvalidConfig(format!(
                "unknown classification method '{}'",
                other
            ))),
        }
    }
}

/// How a group with exactly one sample is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SingleSamplePolicy {
    /// std = 0 and mean = median = min = max = the sample.
    ZeroStd,
    /// Every statistic missing, like any other group below two samples.
    Missing,
}

impl FromStr for SingleSamplePolicy {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zero_std" | "zerostd" => Ok(SingleSamplePolicy::ZeroStd),
            "missing" | "nan" => Ok(SingleSamplePolicy::Missing),
            other => Err(AnalysisError::InvalidConfig(format!(
                "unknown single sample policy '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum VolatilityCategory {
    Small,
    Medium,
    Large,
}

impl fmt::Display for VolatilityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VolatilityCategory::Small => "Small",
            VolatilityCategory::Medium => "Medium",
            VolatilityCategory::Large => "Large",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlierMethod {
    Iqr,
    ZScore,
}

impl FromStr for OutlierMethod {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "iqr" => Ok(OutlierMethod::Iqr),
            "zscore" | "z_score" => Ok(OutlierMethod::ZScore),
            other => Err(AnalysisError::InvalidConfig(format!(
                "unknown outlier method '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptiveStats {
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub sample_count: usize,
}

impl DescriptiveStats {
    pub fn missing(sample_count: usize) -> Self {
        Self {
            mean: None,
            median: None,
            std: None,
            min: None,
            max: None,
            sample_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GroupKey {
    pub currency: String,
    pub event_name: String,
    pub window_slot: Option<String>,
}

impl GroupKey {
    pub fn new(currency: &str, event_name: &str, window_slot: Option<String>) -> Self {
        Self {
            currency: currency.to_string(),
            event_name: event_name.to_string(),
            window_slot,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStatistics {
    #[serde(flatten)]
    pub key: GroupKey,
    #[serde(flatten)]
    pub stats: DescriptiveStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedStatistics {
    #[serde(flatten)]
    pub statistics: GroupStatistics,
    pub category: VolatilityCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub window_slot: Option<String>,
    pub method: ClassificationMethod,
    pub q1: f64,
    pub q2: f64,
    pub rows: Vec<ClassifiedStatistics>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub category: VolatilityCategory,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionProfile {
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std: Option<f64>,
    pub skewness: Option<f64>,
    pub kurtosis: Option<f64>,
    pub count: usize,
}

/// An event whose movement in one post window lies outside the bulk of its window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierRecord {
    pub window_minutes: u32,
    pub method: OutlierMethod,
    pub event_index: usize,
    pub currency: String,
    pub event_name: String,
    pub movement: f64,
}

/// Statistics, classification and distribution of one post window's movement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowStatistics {
    pub window_minutes: u32,
    pub statistics: Vec<GroupStatistics>,
    pub classification: Option<Classification>,
    pub rollup: Vec<CategorySummary>,
    pub distribution: DistributionProfile,
    pub outliers: Vec<OutlierRecord>,
}

impl WindowStatistics {
    pub fn slot_label(window_minutes: u32) -> String {
        format!("post_{}min", window_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_methods_case_insensitively() {
        assert_eq!(
            "Percentile".parse::<ClassificationMethod>().unwrap(),
            ClassificationMethod::Percentile
        );
        assert_eq!(
            " absolute ".parse::<ClassificationMethod>().unwrap(),
            ClassificationMethod::Absolute
        );
        assert!("median".parse::<ClassificationMethod>().is_err());
        assert_eq!("zscore".parse::<OutlierMethod>().unwrap(), OutlierMethod::ZScore);
        assert_eq!(
            "missing".parse::<SingleSamplePolicy>().unwrap(),
            SingleSamplePolicy::Missing
        );
    }

    #[test]
    fn categories_order_small_to_large() {
        assert!(VolatilityCategory::Small < VolatilityCategory::Medium);
        assert!(VolatilityCategory::Medium < VolatilityCategory::Large);
    }
}
