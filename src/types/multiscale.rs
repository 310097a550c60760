//! Cross-horizon (multiscale) analysis types

use std::collections::BTreeMap;
use std::fmt;
use serde::Serialize;
use super::EventAnalysis;

/// Post-event movement of one event at every horizon where the window was valid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaleObservation {
    pub event_index: usize,
    pub currency: String,
    pub event_name: String,
    pub movements: BTreeMap<u32, f64>,
}

impl ScaleObservation {
    pub fn movement(&self, horizon_minutes: u32) -> Option<f64> {
        self.movements.get(&horizon_minutes).copied()
    }
}

impl From<&EventAnalysis> for ScaleObservation {
    fn from(analysis: &EventAnalysis) -> Self {
        let movements = analysis
            .post
            .windows
            .iter()
            .filter(|w| w.valid)
            .map(|w| (w.window_minutes, w.metrics.movement.movement))
            .collect();

        Self {
            event_index: analysis.event_index,
            currency: analysis.event.currency.clone(),
            event_name: analysis.event.event_name.clone(),
            movements,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaleRatio {
    pub horizon_minutes: u32,
    pub reference_minutes: u32,
    pub ratio: Option<f64>,
    pub log_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaleRatioRow {
    pub event_index: usize,
    pub currency: String,
    pub event_name: String,
    pub ratios: Vec<ScaleRatio>,
}

impl ScaleRatioRow {
    pub fn ratio(&self, horizon_minutes: u32) -> Option<&ScaleRatio> {
        self.ratios.iter().find(|r| r.horizon_minutes == horizon_minutes)
    }
}

/// Square pairwise-complete Pearson matrix indexed by horizon.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub horizons: Vec<u32>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: u32, b: u32) -> Option<f64> {
        let i = self.horizons.iter().position(|&h| h == a)?;
        let j = self.horizons.iter().position(|&h| h == b)?;
        self.values[i][j]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub p_value: f64,
    pub std_err: f64,
    pub n: usize,
}

/// Relationship between two adjacent horizons (`from` < `to`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropagationEffect {
    pub from_minutes: u32,
    pub to_minutes: u32,
    pub sample_count: usize,
    pub correlation: Option<f64>,
    pub mean_ratio: Option<f64>,
    pub regression: Option<LinearFit>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingRegime {
    SubLinear,
    Linear,
    SuperLinear,
}

impl ScalingRegime {
    pub fn from_exponent(exponent: f64, tolerance: f64) -> Self {
        if exponent < 1.0 - tolerance {
            ScalingRegime::SubLinear
        } else if exponent > 1.0 + tolerance {
            ScalingRegime::SuperLinear
        } else {
            ScalingRegime::Linear
        }
    }
}

impl fmt::Display for ScalingRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ScalingRegime::SubLinear => "sub-linear",
            ScalingRegime::Linear => "linear",
            ScalingRegime::SuperLinear => "super-linear",
        };
        f.write_str(label)
    }
}

/// Power-law fit of mean movement against horizon length for one indicator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScalingProperty {
    pub currency: String,
    pub event_name: String,
    pub record_count: usize,
    pub horizon_count: usize,
    pub scaling_exponent: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub p_value: f64,
    pub regime: ScalingRegime,
    pub mean_movements: BTreeMap<u32, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HorizonSummary {
    pub horizon_minutes: u32,
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub q25: f64,
    pub q75: f64,
    pub q90: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthStep {
    pub horizon_minutes: u32,
    pub mean_movement: Option<f64>,
    /// Mean at this horizon over the mean at the previous one.
    pub growth_rate: Option<f64>,
    /// Mean at this horizon over the mean at the first one.
    pub cumulative_growth: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthPattern {
    pub currency: String,
    pub event_name: String,
    pub record_count: usize,
    pub steps: Vec<GrowthStep>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regime_uses_tolerance_band() {
        assert_eq!(ScalingRegime::from_exponent(0.5, 0.1), ScalingRegime::SubLinear);
        assert_eq!(ScalingRegime::from_exponent(0.95, 0.1), ScalingRegime::Linear);
        assert_eq!(ScalingRegime::from_exponent(1.1, 0.1), ScalingRegime::Linear);
        assert_eq!(ScalingRegime::from_exponent(1.3, 0.1), ScalingRegime::SuperLinear);
        assert_eq!(ScalingRegime::SuperLinear.to_string(), "super-linear");
    }

    #[test]
    fn matrix_lookup_by_horizon() {
        let matrix = CorrelationMatrix {
            horizons: vec![5, 15],
            values: vec![vec![Some(1.0), Some(0.8)], vec![Some(0.8), Some(1.0)]],
        };
        assert_eq!(matrix.get(15, 5), Some(0.8));
        assert_eq!(matrix.get(30, 5), None);
    }
}
