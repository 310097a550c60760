//! Per-event asymmetric analysis types

use serde::Serialize;
use super::{Direction, IndicatorEvent, WindowMetrics};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreEventResult {
    pub window_minutes: u32,
    pub valid: bool,
    pub point_count: usize,
    pub leg_count: usize,
    pub metrics: WindowMetrics,
    pub last_minute_movement: Option<f64>,
    pub last_minute_direction: Option<Direction>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostWindowResult {
    pub window_minutes: u32,
    pub valid: bool,
    pub point_count: usize,
    pub leg_count: usize,
    pub metrics: WindowMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostEventResult {
    pub windows: Vec<PostWindowResult>,
}

impl PostEventResult {
    pub fn window(&self, minutes: u32) -> Option<&PostWindowResult> {
        self.windows.iter().find(|w| w.window_minutes == minutes)
    }

    /// Movement of a window that had enough points, otherwise missing.
    pub fn valid_movement(&self, minutes: u32) -> Option<f64> {
        self.window(minutes)
            .filter(|w| w.valid)
            .map(|w| w.metrics.movement.movement)
    }

    pub fn any_valid(&self) -> bool {
        self.windows.iter().any(|w| w.valid)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RatioFailure {
    PreEventInvalid,
    PostEventInvalid,
    ZeroPreMovement,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowRatio {
    pub window_minutes: u32,
    pub ratio: Option<f64>,
    pub log_ratio: Option<f64>,
    pub direction_consistency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatioResult {
    pub valid: bool,
    pub failure: Option<RatioFailure>,
    pub windows: Vec<WindowRatio>,
}

impl RatioResult {
    pub fn failed(failure: RatioFailure) -> Self {
        Self {
            valid: false,
            failure: Some(failure),
            windows: Vec::new(),
        }
    }

    pub fn window(&self, minutes: u32) -> Option<&WindowRatio> {
        self.windows.iter().find(|w| w.window_minutes == minutes)
    }
}

/// Enriched record for one announcement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventAnalysis {
    pub event_index: usize,
    pub event: IndicatorEvent,
    pub pre: PreEventResult,
    pub post: PostEventResult,
    pub ratios: RatioResult,
}
