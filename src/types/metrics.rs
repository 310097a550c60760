//! Window metric types produced by pivot extraction

use serde::Serialize;
use super::Direction;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovementMetrics {
    pub point_count: usize,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub start_price: Option<f64>,
    pub end_price: Option<f64>,
    /// high - low; 0 when fewer than two points.
    pub movement: f64,
    pub net_movement: Option<f64>,
    pub direction: Direction,
    pub movement_efficiency: Option<f64>,
}

impl MovementMetrics {
    pub fn insufficient(point_count: usize) -> Self {
        Self {
            point_count,
            high: None,
            low: None,
            start_price: None,
            end_price: None,
            movement: 0.0,
            net_movement: None,
            direction: Direction::Neutral,
            movement_efficiency: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeedMetrics {
    pub elapsed_minutes: Option<f64>,
    /// None when elapsed time is zero or unknown.
    pub speed: Option<f64>,
    pub leg_frequency: Option<f64>,
}

impl SpeedMetrics {
    pub fn undefined(elapsed_minutes: Option<f64>) -> Self {
        Self {
            elapsed_minutes,
            speed: None,
            leg_frequency: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowMetrics {
    #[serde(flatten)]
    pub movement: MovementMetrics,
    #[serde(flatten)]
    pub speed: SpeedMetrics,
}

impl WindowMetrics {
    pub fn point_count(&self) -> usize {
        self.movement.point_count
    }

    pub fn is_sufficient(&self) -> bool {
        self.movement.point_count >= 2
    }
}
