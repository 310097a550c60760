//! Zigzag pivot (leg) types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One zigzag leg: a move between two detected local extrema.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pivot {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub start_price: f64,
    pub end_price: f64,
}

impl Pivot {
    pub fn new(
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        start_price: f64,
        end_price: f64,
    ) -> Self {
        Self {
            start_time,
            end_time,
            start_price,
            end_price,
        }
    }

    /// A zero-length leg, i.e. a single extremum observation.
    pub fn point(time: DateTime<Utc>, price: f64) -> Self {
        Self::new(time, time, price, price)
    }

    pub fn high(&self) -> f64 {
        self.start_price.max(self.end_price)
    }

    pub fn low(&self) -> f64 {
        self.start_price.min(self.end_price)
    }

    pub fn is_well_formed(&self) -> bool {
        self.start_time <= self.end_time
            && self.start_price.is_finite()
            && self.end_price.is_finite()
    }
}
