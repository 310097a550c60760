//! Time window types: fixed day segments and event-relative intervals

use std::fmt;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closed interval `[start, end]` in absolute time. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(a: DateTime<Utc>, b: DateTime<Utc>) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t <= self.end
    }

    pub fn minutes(&self) -> f64 {
        (self.end - self.start).num_milliseconds() as f64 / 60_000.0
    }
}

/// Half-open local-time band `[start_hour, end_hour)`; `end_hour == 24` is next midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DaySegment {
    pub start_hour: u32,
    pub end_hour: u32,
}

/// Canonical partition of the local day. 03:00-07:00 is one segment so that
/// every hour 0..=23 belongs to exactly one band.
pub const DAY_SEGMENTS: [DaySegment; 7] = [
    DaySegment { start_hour: 0, end_hour: 3 },
    DaySegment { start_hour: 3, end_hour: 7 },
    DaySegment { start_hour: 7, end_hour: 9 },
    DaySegment { start_hour: 9, end_hour: 12 },
    DaySegment { start_hour: 12, end_hour: 15 },
    DaySegment { start_hour: 15, end_hour: 21 },
    DaySegment { start_hour: 21, end_hour: 24 },
];

impl DaySegment {
    pub fn contains_hour(&self, hour: u32) -> bool {
        self.start_hour <= hour && hour < self.end_hour
    }

    pub fn label(&self) -> String {
        format!("{:02}-{:02}", self.start_hour, self.end_hour)
    }

    pub fn index(&self) -> Option<usize> {
        DAY_SEGMENTS.iter().position(|s| s == self)
    }
}

impl fmt::Display for DaySegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00-{:02}:00", self.start_hour, self.end_hour)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Neutral,
}

impl Direction {
    pub fn from_prices(start: f64, end: f64) -> Self {
        if end > start {
            Direction::Up
        } else if end < start {
            Direction::Down
        } else {
            Direction::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
