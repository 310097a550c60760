//! Fixed day-segment volatility types

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Serialize;
use super::{DaySegment, IndicatorEvent, DAY_SEGMENTS};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentVolatility {
    pub segment: DaySegment,
    pub point_count: usize,
    /// start_price range inside the segment; None when the segment is empty.
    pub movement: Option<f64>,
}

impl SegmentVolatility {
    pub fn empty(segment: DaySegment) -> Self {
        Self {
            segment,
            point_count: 0,
            movement: None,
        }
    }
}

/// One calendar day (local time) with one volatility cell per canonical segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyVolatility {
    pub date: NaiveDate,
    pub weekday: String,
    pub is_weekend: bool,
    pub segments: Vec<SegmentVolatility>,
}

impl DailyVolatility {
    pub fn volatility(&self, segment: DaySegment) -> Option<f64> {
        self.segments
            .iter()
            .find(|s| s.segment == segment)
            .and_then(|s| s.movement)
    }
}

/// An event left-joined to the day row of its local announcement date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventDayVolatility {
    pub event_index: usize,
    pub event: IndicatorEvent,
    pub local_time: DateTime<FixedOffset>,
    pub date: NaiveDate,
    pub segment: DaySegment,
    pub matched_day: bool,
    pub own_segment_volatility: Option<f64>,
    pub segments: Vec<SegmentVolatility>,
}

impl EventDayVolatility {
    pub fn volatility(&self, segment: DaySegment) -> Option<f64> {
        self.segments
            .iter()
            .find(|s| s.segment == segment)
            .and_then(|s| s.movement)
    }

    pub fn unmatched_segments() -> Vec<SegmentVolatility> {
        DAY_SEGMENTS.iter().copied().map(SegmentVolatility::empty).collect()
    }
}
