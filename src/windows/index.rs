//! Day-segment lookup and event-relative window boundaries

use chrono::{DateTime, Duration, FixedOffset, Timelike, Utc};
use crate::errors::{AnalysisError, AnalysisResult};
use crate::types::{DaySegment, TimeWindow, DAY_SEGMENTS};

/// Segment containing a local hour. Hour 24 is midnight of the next day.
pub fn segment_for_hour(hour: u32) -> DaySegment {
    let hour = hour % 24;
    DAY_SEGMENTS
        .iter()
        .copied()
        .find(|s| s.contains_hour(hour))
        .unwrap_or(DAY_SEGMENTS[0])
}

pub fn segment_for_time(time: &DateTime<FixedOffset>) -> DaySegment {
    segment_for_hour(time.hour())
}

/// Absolute window `[event + start, event + end]`, reordered when given backwards.
pub fn relative_window(event_time: DateTime<Utc>, offset_start_min: i64, offset_end_min: i64) -> TimeWindow {
    TimeWindow::new(
        event_time + Duration::minutes(offset_start_min),
        event_time + Duration::minutes(offset_end_min),
    )
}

pub fn pre_window(event_time: DateTime<Utc>, minutes: u32) -> TimeWindow {
    relative_window(event_time, -i64::from(minutes), 0)
}

pub fn post_window(event_time: DateTime<Utc>, minutes: u32) -> TimeWindow {
    relative_window(event_time, 0, i64::from(minutes))
}

pub fn local_offset(hours: i32) -> AnalysisResult<FixedOffset> {
    FixedOffset::east_opt(hours * 3600).ok_or_else(|| {
        AnalysisError::InvalidConfig(format!("UTC offset of {} hours is out of range", hours))
    })
}

pub fn to_local(time: DateTime<Utc>, offset: FixedOffset) -> DateTime<FixedOffset> {
    time.with_timezone(&offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn every_hour_maps_to_exactly_one_segment() {
        for hour in 0..24 {
            let owners = DAY_SEGMENTS.iter().filter(|s| s.contains_hour(hour)).count();
            assert_eq!(owners, 1, "hour {}", hour);
            assert!(segment_for_hour(hour).contains_hour(hour));
        }
        assert_eq!(segment_for_hour(6).label(), "03-07");
        assert_eq!(segment_for_hour(24), segment_for_hour(0));
    }

    #[test]
    fn relative_windows_are_ordered() {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 7, 5, 0).unwrap();
        let pre = pre_window(t, 5);
        assert_eq!(pre.start, Utc.with_ymd_and_hms(2024, 3, 1, 7, 0, 0).unwrap());
        assert_eq!(pre.end, t);

        let post = post_window(t, 30);
        assert_eq!(post.minutes(), 30.0);

        let backwards = relative_window(t, 10, -10);
        assert!(backwards.start <= backwards.end);
        assert_eq!(backwards.minutes(), 20.0);
    }

    #[test]
    fn local_conversion_shifts_hour() {
        let offset = local_offset(9).unwrap();
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 23, 30, 0).unwrap();
        let local = to_local(t, offset);
        assert_eq!(local.hour(), 8);
        assert_eq!(segment_for_time(&local).label(), "07-09");
        assert!(local_offset(30).is_err());
    }
}
