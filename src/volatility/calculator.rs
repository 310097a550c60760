//! Fixed day-segment volatility calculator

use std::collections::{BTreeMap, HashMap};
use chrono::{Datelike, FixedOffset, NaiveDate, Timelike, Weekday};
use tracing::{debug, info};
use crate::{
    config::Config,
    errors::AnalysisResult,
    types::{
        DailyVolatility, EventDayVolatility, IndicatorEvent, Pivot, SegmentVolatility, DAY_SEGMENTS,
    },
    utils::min_max,
    windows::{local_offset, segment_for_hour, segment_for_time, to_local},
};

/// Buckets pivots into the canonical local-day segments.
///
/// Only `start_price` enters the range here, unlike the event windows which
/// take high/low over both leg prices.
pub struct FixedWindowVolatilityCalculator {
    offset: FixedOffset,
}

impl FixedWindowVolatilityCalculator {
    pub fn new(offset: FixedOffset) -> Self {
        FixedWindowVolatilityCalculator { offset }
    }

    pub fn from_config(config: &Config) -> AnalysisResult<Self> {
        Ok(Self::new(local_offset(config.local_utc_offset_hours)?))
    }

    /// One row per local calendar date present in the pivots, ascending.
    pub fn daily_volatility(&self, pivots: &[Pivot]) -> Vec<DailyVolatility> {
        let mut buckets: BTreeMap<NaiveDate, Vec<Vec<f64>>> = BTreeMap::new();

        for pivot in pivots {
            let local = to_local(pivot.start_time, self.offset);
            let slot = segment_for_hour(local.hour()).index().unwrap_or(0);
            buckets
                .entry(local.date_naive())
                .or_insert_with(|| vec![Vec::new(); DAY_SEGMENTS.len()])[slot]
                .push(pivot.start_price);
        }

        let days: Vec<DailyVolatility> = buckets
            .into_iter()
            .map(|(date, prices)| {
                let segments = DAY_SEGMENTS
                    .iter()
                    .zip(prices.iter())
                    .map(|(&segment, prices)| SegmentVolatility {
                        segment,
                        point_count: prices.len(),
                        movement: min_max(prices).map(|(lo, hi)| hi - lo),
                    })
                    .collect();
                DailyVolatility {
                    date,
                    weekday: date.format("%A").to_string(),
                    is_weekend: matches!(date.weekday(), Weekday::Sat | Weekday::Sun),
                    segments,
                }
            })
            .collect();

        info!(
            pivots = pivots.len(),
            days = days.len(),
            "Computed fixed-window daily volatility"
        );
        days
    }

    /// Left join on the local announcement date. Unmatched events keep all
    /// their fields and carry missing volatility.
    pub fn join_events(&self, events: &[IndicatorEvent], days: &[DailyVolatility]) -> Vec<EventDayVolatility> {
        let by_date: HashMap<NaiveDate, &DailyVolatility> = days.iter().map(|d| (d.date, d)).collect();

        let joined: Vec<EventDayVolatility> = events
            .iter()
            .enumerate()
            .map(|(event_index, event)| {
                let local_time = to_local(event.time, self.offset);
                let date = local_time.date_naive();
                let segment = segment_for_time(&local_time);
                let day = by_date.get(&date);

                if day.is_none() {
                    debug!(
                        currency = %event.currency,
                        event = %event.event_name,
                        %date,
                        "No pivot day for announcement date"
                    );
                }

                let segments = day
                    .map(|d| d.segments.clone())
                    .unwrap_or_else(EventDayVolatility::unmatched_segments);
                let own_segment_volatility = day.and_then(|d| d.volatility(segment));

                EventDayVolatility {
                    event_index,
                    event: event.clone(),
                    local_time,
                    date,
                    segment,
                    matched_day: day.is_some(),
                    own_segment_volatility,
                    segments,
                }
            })
            .collect();

        info!(
            events = joined.len(),
            matched = joined.iter().filter(|j| j.matched_day).count(),
            "Joined events to daily volatility"
        );
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn utc(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, h, m, 0).unwrap()
    }

    fn calculator() -> FixedWindowVolatilityCalculator {
        FixedWindowVolatilityCalculator::new(local_offset(9).unwrap())
    }

    #[test]
    fn buckets_by_local_segment_using_start_price() {
        let pivots = vec![
            // 09:10 / 09:40 / 11:59 local on 2024-03-02 (Saturday)
            Pivot::new(utc(2, 0, 10), utc(2, 0, 20), 100.0, 150.0),
            Pivot::new(utc(2, 0, 40), utc(2, 0, 50), 103.0, 90.0),
            Pivot::new(utc(2, 2, 59), utc(2, 3, 0), 101.0, 101.0),
            // 12:00 local: next segment
            Pivot::point(utc(2, 3, 0), 120.0),
            // 08:30 local on 2024-03-03
            Pivot::point(utc(2, 23, 30), 50.0),
        ];
        let days = calculator().daily_volatility(&pivots);
        assert_eq!(days.len(), 2);

        let first = &days[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        assert_eq!(first.weekday, "Saturday");
        assert!(first.is_weekend);
        let morning = DAY_SEGMENTS[3];
        assert_eq!(morning.label(), "09-12");
        assert_eq!(first.volatility(morning), Some(3.0));
        // single point is both high and low
        assert_eq!(first.volatility(DAY_SEGMENTS[4]), Some(0.0));
        assert_eq!(first.volatility(DAY_SEGMENTS[0]), None);

        let second = &days[1];
        assert_eq!(second.weekday, "Sunday");
        assert_eq!(second.volatility(DAY_SEGMENTS[2]), Some(0.0));
    }

    #[test]
    fn join_keeps_unmatched_events() {
        let calc = calculator();
        let pivots = vec![
            Pivot::point(utc(4, 0, 0), 10.0),
            Pivot::point(utc(4, 1, 0), 12.5),
        ];
        let days = calc.daily_volatility(&pivots);
        let events = vec![
            IndicatorEvent::new(utc(4, 0, 30), "JPY", "Tankan"),
            IndicatorEvent::new(utc(9, 0, 30), "JPY", "GDP"),
        ];
        let joined = calc.join_events(&events, &days);
        assert_eq!(joined.len(), 2);

        assert!(joined[0].matched_day);
        assert_eq!(joined[0].segment.label(), "09-12");
        assert_eq!(joined[0].own_segment_volatility, Some(2.5));

        assert!(!joined[1].matched_day);
        assert_eq!(joined[1].event.event_name, "GDP");
        assert_eq!(joined[1].own_segment_volatility, None);
        assert_eq!(joined[1].segments.len(), DAY_SEGMENTS.len());
        assert!(joined[1].segments.iter().all(|s| s.movement.is_none()));
    }
}
