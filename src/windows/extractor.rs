//! Pivot extraction over time windows and the metrics derived from it

use chrono::{DateTime, Utc};
use crate::types::{Direction, MovementMetrics, Pivot, SpeedMetrics, TimeWindow, WindowMetrics};

/// Read-only pivot table ordered by leg start time.
///
/// Multiple source files are concatenated as-is; overlapping legs are kept.
#[derive(Debug, Clone, Default)]
pub struct PivotSeries {
    pivots: Vec<Pivot>,
}

impl PivotSeries {
    pub fn new(mut pivots: Vec<Pivot>) -> Self {
        // stable: equal timestamps keep their source order
        pivots.sort_by_key(|p| p.start_time);
        Self { pivots }
    }

    pub fn len(&self) -> usize {
        self.pivots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pivots.is_empty()
    }

    pub fn as_slice(&self) -> &[Pivot] {
        &self.pivots
    }

    pub fn first_time(&self) -> Option<DateTime<Utc>> {
        self.pivots.first().map(|p| p.start_time)
    }

    pub fn last_time(&self) -> Option<DateTime<Utc>> {
        self.pivots.last().map(|p| p.start_time)
    }

    /// Pivots whose start time lies in `[t0, t1]`, both ends inclusive.
    pub fn extract_between(&self, t0: DateTime<Utc>, t1: DateTime<Utc>) -> &[Pivot] {
        if t0 > t1 {
            return &[];
        }
        let lo = self.pivots.partition_point(|p| p.start_time < t0);
        let hi = self.pivots.partition_point(|p| p.start_time <= t1);
        &self.pivots[lo..hi]
    }

    pub fn extract(&self, window: &TimeWindow) -> &[Pivot] {
        self.extract_between(window.start, window.end)
    }
}

impl From<Vec<Pivot>> for PivotSeries {
    fn from(pivots: Vec<Pivot>) -> Self {
        Self::new(pivots)
    }
}

/// First and last pivot by start time; ties resolve to input order.
fn chronological_ends(subset: &[Pivot]) -> Option<(&Pivot, &Pivot)> {
    let first = subset.iter().min_by_key(|p| p.start_time)?;
    let last = subset.iter().max_by_key(|p| p.start_time)?;
    Some((first, last))
}

/// High/low/direction of a window. Fewer than two pivots yields zero movement.
pub fn movement_metrics(subset: &[Pivot]) -> MovementMetrics {
    let count = subset.len();
    if count < 2 {
        return MovementMetrics::insufficient(count);
    }
    let Some((first, last)) = chronological_ends(subset) else {
        return MovementMetrics::insufficient(count);
    };

    let high = subset.iter().map(Pivot::high).fold(f64::NEG_INFINITY, f64::max);
    let low = subset.iter().map(Pivot::low).fold(f64::INFINITY, f64::min);
    let movement = high - low;

    let start_price = first.start_price;
    let end_price = last.end_price;
    let net_movement = end_price - start_price;
    let movement_efficiency = if movement == 0.0 {
        0.0
    } else {
        net_movement.abs() / movement
    };

    MovementMetrics {
        point_count: count,
        high: Some(high),
        low: Some(low),
        start_price: Some(start_price),
        end_price: Some(end_price),
        movement,
        net_movement: Some(net_movement),
        direction: Direction::from_prices(start_price, end_price),
        movement_efficiency: Some(movement_efficiency),
    }
}

pub fn elapsed_minutes(subset: &[Pivot]) -> Option<f64> {
    let (first, last) = chronological_ends(subset)?;
    Some((last.start_time - first.start_time).num_milliseconds() as f64 / 60_000.0)
}

/// Movement per minute and legs per minute; undefined over a zero-length span.
pub fn speed_metrics(subset: &[Pivot], movement: f64) -> SpeedMetrics {
    let elapsed = elapsed_minutes(subset);
    match elapsed {
        Some(minutes) if subset.len() >= 2 && minutes > 0.0 => SpeedMetrics {
            elapsed_minutes: Some(minutes),
            speed: Some(movement / minutes),
            leg_frequency: Some((subset.len() - 1) as f64 / minutes),
        },
        _ => SpeedMetrics::undefined(elapsed),
    }
}

pub fn window_metrics(subset: &[Pivot]) -> WindowMetrics {
    let movement = movement_metrics(subset);
    let speed = speed_metrics(subset, movement.movement);
    WindowMetrics { movement, speed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, h, m, 0).unwrap()
    }

    fn series() -> PivotSeries {
        PivotSeries::new(vec![
            Pivot::point(at(9, 4), 1798.0),
            Pivot::point(at(9, 0), 1800.0),
            Pivot::point(at(9, 2), 1805.0),
            Pivot::point(at(9, 10), 1790.0),
        ])
    }

    #[test]
    fn extraction_is_closed_on_both_ends() {
        let s = series();
        let subset = s.extract_between(at(9, 0), at(9, 4));
        assert_eq!(subset.len(), 3);
        assert_eq!(subset[0].start_time, at(9, 0));
        assert_eq!(subset[2].start_time, at(9, 4));

        assert!(s.extract_between(at(9, 5), at(9, 9)).is_empty());
        assert!(s.extract_between(at(9, 4), at(9, 0)).is_empty());
        assert!(PivotSeries::default().extract_between(at(0, 0), at(23, 0)).is_empty());
    }

    #[test]
    fn three_point_window_metrics() {
        let s = series();
        let metrics = window_metrics(s.extract_between(at(9, 0), at(9, 4)));
        let m = &metrics.movement;
        assert_eq!(m.high, Some(1805.0));
        assert_eq!(m.low, Some(1798.0));
        assert_eq!(m.movement, 7.0);
        assert_eq!(m.net_movement, Some(-2.0));
        assert_eq!(m.direction, Direction::Down);
        assert!((m.movement_efficiency.unwrap() - 2.0 / 7.0).abs() < 1e-12);

        assert_eq!(metrics.speed.elapsed_minutes, Some(4.0));
        assert_eq!(metrics.speed.speed, Some(1.75));
        assert_eq!(metrics.speed.leg_frequency, Some(0.5));
    }

    #[test]
    fn high_low_cover_both_leg_prices() {
        let legs = [
            Pivot::new(at(9, 0), at(9, 1), 100.0, 104.0),
            Pivot::new(at(9, 1), at(9, 3), 104.0, 99.0),
        ];
        let m = movement_metrics(&legs);
        assert_eq!(m.high, Some(104.0));
        assert_eq!(m.low, Some(99.0));
        assert_eq!(m.start_price, Some(100.0));
        assert_eq!(m.end_price, Some(99.0));
    }

    #[test]
    fn degenerate_windows_never_divide_by_zero() {
        let single = [Pivot::point(at(9, 0), 1.0)];
        let m = window_metrics(&single);
        assert_eq!(m.movement.movement, 0.0);
        assert_eq!(m.movement.direction, Direction::Neutral);
        assert_eq!(m.speed.speed, None);

        let same_instant = [Pivot::point(at(9, 0), 1.0), Pivot::point(at(9, 0), 2.0)];
        let m = window_metrics(&same_instant);
        assert_eq!(m.movement.movement, 1.0);
        assert_eq!(m.speed.elapsed_minutes, Some(0.0));
        assert_eq!(m.speed.speed, None);
        assert_eq!(m.speed.leg_frequency, None);

        let flat = [Pivot::point(at(9, 0), 1.0), Pivot::point(at(9, 3), 1.0)];
        let m = movement_metrics(&flat);
        assert_eq!(m.movement_efficiency, Some(0.0));
        assert_eq!(m.direction, Direction::Neutral);
    }
}
