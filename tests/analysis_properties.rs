//! Property-based checks of window metrics, ratios, grouping and classification
//!
//! Invariants covered:
//! 1. Fewer than two pivots: zero movement, neutral direction
//! 2. Movement bounds the absolute net movement
//! 3. Zero pre-event movement never yields a valid ratio
//! 4. Relative windows are ordered whatever the offsets
//! 5. Grouped statistics are deterministic and lose no values
//! 6. Every classified group sits in the band its mean falls into

use chrono::{DateTime, Duration, TimeZone, Utc};
use indicator_volatility::{
    analysis::AsymmetricEventAnalyzer,
    statistics::{category_for, classify, group_statistics},
    windows::{movement_metrics, relative_window, PivotSeries},
    ClassificationMethod, Direction, GroupKey, IndicatorEvent, Pivot, RatioFailure,
};
use proptest::prelude::*;

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 7, 12, 30, 0).unwrap()
}

fn pivots_from(prices: &[f64], spacing_secs: i64) -> Vec<Pivot> {
    prices
        .windows(2)
        .enumerate()
        .map(|(i, pair)| {
            let t = base() + Duration::seconds(i as i64 * spacing_secs);
            Pivot::new(t, t + Duration::seconds(spacing_secs), pair[0], pair[1])
        })
        .collect()
}

proptest! {
    #[test]
    fn short_subsets_have_no_movement(price in 0.5f64..2.0, count in 0usize..2) {
        let subset: Vec<Pivot> = (0..count).map(|_| Pivot::point(base(), price)).collect();
        let metrics = movement_metrics(&subset);
        prop_assert_eq!(metrics.movement, 0.0);
        prop_assert_eq!(metrics.direction, Direction::Neutral);
        prop_assert_eq!(metrics.point_count, count);
    }

    #[test]
    fn movement_bounds_net_movement(prices in prop::collection::vec(0.5f64..2.0, 3..40)) {
        let pivots = pivots_from(&prices, 30);
        let metrics = movement_metrics(&pivots);
        let net = metrics.net_movement.unwrap();
        prop_assert!(metrics.movement >= 0.0);
        prop_assert!(net.abs() <= metrics.movement + 1e-12);
        let efficiency = metrics.movement_efficiency.unwrap();
        prop_assert!((0.0..=1.0 + 1e-12).contains(&efficiency));
    }

    #[test]
    fn flat_pre_window_invalidates_ratios(
        level in 0.5f64..2.0,
        post in prop::collection::vec(0.5f64..2.0, 3..10),
    ) {
        let event_time = base();
        let mut pivots: Vec<Pivot> = (1..=4)
            .map(|m| Pivot::point(event_time - Duration::minutes(m), level))
            .collect();
        pivots.extend(post.iter().enumerate().map(|(i, &p)| {
            Pivot::point(event_time + Duration::seconds(20 * (i as i64 + 1)), p)
        }));

        let event = IndicatorEvent::new(event_time, "EUR", "ECB Rate");
        let analysis = AsymmetricEventAnalyzer::new(5, &[5])
            .analyze(0, &event, &PivotSeries::new(pivots));

        prop_assert!(analysis.pre.valid);
        prop_assert!(!analysis.ratios.valid);
        prop_assert_eq!(analysis.ratios.failure, Some(RatioFailure::ZeroPreMovement));
    }

    #[test]
    fn relative_windows_are_ordered(a in -1440i64..1440, b in -1440i64..1440) {
        let window = relative_window(base(), a, b);
        prop_assert!(window.start <= window.end);
        prop_assert_eq!(window.start, base() + Duration::minutes(a.min(b)));
    }

    #[test]
    fn grouping_is_deterministic(
        rows in prop::collection::vec((0usize..3, prop::option::of(0.0f64..0.01)), 0..60),
    ) {
        let names = ["NFP", "CPI", "GDP"];
        let key = |r: &(usize, Option<f64>)| GroupKey::new("USD", names[r.0], None);
        let value = |r: &(usize, Option<f64>)| r.1;

        let first = group_statistics(&rows, key, value, 1);
        let second = group_statistics(&rows, key, value, 1);
        prop_assert_eq!(&first, &second);

        let counted: usize = first.iter().map(|g| g.stats.sample_count).sum();
        prop_assert_eq!(counted, rows.iter().filter(|r| r.1.is_some()).count());
        prop_assert!(first.windows(2).all(|w| w[0].key < w[1].key));
    }

    #[test]
    fn classification_matches_bands(
        means in prop::collection::vec(0.0f64..0.01, 1..30),
    ) {
        let rows: Vec<(usize, f64)> = means.iter().copied().enumerate().collect();
        let stats = group_statistics(
            &rows,
            |r| GroupKey::new("JPY", &format!("event-{}", r.0), None),
            |r| Some(r.1),
            1,
        );
        let classification = classify(&stats, ClassificationMethod::Percentile, None).unwrap();

        prop_assert!(classification.q1 <= classification.q2);
        prop_assert_eq!(classification.rows.len(), means.len());
        for row in &classification.rows {
            let mean = row.statistics.stats.mean.unwrap();
            prop_assert_eq!(row.category, category_for(mean, classification.q1, classification.q2));
        }
    }
}
