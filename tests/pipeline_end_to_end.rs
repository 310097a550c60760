//! End-to-end runs of the batch pipeline on synthetic minute pivots

use chrono::{DateTime, Duration, TimeZone, Utc};
use indicator_volatility::{
    pipeline::AnalysisPipeline,
    storage::OutputWriter,
    Config, IndicatorEvent, Pivot, VolatilityCategory,
};

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
}

fn price(i: i64) -> f64 {
    1.1000 + 0.0001 * ((i * 7) % 13) as f64
}

/// One leg per minute for a whole UTC day.
fn minute_pivots() -> Vec<Pivot> {
    (0..24 * 60)
        .map(|i| {
            let t = base() + Duration::minutes(i);
            Pivot::new(t, t + Duration::minutes(1), price(i), price(i + 1))
        })
        .collect()
}

fn cpi_events() -> Vec<IndicatorEvent> {
    [90, 210, 330, 450, 570, 690]
        .into_iter()
        .map(|m| IndicatorEvent::new(base() + Duration::minutes(m), "USD", "CPI m/m").with_values(Some(0.3), Some(0.4)))
        .collect()
}

#[test]
fn full_run_produces_every_table() {
    let config = Config::default();
    let outputs = AnalysisPipeline::new(&config)
        .run("test_run", minute_pivots(), &cpi_events())
        .unwrap();

    assert_eq!(outputs.post_windows, vec![5, 15, 30]);
    assert_eq!(outputs.events.len(), 6);
    assert!(outputs.events.iter().all(|a| a.pre.valid && a.post.windows.iter().all(|w| w.valid)));
    assert!(outputs.events.iter().enumerate().all(|(i, a)| a.event_index == i));

    // 00:00 UTC is 09:00 in UTC+9, so the UTC day spans two local dates
    assert_eq!(outputs.daily_volatility.len(), 2);
    assert_eq!(outputs.event_days.len(), 6);
    assert!(outputs.event_days.iter().all(|d| d.matched_day));
    // no announcement segment reaches the default five samples
    assert!(outputs.own_segment_statistics.is_empty());
    assert!(outputs.own_segment_classification.is_none());

    assert_eq!(outputs.window_statistics.len(), 3);
    for window in &outputs.window_statistics {
        assert_eq!(window.statistics.len(), 1);
        assert_eq!(window.statistics[0].stats.sample_count, 6);
        let classification = window.classification.as_ref().unwrap();
        // a single group sits on both thresholds
        assert_eq!(classification.rows[0].category, VolatilityCategory::Large);
    }

    assert_eq!(outputs.scale_ratios.len(), 6);
    assert_eq!(outputs.correlations.horizons, vec![5, 15, 30]);
    assert_eq!(outputs.horizons.len(), 3);
    assert_eq!(outputs.growth.len(), 1);
    assert_eq!(outputs.growth[0].steps.len(), 3);

    let summary = &outputs.summary;
    assert_eq!(summary.events_analysed, 6);
    assert_eq!(summary.valid_pre_windows, 6);
    assert_eq!(summary.valid_post_windows.get(&30), Some(&6));
    assert_eq!(summary.pivot_count, 24 * 60);
    assert_eq!(summary.top_indicators.len(), 1);
    assert_eq!(summary.top_indicators[0].window_minutes, 30);
}

#[test]
fn own_announcement_segments_are_grouped_and_classified() {
    let config = Config {
        min_samples: 1,
        ..Config::default()
    };
    let outputs = AnalysisPipeline::new(&config)
        .run("own_segments", minute_pivots(), &cpi_events())
        .unwrap();

    // local announcement hours 10:30, 12:30, 14:30, 16:30, 18:30, 20:30
    let slots: Vec<(Option<&str>, usize)> = outputs
        .own_segment_statistics
        .iter()
        .map(|s| (s.key.window_slot.as_deref(), s.stats.sample_count))
        .collect();
    assert_eq!(slots, vec![(Some("09-12"), 1), (Some("12-15"), 2), (Some("15-21"), 3)]);

    let classification = outputs.own_segment_classification.as_ref().unwrap();
    assert_eq!(classification.rows.len(), 3);
    let rolled: usize = outputs.own_segment_rollup.iter().map(|c| c.count).sum();
    assert_eq!(rolled, 3);

    let tmp = tempfile::tempdir().unwrap();
    let writer = OutputWriter::create(tmp.path(), "own_segments", 4).unwrap();
    writer.write_outputs(&outputs).unwrap();
    let rows = std::fs::read_to_string(writer.dir().join("own_segment_classified.jsonl")).unwrap();
    assert_eq!(rows.lines().count(), 3);
    assert!(writer.dir().join("own_segment_rollup.jsonl").exists());
}

#[test]
fn events_without_pivots_still_produce_rows() {
    let config = Config::default();
    let outputs = AnalysisPipeline::new(&config)
        .run("no_pivots", Vec::new(), &cpi_events())
        .unwrap();

    assert_eq!(outputs.events.len(), 6);
    assert!(outputs.events.iter().all(|a| !a.pre.valid && !a.ratios.valid));
    assert!(outputs.daily_volatility.is_empty());
    assert!(outputs.event_days.iter().all(|d| !d.matched_day));
    assert!(outputs.window_statistics.iter().all(|w| w.classification.is_none()));
    assert!(outputs.summary.top_indicators.is_empty());
}

#[test]
fn invalid_config_is_rejected() {
    let config = Config {
        post_window_minutes: Vec::new(),
        ..Config::default()
    };
    assert!(AnalysisPipeline::new(&config).run("bad", minute_pivots(), &cpi_events()).is_err());
}

#[test]
fn outputs_land_in_the_run_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let config = Config::default();
    let outputs = AnalysisPipeline::new(&config)
        .run("written", minute_pivots(), &cpi_events())
        .unwrap();

    let writer = OutputWriter::create(tmp.path(), "written", config.output_decimals).unwrap();
    let paths = writer.write_outputs(&outputs).unwrap();

    let run_dir = tmp.path().join("written");
    assert!(paths.iter().all(|p| p.starts_with(&run_dir) && p.exists()));
    for name in [
        "event_analysis.jsonl",
        "event_analysis.csv",
        "daily_volatility.jsonl",
        "slot_statistics_sparse.jsonl",
        "own_segment_statistics.jsonl",
        "scale_correlations.json",
        "statistics_30min.jsonl",
        "classified_5min.jsonl",
        "summary.json",
    ] {
        assert!(run_dir.join(name).exists(), "missing {}", name);
    }

    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(run_dir.join("summary.json")).unwrap()).unwrap();
    assert_eq!(summary["events_analysed"], 6);

    let mut reader = csv::Reader::from_path(run_dir.join("event_analysis.csv")).unwrap();
    assert_eq!(reader.records().count(), 6);
}
