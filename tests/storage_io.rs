//! File-backed loading and writing against temporary directories

use std::fs;
use std::path::PathBuf;
use indicator_volatility::{
    pipeline::AnalysisPipeline,
    storage::{load_events, load_pivot_files, OutputWriter},
    Config,
};

const PIVOT_HEADER: &str = "start_time_utc_seconds\tend_time_utc_seconds\tstart_price\tend_price\n";

/// 2024-03-01 13:20:00 UTC
const T0: i64 = 1_709_299_200;

fn pivot_file(dir: &std::path::Path, name: &str, start: i64, legs: i64) -> PathBuf {
    let mut body = String::from(PIVOT_HEADER);
    for i in 0..legs {
        let t = start + i * 60;
        let p0 = 150.0 + ((i * 5) % 7) as f64 * 0.01;
        let p1 = 150.0 + (((i + 1) * 5) % 7) as f64 * 0.01;
        body.push_str(&format!("{}\t{}\t{}\t{}\n", t, t + 60, p0, p1));
    }
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn concatenates_files_and_skips_missing_ones() {
    let tmp = tempfile::tempdir().unwrap();
    let a = pivot_file(tmp.path(), "a.tsv", T0, 10);
    let b = pivot_file(tmp.path(), "b.tsv", T0 + 600, 10);
    let missing = tmp.path().join("missing.tsv");

    let load = load_pivot_files(&[b, missing.clone(), a], b'\t');
    assert_eq!(load.pivots.len(), 20);
    assert_eq!(load.summary.files_read, 2);
    assert_eq!(load.summary.skipped_files, vec![missing]);
}

#[test]
fn loaded_inputs_run_through_the_pipeline() {
    let tmp = tempfile::tempdir().unwrap();
    let pivots = pivot_file(tmp.path(), "usdjpy.tsv", T0, 40);
    let events_path = tmp.path().join("events.csv");
    fs::write(
        &events_path,
        "DateTime (UTC),Currency,EventName,Forecast,Actual,Impact\n\
         2024.03.01 13:30:00,USD,Non-Farm Payrolls,200,275,High\n\
         2024.03.01 13:45:00,USD,Unemployment Rate,3.7,3.9,High\n",
    )
    .unwrap();

    let pivot_load = load_pivot_files(&[pivots], b'\t');
    let event_load = load_events(&events_path).unwrap();
    assert_eq!(event_load.events.len(), 2);

    let config = Config {
        min_samples: 1,
        ..Config::default()
    };
    let outputs = AnalysisPipeline::new(&config)
        .run("from_files", pivot_load.pivots, &event_load.events)
        .unwrap();
    assert!(outputs.events.iter().all(|a| a.pre.valid));
    assert_eq!(outputs.window_statistics[0].statistics.len(), 2);

    let writer = OutputWriter::create(&tmp.path().join("output"), "from_files", 4).unwrap();
    writer.write_outputs(&outputs).unwrap();

    let mut reader = csv::Reader::from_path(writer.dir().join("event_analysis.csv")).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.get(0), Some("event_index"));
    assert!(headers.iter().any(|h| h == "Impact"));
    assert!(headers.iter().any(|h| h == "ratio_30min"));
    let first = reader.records().next().unwrap().unwrap();
    let impact = headers.iter().position(|h| h == "Impact").unwrap();
    assert_eq!(first.get(impact), Some("High"));

    let jsonl = fs::read_to_string(writer.dir().join("statistics_5min.jsonl")).unwrap();
    assert_eq!(jsonl.lines().count(), 2);
}
