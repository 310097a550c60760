//! Output table persistence (JSON lines + flat enriched CSV)

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::info;
use crate::{
    errors::{AnalysisError, AnalysisResult},
    pipeline::AnalysisOutputs,
    storage::EVENT_TIME_FORMAT,
    types::{EventAnalysis, WindowMetrics},
    utils::round_to,
};

/// Metric columns emitted for the pre window and for every post window.
pub const WINDOW_METRIC_FIELDS: [&str; 11] = [
    "high",
    "low",
    "movement",
    "start_price",
    "end_price",
    "net_movement",
    "direction",
    "movement_efficiency",
    "elapsed_minutes",
    "speed",
    "leg_frequency",
];

pub fn new_run_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}", Utc::now().format("%Y%m%d_%H%M%S"), &id[..8])
}

/// Rounds every float in a JSON tree; integers are left alone.
pub fn round_json(value: &mut Value, decimals: u32) {
    match value {
        Value::Number(n) if n.is_f64() => {
            if let Some(rounded) = n
                .as_f64()
                .map(|x| round_to(x, decimals))
                .and_then(serde_json::Number::from_f64)
            {
                *n = rounded;
            }
        }
        Value::Array(items) => items.iter_mut().for_each(|v| round_json(v, decimals)),
        Value::Object(map) => map.values_mut().for_each(|v| round_json(v, decimals)),
        _ => {}
    }
}

pub struct OutputWriter {
    dir: PathBuf,
    decimals: u32,
}

impl OutputWriter {
    /// Creates `<base>/<run_id>/`.
    pub fn create(base: &Path, run_id: &str, decimals: u32) -> AnalysisResult<Self> {
        let dir = base.join(run_id);
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, decimals })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn rounded<T: Serialize>(&self, row: &T) -> AnalysisResult<Value> {
        let mut value = serde_json::to_value(row)?;
        round_json(&mut value, self.decimals);
        Ok(value)
    }

    pub fn write_table<T: Serialize>(&self, name: &str, rows: &[T]) -> AnalysisResult<PathBuf> {
        let path = self.dir.join(format!("{}.jsonl", name));
        let mut out = BufWriter::new(File::create(&path)?);
        for row in rows {
            writeln!(out, "{}", serde_json::to_string(&self.rounded(row)?)?)?;
        }
        out.flush()?;

        info!(table = name, rows = rows.len(), path = %path.display(), "Saved table");
        Ok(path)
    }

    pub fn write_document<T: Serialize>(&self, name: &str, value: &T) -> AnalysisResult<PathBuf> {
        let path = self.dir.join(format!("{}.json", name));
        let json = serde_json::to_string_pretty(&self.rounded(value)?)?;
        fs::write(&path, json)?;
        info!(document = name, path = %path.display(), "Saved document");
        Ok(path)
    }

    /// One row per event. Analysis columns come first; an event field whose
    /// name is already taken by an analysis column is not written.
    pub fn write_enriched_csv(&self, name: &str, analyses: &[EventAnalysis], post_windows: &[u32]) -> AnalysisResult<PathBuf> {
        let path = self.dir.join(format!("{}.csv", name));
        let rows: Vec<FlatRow> = analyses
            .iter()
            .map(|a| flatten_analysis(a, post_windows, self.decimals))
            .collect();

        let mut header: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        for row in &rows {
            for (key, _) in &row.cells {
                if seen.insert(key.clone()) {
                    header.push(key.clone());
                }
            }
        }

        let csv_error = |source| AnalysisError::Csv {
            path: path.clone(),
            source,
        };
        let mut writer = csv::Writer::from_path(&path).map_err(csv_error)?;
        writer.write_record(&header).map_err(csv_error)?;
        for row in &rows {
            let record: Vec<&str> = header.iter().map(|h| row.get(h).unwrap_or("")).collect();
            writer.write_record(&record).map_err(csv_error)?;
        }
        writer.flush()?;

        info!(rows = rows.len(), columns = header.len(), path = %path.display(), "Saved enriched event table");
        Ok(path)
    }

    /// Persists every table of a run and returns the written paths.
    pub fn write_outputs(&self, outputs: &AnalysisOutputs) -> AnalysisResult<Vec<PathBuf>> {
        let mut paths = vec![
            self.write_table("event_analysis", &outputs.events)?,
            self.write_enriched_csv("event_analysis", &outputs.events, &outputs.post_windows)?,
            self.write_table("daily_volatility", &outputs.daily_volatility)?,
            self.write_table("event_day_volatility", &outputs.event_days)?,
            self.write_table("slot_statistics_sparse", &outputs.slot_statistics)?,
            self.write_table("slot_classifications", &outputs.slot_classifications)?,
            self.write_table("own_segment_statistics", &outputs.own_segment_statistics)?,
            self.write_table("own_segment_rollup", &outputs.own_segment_rollup)?,
            self.write_table("scale_ratios", &outputs.scale_ratios)?,
            self.write_document("scale_correlations", &outputs.correlations)?,
            self.write_table("propagation_effects", &outputs.propagation)?,
            self.write_table("scaling_properties", &outputs.scaling)?,
            self.write_table("horizon_comparison", &outputs.horizons)?,
            self.write_table("growth_patterns", &outputs.growth)?,
        ];

        if let Some(classification) = &outputs.own_segment_classification {
            paths.push(self.write_table("own_segment_classified", &classification.rows)?);
        }

        for window in &outputs.window_statistics {
            let suffix = format!("{}min", window.window_minutes);
            paths.push(self.write_table(&format!("statistics_{}", suffix), &window.statistics)?);
            if let Some(classification) = &window.classification {
                paths.push(self.write_table(&format!("classified_{}", suffix), &classification.rows)?);
            }
            paths.push(self.write_table(&format!("category_rollup_{}", suffix), &window.rollup)?);
            paths.push(self.write_table(&format!("outliers_{}", suffix), &window.outliers)?);
            paths.push(self.write_document(&format!("distribution_{}", suffix), &window.distribution)?);
        }

        paths.push(self.write_document("summary", &outputs.summary)?);
        Ok(paths)
    }
}

/// Ordered cells of one flat event row; the first write of a key wins.
#[derive(Debug, Clone, Default)]
pub struct FlatRow {
    cells: Vec<(String, String)>,
    keys: HashSet<String>,
}

impl FlatRow {
    pub fn insert(&mut self, key: impl Into<String>, value: String) -> bool {
        let key = key.into();
        if !self.keys.insert(key.clone()) {
            return false;
        }
        self.cells.push((key, value));
        true
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.cells.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(k, _)| k.as_str())
    }
}

fn num(value: Option<f64>, decimals: u32) -> String {
    value
        .filter(|v| v.is_finite())
        .map(|v| round_to(v, decimals).to_string())
        .unwrap_or_default()
}

fn metric_cell(metrics: &WindowMetrics, field: &str, decimals: u32) -> String {
    let m = &metrics.movement;
    let s = &metrics.speed;
    match field {
        "high" => num(m.high, decimals),
        "low" => num(m.low, decimals),
        "movement" => num(Some(m.movement), decimals),
        "start_price" => num(m.start_price, decimals),
        "end_price" => num(m.end_price, decimals),
        "net_movement" => num(m.net_movement, decimals),
        "direction" => m.direction.to_string(),
        "movement_efficiency" => num(m.movement_efficiency, decimals),
        "elapsed_minutes" => num(s.elapsed_minutes, decimals),
        "speed" => num(s.speed, decimals),
        "leg_frequency" => num(s.leg_frequency, decimals),
        _ => String::new(),
    }
}

pub fn flatten_analysis(analysis: &EventAnalysis, post_windows: &[u32], decimals: u32) -> FlatRow {
    let mut row = FlatRow::default();
    let pre = &analysis.pre;

    row.insert("event_index", analysis.event_index.to_string());
    row.insert("pre_window_minutes", pre.window_minutes.to_string());
    row.insert("pre_event_valid", pre.valid.to_string());
    row.insert("pre_event_points", pre.point_count.to_string());
    row.insert("pre_event_legs", pre.leg_count.to_string());
    for field in WINDOW_METRIC_FIELDS {
        row.insert(format!("pre_{}", field), metric_cell(&pre.metrics, field, decimals));
    }
    row.insert("pre_last_min_movement", num(pre.last_minute_movement, decimals));
    row.insert(
        "pre_last_min_direction",
        pre.last_minute_direction.map(|d| d.to_string()).unwrap_or_default(),
    );

    for &minutes in post_windows {
        let prefix = format!("post_{}min", minutes);
        match analysis.post.window(minutes) {
            Some(w) => {
                row.insert(format!("{}_valid", prefix), w.valid.to_string());
                row.insert(format!("{}_points", prefix), w.point_count.to_string());
                row.insert(format!("{}_legs", prefix), w.leg_count.to_string());
                for field in WINDOW_METRIC_FIELDS {
                    row.insert(format!("{}_{}", prefix, field), metric_cell(&w.metrics, field, decimals));
                }
            }
            None => {
                row.insert(format!("{}_valid", prefix), false.to_string());
            }
        }
    }

    let ratios = &analysis.ratios;
    row.insert("ratios_valid", ratios.valid.to_string());
    row.insert(
        "ratio_failure",
        ratios
            .failure
            .and_then(|f| serde_json::to_value(f).ok())
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default(),
    );
    for &minutes in post_windows {
        let w = ratios.window(minutes);
        row.insert(format!("ratio_{}min", minutes), num(w.and_then(|w| w.ratio), decimals));
        row.insert(format!("log_ratio_{}min", minutes), num(w.and_then(|w| w.log_ratio), decimals));
        row.insert(
            format!("direction_consistency_{}min", minutes),
            num(w.map(|w| w.direction_consistency), decimals),
        );
    }

    // event fields last so they never replace an analysis column
    let event = &analysis.event;
    row.insert("DateTime (UTC)", event.time.format(EVENT_TIME_FORMAT).to_string());
    row.insert("Currency", event.currency.clone());
    row.insert("EventName", event.event_name.clone());
    row.insert("Forecast", num(event.forecast, decimals));
    row.insert("Actual", num(event.actual, decimals));
    for (key, value) in &event.extra {
        row.insert(key.clone(), value.clone());
    }

    row
}
