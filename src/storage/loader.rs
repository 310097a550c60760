//! Pivot and indicator table loading

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use chrono::{DateTime, NaiveDateTime, Utc};
use csv::StringRecord;
use tracing::{debug, info, warn};
use crate::{
    errors::{AnalysisError, AnalysisResult},
    types::{normalize_sentinel, IndicatorEvent, Pivot},
};

pub const PIVOT_COLUMNS: [&str; 4] = [
    "start_time_utc_seconds",
    "end_time_utc_seconds",
    "start_price",
    "end_price",
];

pub const EVENT_TIME_COLUMN: &str = "DateTime (UTC)";
pub const EVENT_TIME_FORMAT: &str = "%Y.%m.%d %H:%M:%S";
pub const CURRENCY_COLUMN: &str = "Currency";
pub const EVENT_NAME_COLUMN: &str = "EventName";
pub const FORECAST_COLUMN: &str = "Forecast";
pub const ACTUAL_COLUMN: &str = "Actual";

/// Replacement glyph left behind by a failed encoding conversion.
const GARBLED_GLYPH: char = '□';

#[derive(Debug, Clone)]
pub struct RowError {
    pub source: String,
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct LoadSummary {
    pub files_read: usize,
    pub skipped_files: Vec<PathBuf>,
    pub rows_read: usize,
    pub rows_dropped: usize,
    pub row_errors: Vec<RowError>,
}

#[derive(Debug, Clone, Default)]
pub struct PivotLoad {
    pub pivots: Vec<Pivot>,
    pub summary: LoadSummary,
}

#[derive(Debug, Clone, Default)]
pub struct EventLoad {
    pub events: Vec<IndicatorEvent>,
    pub summary: LoadSummary,
}

fn header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().trim_start_matches('\u{feff}').to_string(), i))
        .collect()
}

fn require(map: &HashMap<String, usize>, table: &str, column: &str) -> AnalysisResult<usize> {
    map.get(column)
        .copied()
        .ok_or_else(|| AnalysisError::missing_column(table, column))
}

fn field<'a>(record: &'a StringRecord, idx: usize) -> &'a str {
    record.get(idx).map(str::trim).unwrap_or("")
}

fn parse_f64(raw: &str, column: &str) -> Result<f64, String> {
    raw.parse::<f64>()
        .map_err(|e| format!("{}: '{}' is not a number ({})", column, raw, e))
}

/// Fractional UTC epoch seconds to an instant.
pub fn parse_epoch_seconds(raw: &str) -> AnalysisResult<DateTime<Utc>> {
    let secs: f64 = raw.trim().parse().map_err(|_| AnalysisError::TimestampParse {
        value: raw.to_string(),
        reason: "not a number".to_string(),
    })?;
    if !secs.is_finite() {
        return Err(AnalysisError::TimestampParse {
            value: raw.to_string(),
            reason: "not finite".to_string(),
        });
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos).ok_or_else(|| AnalysisError::TimestampParse {
        value: raw.to_string(),
        reason: "out of range".to_string(),
    })
}

pub fn parse_event_time(raw: &str) -> AnalysisResult<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw.trim(), EVENT_TIME_FORMAT)
        .map(|t| t.and_utc())
        .map_err(|e| AnalysisError::TimestampParse {
            value: raw.to_string(),
            reason: e.to_string(),
        })
}

/// Reads one pivot table. A missing required column fails the whole table;
/// malformed rows are skipped and reported.
pub fn read_pivots<R: Read>(reader: R, delimiter: u8, source: &str) -> AnalysisResult<PivotLoad> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AnalysisError::Csv {
            path: PathBuf::from(source),
            source: e,
        })?
        .clone();
    let map = header_map(&headers);
    let [start_t, end_t, start_p, end_p] = [
        require(&map, source, PIVOT_COLUMNS[0])?,
        require(&map, source, PIVOT_COLUMNS[1])?,
        require(&map, source, PIVOT_COLUMNS[2])?,
        require(&map, source, PIVOT_COLUMNS[3])?,
    ];

    let mut load = PivotLoad::default();
    load.summary.files_read = 1;

    for (i, result) in reader.records().enumerate() {
        let line = i + 2;
        load.summary.rows_read += 1;

        let parsed = result
            .map_err(|e| e.to_string())
            .and_then(|record| {
                let start_time = parse_epoch_seconds(field(&record, start_t)).map_err(|e| e.to_string())?;
                let end_time = parse_epoch_seconds(field(&record, end_t)).map_err(|e| e.to_string())?;
                let start_price = parse_f64(field(&record, start_p), PIVOT_COLUMNS[2])?;
                let end_price = parse_f64(field(&record, end_p), PIVOT_COLUMNS[3])?;
                let pivot = Pivot::new(start_time, end_time, start_price, end_price);
                if pivot.is_well_formed() {
                    Ok(pivot)
                } else {
                    Err("end before start or non-finite price".to_string())
                }
            });

        match parsed {
            Ok(pivot) => load.pivots.push(pivot),
            Err(message) => {
                load.summary.rows_dropped += 1;
                load.summary.row_errors.push(RowError {
                    source: source.to_string(),
                    line,
                    message,
                });
            }
        }
    }

    Ok(load)
}

pub fn load_pivot_file(path: &Path, delimiter: u8) -> AnalysisResult<PivotLoad> {
    let file = File::open(path)?;
    read_pivots(file, delimiter, &path.display().to_string())
}

/// Concatenates every readable pivot file in the given order, without
/// de-duplicating overlapping ranges.
pub fn load_pivot_files(paths: &[PathBuf], delimiter: u8) -> PivotLoad {
    let mut total = PivotLoad::default();

    for path in paths {
        match load_pivot_file(path, delimiter) {
            Ok(load) => {
                debug!(
                    file = %path.display(),
                    pivots = load.pivots.len(),
                    dropped = load.summary.rows_dropped,
                    "Loaded pivot file"
                );
                total.pivots.extend(load.pivots);
                total.summary.files_read += 1;
                total.summary.rows_read += load.summary.rows_read;
                total.summary.rows_dropped += load.summary.rows_dropped;
                total.summary.row_errors.extend(load.summary.row_errors);
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Skipping pivot file");
                total.summary.skipped_files.push(path.clone());
            }
        }
    }

    info!(
        files = total.summary.files_read,
        skipped = total.summary.skipped_files.len(),
        pivots = total.pivots.len(),
        dropped_rows = total.summary.rows_dropped,
        "Pivot data loaded"
    );
    total
}

pub fn is_garbled(name: &str) -> bool {
    name.chars().filter(|&c| c == GARBLED_GLYPH).count() >= 2
}

fn optional_value(record: &StringRecord, idx: Option<usize>) -> Option<f64> {
    let raw = field(record, idx?);
    if raw.is_empty() {
        return None;
    }
    raw.parse::<f64>().ok().and_then(normalize_sentinel)
}

/// Reads the indicator calendar. Columns outside the schema are carried in
/// [`IndicatorEvent::extra`].
pub fn read_events<R: Read>(reader: R, source: &str) -> AnalysisResult<EventLoad> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AnalysisError::Csv {
            path: PathBuf::from(source),
            source: e,
        })?
        .clone();
    let map = header_map(&headers);
    let time_idx = require(&map, source, EVENT_TIME_COLUMN)?;
    let currency_idx = require(&map, source, CURRENCY_COLUMN)?;
    let name_idx = require(&map, source, EVENT_NAME_COLUMN)?;
    let forecast_idx = map.get(FORECAST_COLUMN).copied();
    let actual_idx = map.get(ACTUAL_COLUMN).copied();

    let schema = [time_idx, currency_idx, name_idx];
    let extra_columns: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| !schema.contains(i) && Some(*i) != forecast_idx && Some(*i) != actual_idx)
        .map(|(i, h)| (i, h.trim().to_string()))
        .collect();

    let mut load = EventLoad::default();
    load.summary.files_read = 1;
    let mut garbled = 0usize;

    for (i, result) in reader.records().enumerate() {
        let line = i + 2;
        load.summary.rows_read += 1;

        let record = match result {
            Ok(record) => record,
            Err(e) => {
                load.summary.rows_dropped += 1;
                load.summary.row_errors.push(RowError {
                    source: source.to_string(),
                    line,
                    message: e.to_string(),
                });
                continue;
            }
        };

        let event_name = field(&record, name_idx);
        if is_garbled(event_name) {
            garbled += 1;
            load.summary.rows_dropped += 1;
            continue;
        }

        let time = match parse_event_time(field(&record, time_idx)) {
            Ok(time) => time,
            Err(e) => {
                load.summary.rows_dropped += 1;
                load.summary.row_errors.push(RowError {
                    source: source.to_string(),
                    line,
                    message: e.to_string(),
                });
                continue;
            }
        };

        let mut event = IndicatorEvent::new(time, field(&record, currency_idx), event_name);
        event.forecast = optional_value(&record, forecast_idx);
        event.actual = optional_value(&record, actual_idx);
        event.extra = extra_columns
            .iter()
            .map(|(idx, name)| (name.clone(), field(&record, *idx).to_string()))
            .collect::<BTreeMap<_, _>>();
        load.events.push(event);
    }

    if garbled > 0 {
        debug!(garbled, "Dropped events with garbled names");
    }
    Ok(load)
}

pub fn load_events(path: &Path) -> AnalysisResult<EventLoad> {
    let file = File::open(path)?;
    let load = read_events(file, &path.display().to_string())?;
    info!(
        file = %path.display(),
        events = load.events.len(),
        dropped_rows = load.summary.rows_dropped,
        "Indicator events loaded"
    );
    Ok(load)
}
