//! Economic indicator announcement types

use std::collections::BTreeMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::config::NO_DATA_SENTINEL;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorEvent {
    pub time: DateTime<Utc>,
    pub currency: String,
    pub event_name: String,
    pub forecast: Option<f64>,
    pub actual: Option<f64>,
    /// Source columns outside the schema, carried through untouched.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl IndicatorEvent {
    pub fn new(time: DateTime<Utc>, currency: &str, event_name: &str) -> Self {
        Self {
            time,
            currency: currency.to_string(),
            event_name: event_name.to_string(),
            forecast: None,
            actual: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_values(mut self, forecast: Option<f64>, actual: Option<f64>) -> Self {
        self.forecast = forecast.and_then(normalize_sentinel);
        self.actual = actual.and_then(normalize_sentinel);
        self
    }
}

/// Maps the export's "no data" sentinel (and NaN) to a missing value.
pub fn normalize_sentinel(value: f64) -> Option<f64> {
    if value.is_nan() || value == NO_DATA_SENTINEL {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn sentinel_becomes_missing() {
        assert_eq!(normalize_sentinel(-9223372036854775808.0), None);
        assert_eq!(normalize_sentinel(i64::MIN as f64), None);
        assert_eq!(normalize_sentinel(f64::NAN), None);
        assert_eq!(normalize_sentinel(2.5), Some(2.5));
    }

    #[test]
    fn with_values_drops_sentinels() {
        let time = Utc.with_ymd_and_hms(2024, 5, 3, 12, 30, 0).unwrap();
        let event = IndicatorEvent::new(time, "USD", "Non-Farm Payrolls")
            .with_values(Some(NO_DATA_SENTINEL), Some(175.0));
        assert_eq!(event.forecast, None);
        assert_eq!(event.actual, Some(175.0));

        let event = event.with_values(Some(240.0), None);
        assert_eq!(event.forecast, Some(240.0));
        assert_eq!(event.actual, None);
    }
}
