//! Run summary derived from the pipeline outputs

use std::collections::BTreeMap;
use serde::Serialize;
use crate::types::{EventAnalysis, VolatilityCategory, WindowStatistics};

pub const TOP_INDICATOR_COUNT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopIndicator {
    pub window_minutes: u32,
    pub currency: String,
    pub event_name: String,
    pub mean_movement: f64,
    pub sample_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub pivot_count: usize,
    pub events_analysed: usize,
    pub valid_pre_windows: usize,
    pub valid_post_windows: BTreeMap<u32, usize>,
    pub valid_ratios: usize,
    pub pivot_days: usize,
    pub matched_event_days: usize,
    pub category_counts: BTreeMap<u32, BTreeMap<VolatilityCategory, usize>>,
    pub top_indicators: Vec<TopIndicator>,
}

impl RunSummary {
    pub fn build(
        run_id: &str,
        pivot_count: usize,
        analyses: &[EventAnalysis],
        windows: &[WindowStatistics],
        pivot_days: usize,
        matched_event_days: usize,
    ) -> Self {
        let mut valid_post_windows: BTreeMap<u32, usize> = BTreeMap::new();
        for analysis in analyses {
            for w in &analysis.post.windows {
                *valid_post_windows.entry(w.window_minutes).or_default() += usize::from(w.valid);
            }
        }

        let category_counts = windows
            .iter()
            .map(|w| {
                let mut counts: BTreeMap<VolatilityCategory, usize> = BTreeMap::new();
                if let Some(c) = &w.classification {
                    for row in &c.rows {
                        *counts.entry(row.category).or_default() += 1;
                    }
                }
                (w.window_minutes, counts)
            })
            .collect();

        Self {
            run_id: run_id.to_string(),
            pivot_count,
            events_analysed: analyses.len(),
            valid_pre_windows: analyses.iter().filter(|a| a.pre.valid).count(),
            valid_post_windows,
            valid_ratios: analyses.iter().filter(|a| a.ratios.valid).count(),
            pivot_days,
            matched_event_days,
            category_counts,
            top_indicators: top_indicators(windows),
        }
    }
}

/// Highest mean movement in the longest post window.
fn top_indicators(windows: &[WindowStatistics]) -> Vec<TopIndicator> {
    let Some(longest) = windows.iter().max_by_key(|w| w.window_minutes) else {
        return Vec::new();
    };
    let mut ranked: Vec<TopIndicator> = longest
        .statistics
        .iter()
        .filter_map(|s| {
            Some(TopIndicator {
                window_minutes: longest.window_minutes,
                currency: s.key.currency.clone(),
                event_name: s.key.event_name.clone(),
                mean_movement: s.stats.mean?,
                sample_count: s.stats.sample_count,
            })
        })
        .collect();
    ranked.sort_by(|a, b| b.mean_movement.total_cmp(&a.mean_movement));
    ranked.truncate(TOP_INDICATOR_COUNT);
    ranked
}
