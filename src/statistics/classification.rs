//! Small/Medium/Large volatility classification and category rollups

use std::collections::BTreeMap;
use tracing::{debug, info};
use crate::{
    config::{CATEGORY_PERCENTILES, DEFAULT_ABSOLUTE_THRESHOLDS},
    types::{
        CategorySummary, Classification, ClassificationMethod, ClassifiedStatistics,
        GroupStatistics, VolatilityCategory,
    },
    utils::{min_max, quantile},
};

/// Lower-inclusive bands: `[.., q1)` Small, `[q1, q2)` Medium, `[q2, ..]` Large.
pub fn category_for(value: f64, q1: f64, q2: f64) -> VolatilityCategory {
    if value < q1 {
        VolatilityCategory::Small
    } else if value < q2 {
        VolatilityCategory::Medium
    } else {
        VolatilityCategory::Large
    }
}

/// Supplied thresholds win; otherwise percentiles of `means` or the absolute defaults.
pub fn thresholds(
    means: &[f64],
    method: ClassificationMethod,
    supplied: Option<(f64, f64)>,
) -> Option<(f64, f64)> {
    if let Some(pair) = supplied {
        return Some(pair);
    }
    match method {
        ClassificationMethod::Percentile => Some((
            quantile(means, CATEGORY_PERCENTILES.0)?,
            quantile(means, CATEGORY_PERCENTILES.1)?,
        )),
        ClassificationMethod::Absolute => Some(DEFAULT_ABSOLUTE_THRESHOLDS),
    }
}

/// Classifies each group by its mean. Groups without a mean are left out;
/// `None` when nothing can be classified.
pub fn classify(
    stats: &[GroupStatistics],
    method: ClassificationMethod,
    supplied: Option<(f64, f64)>,
) -> Option<Classification> {
    let means: Vec<f64> = stats.iter().filter_map(|s| s.stats.mean).collect();
    if means.is_empty() {
        debug!("No group means to classify");
        return None;
    }
    let (q1, q2) = thresholds(&means, method, supplied)?;

    let rows: Vec<ClassifiedStatistics> = stats
        .iter()
        .filter_map(|s| {
            let mean = s.stats.mean?;
            Some(ClassifiedStatistics {
                statistics: s.clone(),
                category: category_for(mean, q1, q2),
            })
        })
        .collect();

    info!(
        method = ?method,
        q1,
        q2,
        groups = rows.len(),
        "Classified volatility groups"
    );

    Some(Classification {
        window_slot: None,
        method,
        q1,
        q2,
        rows,
    })
}

/// Classifies each window slot against its own distribution of means.
pub fn classify_per_slot(
    stats: &[GroupStatistics],
    method: ClassificationMethod,
    supplied: Option<(f64, f64)>,
) -> Vec<Classification> {
    let mut slots: BTreeMap<Option<String>, Vec<GroupStatistics>> = BTreeMap::new();
    for s in stats {
        slots.entry(s.key.window_slot.clone()).or_default().push(s.clone());
    }

    slots
        .into_iter()
        .filter_map(|(slot, group)| {
            let mut classification = classify(&group, method, supplied)?;
            classification.window_slot = slot;
            Some(classification)
        })
        .collect()
}

/// Mean/min/max/count of the group means within each category.
pub fn category_rollup(classification: &Classification) -> Vec<CategorySummary> {
    let mut by_category: BTreeMap<VolatilityCategory, Vec<f64>> = BTreeMap::new();
    for row in &classification.rows {
        if let Some(mean) = row.statistics.stats.mean {
            by_category.entry(row.category).or_default().push(mean);
        }
    }

    by_category
        .into_iter()
        .filter_map(|(category, means)| {
            let (min, max) = min_max(&means)?;
            Some(CategorySummary {
                category,
                mean: means.iter().sum::<f64>() / means.len() as f64,
                min,
                max,
                count: means.len(),
            })
        })
        .collect()
}
