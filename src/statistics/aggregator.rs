//! Grouped descriptive statistics

use std::collections::BTreeMap;
use tracing::{debug, info};
use crate::{
    types::{DescriptiveStats, EventDayVolatility, GroupKey, GroupStatistics, SingleSamplePolicy, DAY_SEGMENTS},
    utils::{mean, median, min_max, sample_std},
};

/// Mean/median/std/min/max of the values. `std` needs two values.
pub fn describe(values: &[f64]) -> DescriptiveStats {
    let Some((min, max)) = min_max(values) else {
        return DescriptiveStats::missing(0);
    };
    DescriptiveStats {
        mean: mean(values),
        median: median(values),
        std: sample_std(values),
        min: Some(min),
        max: Some(max),
        sample_count: values.len(),
    }
}

/// Like [`describe`], with the single-sample case governed by `policy`.
pub fn describe_with_policy(values: &[f64], policy: SingleSamplePolicy) -> DescriptiveStats {
    match (values, policy) {
        ([only], SingleSamplePolicy::ZeroStd) => DescriptiveStats {
            mean: Some(*only),
            median: Some(*only),
            std: Some(0.0),
            min: Some(*only),
            max: Some(*only),
            sample_count: 1,
        },
        ([_], SingleSamplePolicy::Missing) => DescriptiveStats::missing(1),
        _ => describe(values),
    }
}

fn collect_groups<T, K, V>(records: &[T], key: K, value: V) -> BTreeMap<GroupKey, Vec<f64>>
where
    K: Fn(&T) -> GroupKey,
    V: Fn(&T) -> Option<f64>,
{
    let mut groups: BTreeMap<GroupKey, Vec<f64>> = BTreeMap::new();
    for record in records {
        if let Some(v) = value(record).filter(|v| v.is_finite()) {
            groups.entry(key(record)).or_default().push(v);
        }
    }
    groups
}

/// Groups records by `key`, drops missing values and keeps groups with at
/// least `min_samples` values. Output is ordered by key.
pub fn group_statistics<T, K, V>(records: &[T], key: K, value: V, min_samples: usize) -> Vec<GroupStatistics>
where
    K: Fn(&T) -> GroupKey,
    V: Fn(&T) -> Option<f64>,
{
    let groups = collect_groups(records, key, value);
    let total = groups.len();

    let stats: Vec<GroupStatistics> = groups
        .into_iter()
        .filter(|(k, values)| {
            let keep = values.len() >= min_samples;
            if !keep {
                debug!(
                    currency = %k.currency,
                    event = %k.event_name,
                    samples = values.len(),
                    min_samples,
                    "Dropping group below minimum sample count"
                );
            }
            keep
        })
        .map(|(key, values)| GroupStatistics {
            key,
            stats: describe(&values),
        })
        .collect();

    info!(
        records = records.len(),
        groups = total,
        retained = stats.len(),
        "Computed group statistics"
    );
    stats
}

/// Sparse per (currency, event, segment) statistics of the joined day
/// volatility. Every combination with a joined event row appears, including
/// those whose segment volatility is missing on every matched day.
pub fn slot_statistics(joined: &[EventDayVolatility], policy: SingleSamplePolicy) -> Vec<GroupStatistics> {
    let mut groups: BTreeMap<GroupKey, Vec<f64>> = BTreeMap::new();

    for row in joined {
        for segment in DAY_SEGMENTS {
            let values = groups
                .entry(GroupKey::new(
                    &row.event.currency,
                    &row.event.event_name,
                    Some(segment.label()),
                ))
                .or_default();
            if let Some(v) = row.volatility(segment) {
                values.push(v);
            }
        }
    }

    groups
        .into_iter()
        .map(|(key, values)| GroupStatistics {
            key,
            stats: describe_with_policy(&values, policy),
        })
        .collect()
}

/// Per (currency, event, own segment) statistics of the volatility of the
/// segment each announcement fell in. Unmatched days contribute nothing.
pub fn own_segment_statistics(joined: &[EventDayVolatility], min_samples: usize) -> Vec<GroupStatistics> {
    group_statistics(
        joined,
        |row| GroupKey::new(&row.event.currency, &row.event.event_name, Some(row.segment.label())),
        |row| row.own_segment_volatility,
        min_samples,
    )
}

pub fn retain_min_samples(stats: &[GroupStatistics], min_samples: usize) -> Vec<GroupStatistics> {
    stats
        .iter()
        .filter(|s| s.stats.sample_count >= min_samples)
        .cloned()
        .collect()
}
