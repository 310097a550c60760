//! Asymmetric pre/post announcement analysis

use rayon::prelude::*;
use tracing::{debug, info};
use crate::{
    config::{Config, LAST_MINUTE_WINDOW_MINUTES},
    types::{
        Direction, EventAnalysis, IndicatorEvent, PostEventResult, PostWindowResult,
        PreEventResult, RatioFailure, RatioResult, WindowRatio,
    },
    windows::{movement_metrics, post_window, pre_window, window_metrics, PivotSeries},
};

/// Points a window needs before its metrics count as valid.
pub const MIN_WINDOW_POINTS: usize = 2;

#[derive(Debug, Clone)]
pub struct AsymmetricEventAnalyzer {
    pre_window_minutes: u32,
    post_window_minutes: Vec<u32>,
    parallel: bool,
}

impl AsymmetricEventAnalyzer {
    pub fn new(pre_window_minutes: u32, post_window_minutes: &[u32]) -> Self {
        let mut post = post_window_minutes.to_vec();
        post.sort_unstable();
        post.dedup();
        Self {
            pre_window_minutes,
            post_window_minutes: post,
            parallel: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.pre_window_minutes, &config.post_window_minutes)
            .with_parallelism(config.parallel_events)
    }

    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn post_window_minutes(&self) -> &[u32] {
        &self.post_window_minutes
    }

    pub fn analyze_pre(&self, event: &IndicatorEvent, pivots: &PivotSeries) -> PreEventResult {
        let subset = pivots.extract(&pre_window(event.time, self.pre_window_minutes));
        let metrics = window_metrics(subset);
        let valid = subset.len() >= MIN_WINDOW_POINTS;

        let (last_minute_movement, last_minute_direction) = if valid {
            let last_minute = pivots.extract(&pre_window(event.time, LAST_MINUTE_WINDOW_MINUTES));
            if last_minute.len() >= MIN_WINDOW_POINTS {
                let m = movement_metrics(last_minute);
                (Some(m.movement), Some(m.direction))
            } else {
                (None, None)
            }
        } else {
            debug!(
                currency = %event.currency,
                event = %event.event_name,
                points = subset.len(),
                "Insufficient pivots before announcement"
            );
            (None, None)
        };

        PreEventResult {
            window_minutes: self.pre_window_minutes,
            valid,
            point_count: subset.len(),
            leg_count: subset.len().saturating_sub(1),
            metrics,
            last_minute_movement,
            last_minute_direction,
        }
    }

    /// Every post window is judged on its own points.
    pub fn analyze_post(&self, event: &IndicatorEvent, pivots: &PivotSeries) -> PostEventResult {
        let windows = self
            .post_window_minutes
            .iter()
            .map(|&minutes| {
                let subset = pivots.extract(&post_window(event.time, minutes));
                PostWindowResult {
                    window_minutes: minutes,
                    valid: subset.len() >= MIN_WINDOW_POINTS,
                    point_count: subset.len(),
                    leg_count: subset.len().saturating_sub(1),
                    metrics: window_metrics(subset),
                }
            })
            .collect();

        PostEventResult { windows }
    }

    pub fn ratios(&self, pre: &PreEventResult, post: &PostEventResult) -> RatioResult {
        compute_ratios(pre, post)
    }

    pub fn analyze(&self, event_index: usize, event: &IndicatorEvent, pivots: &PivotSeries) -> EventAnalysis {
        let pre = self.analyze_pre(event, pivots);
        let post = self.analyze_post(event, pivots);
        let ratios = compute_ratios(&pre, &post);

        EventAnalysis {
            event_index,
            event: event.clone(),
            pre,
            post,
            ratios,
        }
    }

    /// Analyses every event independently; output is in input order.
    pub fn analyze_batch(&self, events: &[IndicatorEvent], pivots: &PivotSeries) -> Vec<EventAnalysis> {
        info!(
            events = events.len(),
            pivots = pivots.len(),
            pre_window = self.pre_window_minutes,
            post_windows = ?self.post_window_minutes,
            parallel = self.parallel,
            "Running asymmetric event analysis"
        );

        let results: Vec<EventAnalysis> = if self.parallel {
            events
                .par_iter()
                .enumerate()
                .map(|(i, event)| self.analyze(i, event, pivots))
                .collect()
        } else {
            events
                .iter()
                .enumerate()
                .map(|(i, event)| self.analyze(i, event, pivots))
                .collect()
        };

        let valid_ratios = results.iter().filter(|r| r.ratios.valid).count();
        info!(
            analysed = results.len(),
            valid_ratios,
            "Asymmetric analysis complete"
        );
        results
    }
}

/// 1.0 for matching directions, 0.0 for opposite, 0.5 when either side is flat.
pub fn direction_consistency(pre: Direction, post: Direction) -> f64 {
    match (pre, post) {
        (Direction::Neutral, _) | (_, Direction::Neutral) => 0.5,
        (a, b) if a == b => 1.0,
        _ => 0.0,
    }
}

pub fn compute_ratios(pre: &PreEventResult, post: &PostEventResult) -> RatioResult {
    if !pre.valid {
        return RatioResult::failed(RatioFailure::PreEventInvalid);
    }
    if !post.any_valid() {
        return RatioResult::failed(RatioFailure::PostEventInvalid);
    }
    let pre_movement = pre.metrics.movement.movement;
    if pre_movement == 0.0 {
        return RatioResult::failed(RatioFailure::ZeroPreMovement);
    }
    let pre_direction = pre.metrics.movement.direction;

    let windows = post
        .windows
        .iter()
        .map(|w| {
            let ratio = w.valid.then(|| w.metrics.movement.movement / pre_movement);
            let post_direction = if w.valid {
                w.metrics.movement.direction
            } else {
                Direction::Neutral
            };
            WindowRatio {
                window_minutes: w.window_minutes,
                ratio,
                log_ratio: ratio.filter(|&r| r > 0.0).map(f64::ln),
                direction_consistency: direction_consistency(pre_direction, post_direction),
            }
        })
        .collect();

    RatioResult {
        valid: true,
        failure: None,
        windows,
    }
}
