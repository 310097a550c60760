//! Batch pipeline wiring the analysis stages together

use serde::Serialize;
use tracing::{info, warn};
use crate::{
    analysis::AsymmetricEventAnalyzer,
    config::Config,
    errors::AnalysisResult,
    statistics::{
        category_rollup, classify, classify_per_slot, detect_outliers, distribution,
        group_statistics, own_segment_statistics, retain_min_samples, slot_statistics,
    },
    types::{
        CategorySummary, Classification, CorrelationMatrix, DailyVolatility, EventAnalysis, EventDayVolatility,
        GroupKey, GroupStatistics, GrowthPattern, HorizonSummary, IndicatorEvent, OutlierRecord,
        Pivot, PropagationEffect, ScaleObservation, ScaleRatioRow, ScalingProperty,
        WindowStatistics,
    },
    volatility::{observed_horizons, FixedWindowVolatilityCalculator, MultiscaleAnalyzer},
    windows::PivotSeries,
};
use super::RunSummary;

/// Every table one run produces.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutputs {
    pub post_windows: Vec<u32>,
    pub events: Vec<EventAnalysis>,
    pub daily_volatility: Vec<DailyVolatility>,
    pub event_days: Vec<EventDayVolatility>,
    pub slot_statistics: Vec<GroupStatistics>,
    pub slot_classifications: Vec<Classification>,
    pub own_segment_statistics: Vec<GroupStatistics>,
    pub own_segment_classification: Option<Classification>,
    pub own_segment_rollup: Vec<CategorySummary>,
    pub window_statistics: Vec<WindowStatistics>,
    pub scale_ratios: Vec<ScaleRatioRow>,
    pub correlations: CorrelationMatrix,
    pub propagation: Vec<PropagationEffect>,
    pub scaling: Vec<ScalingProperty>,
    pub horizons: Vec<HorizonSummary>,
    pub growth: Vec<GrowthPattern>,
    pub summary: RunSummary,
}

/// Stateless stage runner; each stage reads only its inputs and the config.
pub struct AnalysisPipeline<'a> {
    config: &'a Config,
}

impl<'a> AnalysisPipeline<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    pub fn run(&self, run_id: &str, pivots: Vec<Pivot>, events: &[IndicatorEvent]) -> AnalysisResult<AnalysisOutputs> {
        self.config.validate()?;
        let analyzer = AsymmetricEventAnalyzer::from_config(self.config);
        let post_windows = analyzer.post_window_minutes().to_vec();
        let series = PivotSeries::new(pivots);

        info!(
            run_id,
            pivots = series.len(),
            first_pivot = ?series.first_time(),
            last_pivot = ?series.last_time(),
            events = events.len(),
            "🚀 Starting analysis pipeline"
        );
        if series.is_empty() || events.is_empty() {
            warn!("Empty pivot or event table; outputs will be empty");
        }

        // Event-relative windows
        let analyses = analyzer.analyze_batch(events, &series);

        // Fixed day segments
        let fixed = FixedWindowVolatilityCalculator::from_config(self.config)?;
        let daily_volatility = fixed.daily_volatility(series.as_slice());
        let event_days = fixed.join_events(events, &daily_volatility);
        let slot_statistics = slot_statistics(&event_days, self.config.single_sample_policy);
        let slot_classifications = classify_per_slot(
            &retain_min_samples(&slot_statistics, self.config.min_samples),
            self.config.classification_method,
            self.config.category_thresholds,
        );

        // Each event's own announcement segment
        let own_segment_statistics = own_segment_statistics(&event_days, self.config.min_samples);
        let own_segment_classification = classify(
            &own_segment_statistics,
            self.config.classification_method,
            self.config.category_thresholds,
        );
        let own_segment_rollup = own_segment_classification
            .as_ref()
            .map(category_rollup)
            .unwrap_or_default();

        let window_statistics: Vec<WindowStatistics> = post_windows
            .iter()
            .map(|&w| self.window_statistics(&analyses, w))
            .collect();

        // Cross-horizon relationships
        let observations: Vec<ScaleObservation> = analyses.iter().map(ScaleObservation::from).collect();
        let multiscale = MultiscaleAnalyzer::from_config(self.config);
        info!(
            observations = observations.len(),
            observed_horizons = ?observed_horizons(&observations),
            reference = multiscale.reference_minutes(),
            "Running multiscale analysis"
        );
        let scale_ratios = multiscale.scale_ratios(&observations);
        let correlations = multiscale.scale_correlations(&observations);
        let propagation = multiscale.propagation_effects(&observations);
        let scaling = multiscale.scaling_properties(&observations);
        let horizons = multiscale.compare_horizons(&observations);
        let growth = multiscale.growth_patterns(&observations);

        let summary = RunSummary::build(
            run_id,
            series.len(),
            &analyses,
            &window_statistics,
            daily_volatility.len(),
            event_days.iter().filter(|d| d.matched_day).count(),
        );

        info!(run_id, "✅ Analysis pipeline complete");

        Ok(AnalysisOutputs {
            post_windows,
            events: analyses,
            daily_volatility,
            event_days,
            slot_statistics,
            slot_classifications,
            own_segment_statistics,
            own_segment_classification,
            own_segment_rollup,
            window_statistics,
            scale_ratios,
            correlations,
            propagation,
            scaling,
            horizons,
            growth,
            summary,
        })
    }

    fn window_statistics(&self, analyses: &[EventAnalysis], window_minutes: u32) -> WindowStatistics {
        let slot = WindowStatistics::slot_label(window_minutes);
        let statistics = group_statistics(
            analyses,
            |a| GroupKey::new(&a.event.currency, &a.event.event_name, Some(slot.clone())),
            |a| a.post.valid_movement(window_minutes),
            self.config.min_samples,
        );
        let classification = classify(
            &statistics,
            self.config.classification_method,
            self.config.category_thresholds,
        );
        let rollup = classification.as_ref().map(category_rollup).unwrap_or_default();

        let movements: Vec<Option<f64>> = analyses
            .iter()
            .map(|a| a.post.valid_movement(window_minutes))
            .collect();
        let valid: Vec<f64> = movements.iter().flatten().copied().collect();
        let flags = detect_outliers(&movements, self.config.outlier_method, self.config.outlier_threshold);
        let outliers = analyses
            .iter()
            .zip(movements.iter().zip(&flags))
            .filter_map(|(a, (movement, &flagged))| {
                let movement = movement.filter(|_| flagged)?;
                Some(OutlierRecord {
                    window_minutes,
                    method: self.config.outlier_method,
                    event_index: a.event_index,
                    currency: a.event.currency.clone(),
                    event_name: a.event.event_name.clone(),
                    movement,
                })
            })
            .collect();

        WindowStatistics {
            window_minutes,
            statistics,
            classification,
            rollup,
            distribution: distribution(&valid),
            outliers,
        }
    }
}
