//! Display and printing utilities

use std::path::Path;
use tracing::{info, warn};
use crate::{
    config::Config,
    pipeline::RunSummary,
    storage::LoadSummary,
};

pub fn print_configuration(config: &Config) {
    info!("📋 Configuration:");
    info!("   Pivot files: {}", config.pivot_files.len());
    info!(
        "   Events file: {}",
        config
            .events_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<none>".to_string())
    );
    info!("   Local offset: UTC{:+}", config.local_utc_offset_hours);
    info!("   Pre window: {} min", config.pre_window_minutes);
    info!("   Post windows: {:?} min", config.sorted_post_windows());
    info!("   Reference scale: {} min", config.reference_scale_minutes);
    info!("   Min samples: {}", config.min_samples);
    info!("   Classification: {:?}", config.classification_method);
    info!("   Outliers: {:?} (threshold {})", config.outlier_method, config.outlier_threshold);
}

pub fn print_load_summary(kind: &str, summary: &LoadSummary) {
    info!(
        "📥 Loaded {}: {} rows from {} file(s), {} dropped",
        kind, summary.rows_read, summary.files_read, summary.rows_dropped
    );
    for path in &summary.skipped_files {
        warn!("   Skipped unreadable file {}", path.display());
    }
    if !summary.row_errors.is_empty() {
        warn!("   {} malformed row(s); first: {}", summary.row_errors.len(), summary.row_errors[0].message);
    }
}

pub fn print_run_summary(summary: &RunSummary, output_dir: &Path) {
    info!("\n📊 Run Summary ({})", summary.run_id);
    info!("   📈 INPUT:");
    info!("     Pivots: {}", summary.pivot_count);
    info!("     Pivot days: {}", summary.pivot_days);
    info!("     Events analysed: {}", summary.events_analysed);

    info!("   🎯 EVENT WINDOWS:");
    info!(
        "     Valid pre windows: {} ({:.1}%)",
        summary.valid_pre_windows,
        percent(summary.valid_pre_windows, summary.events_analysed)
    );
    for (minutes, count) in &summary.valid_post_windows {
        info!(
            "     Valid post {}min: {} ({:.1}%)",
            minutes,
            count,
            percent(*count, summary.events_analysed)
        );
    }
    info!("     Valid ratios: {}", summary.valid_ratios);
    info!("     Events on pivot days: {}", summary.matched_event_days);

    info!("   🏷️  CATEGORIES:");
    for (minutes, counts) in &summary.category_counts {
        let parts: Vec<String> = counts.iter().map(|(c, n)| format!("{}={}", c, n)).collect();
        info!("     post {}min: {}", minutes, if parts.is_empty() { "-".to_string() } else { parts.join(", ") });
    }

    if !summary.top_indicators.is_empty() {
        info!("   🔥 MOST VOLATILE INDICATORS:");
        for (rank, top) in summary.top_indicators.iter().enumerate() {
            info!(
                "     {:>2}. {} {} | mean {:.5} over {}min (n={})",
                rank + 1,
                top.currency,
                top.event_name,
                top.mean_movement,
                top.window_minutes,
                top.sample_count
            );
        }
    }

    info!("   💾 Outputs: {}", output_dir.display());
    info!("");
}

fn percent(part: usize, total: usize) -> f64 {
    if total > 0 {
        part as f64 / total as f64 * 100.0
    } else {
        0.0
    }
}
