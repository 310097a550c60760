//! Indicator Volatility - Main Entry Point
//!
//! Batch run: load pivots and indicator events, analyse, write one run directory.

use indicator_volatility::*;
use anyhow::Result;
use std::time::Instant;
use tracing::{error, info, warn};

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let config = CONFIG.clone();

    // Initialize logging
    utils::setup_output_directories(&config.output_dir)?;
    let _logging_guard = utils::setup_logging(&config.output_dir)?;

    info!("📈 Indicator Volatility v{}", env!("CARGO_PKG_VERSION"));
    utils::print_configuration(&config);

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(e.into());
    }

    let started = Instant::now();

    // Inputs
    let pivot_load = storage::load_pivot_files(&config.pivot_files, config.pivot_delimiter);
    utils::print_load_summary("pivots", &pivot_load.summary);

    let event_load = match &config.events_file {
        Some(path) => match storage::load_events(path) {
            Ok(load) => load,
            Err(e) => {
                warn!("Could not load events from {}: {}", path.display(), e);
                storage::EventLoad::default()
            }
        },
        None => {
            warn!("EVENTS_FILE not set; running without indicator events");
            storage::EventLoad::default()
        }
    };
    utils::print_load_summary("events", &event_load.summary);

    if pivot_load.pivots.is_empty() && event_load.events.is_empty() {
        return Err(anyhow::anyhow!("No pivots or events loaded; nothing to analyse"));
    }

    // Analysis
    let run_id = storage::new_run_id();
    let writer = storage::OutputWriter::create(&config.output_dir, &run_id, config.output_decimals)?;
    let outputs = pipeline::AnalysisPipeline::new(&config).run(&run_id, pivot_load.pivots, &event_load.events)?;

    let written = writer.write_outputs(&outputs)?;
    info!(files = written.len(), elapsed = ?started.elapsed(), "💾 Outputs written");

    utils::print_run_summary(&outputs.summary, writer.dir());

    Ok(())
}
