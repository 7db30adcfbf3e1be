//! Hive simulation entry point.
//!
//! Runs the simulation with its default configuration for the configured
//! duration, then shuts every thread down and exits.

use anyhow::{Context, Result};
use hive_concurrency::{logging, HiveConfig, LogSink, Simulation};
use log::info;

fn main() -> Result<()> {
    let config = HiveConfig::default();
    logging::init(LogSink::stdout(config.level_filter()?)).context("installing log sink")?;

    info!(
        "Running hive with {} workers for {}ms",
        config.workers, config.run_duration_ms
    );

    let simulation = Simulation::new(config).context("building simulation")?;
    let report = simulation.run().context("running simulation")?;

    info!(
        "Hive shut down cleanly: {} workers home, final yield {}",
        report.hive.pool_size, report.hive.yield_count
    );
    log::logger().flush();
    Ok(())
}
