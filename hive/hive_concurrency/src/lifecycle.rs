//! Application lifecycle: start every thread, run, stop, join.

use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{info, warn};

use crate::antagonist::{Antagonist, AntagonistStats};
use crate::config::HiveConfig;
use crate::error::{HiveError, Result};
use crate::pool::{HiveStats, PoolCoordinator};
use crate::sync::join_all;

/// Final state of a simulation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationReport {
    /// Hive counters at the end of the run
    pub hive: HiveStats,

    /// Antagonist counters at the end of the run
    pub antagonist: AntagonistStats,

    /// Wall-clock time between start and the last join
    pub elapsed: Duration,
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} releases, {} returns, final yield {}; {} exploits ({} succeeded, {} yield taken) in {:.1}s",
            self.hive.releases,
            self.hive.returns,
            self.hive.yield_count,
            self.antagonist.attempts,
            self.antagonist.successes,
            self.antagonist.yield_taken,
            self.elapsed.as_secs_f64()
        )
    }
}

/// Owns the hive and the antagonist and drives their threads
pub struct Simulation {
    coordinator: Arc<PoolCoordinator>,
    antagonist: Arc<Antagonist>,
    handles: Vec<JoinHandle<()>>,
    started_at: Option<Instant>,
    ended: bool,
}

impl Simulation {
    /// Build a simulation; no threads run until [`Simulation::start`].
    pub fn new(config: HiveConfig) -> Result<Self> {
        let coordinator = Arc::new(PoolCoordinator::new(config)?);
        let antagonist = Arc::new(Antagonist::new(Arc::clone(&coordinator)));

        Ok(Self {
            coordinator,
            antagonist,
            handles: Vec::new(),
            started_at: None,
            ended: false,
        })
    }

    /// Start the worker, scheduler and antagonist threads.
    pub fn start(&mut self) -> Result<()> {
        if self.started_at.is_some() {
            return Err(HiveError::AlreadyStarted);
        }
        self.started_at = Some(Instant::now());

        self.handles = self.coordinator.start()?;
        match self.antagonist.start() {
            Ok(handle) => self.handles.push(handle),
            Err(e) => {
                self.end();
                self.join();
                return Err(e);
            }
        }

        info!(
            "Simulation started: {} workers, antagonist triggers at yield {}",
            self.coordinator.workers().len(),
            self.coordinator.config().exploit_trigger
        );
        Ok(())
    }

    /// Stop every actor. Safe to call more than once.
    pub fn end(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;

        info!("Simulation ending");
        self.coordinator.stop();
        self.antagonist.stop();
    }

    /// Join every thread started so far.
    ///
    /// Returns the number of threads that panicked.
    pub fn join(&mut self) -> usize {
        let panicked = join_all(self.handles.drain(..));
        if panicked > 0 {
            warn!("{} simulation threads panicked", panicked);
        }
        panicked
    }

    /// Start, let the hive work for the configured duration, then stop and
    /// join everything.
    pub fn run(mut self) -> Result<SimulationReport> {
        self.start()?;
        thread::sleep(self.coordinator.config().run_duration());
        self.end();
        self.join();

        let report = self.report();
        info!("Simulation finished: {}", report);
        Ok(report)
    }

    /// Snapshot of both actors' counters.
    pub fn report(&self) -> SimulationReport {
        SimulationReport {
            hive: self.coordinator.stats(),
            antagonist: self.antagonist.stats(),
            elapsed: self
                .started_at
                .map(|t| t.elapsed())
                .unwrap_or_default(),
        }
    }

    /// Snapshot of the hive.
    pub fn stats(&self) -> HiveStats {
        self.coordinator.stats()
    }

    /// The hive driven by this simulation.
    pub fn coordinator(&self) -> &Arc<PoolCoordinator> {
        &self.coordinator
    }

    /// The antagonist driven by this simulation.
    pub fn antagonist(&self) -> &Arc<Antagonist> {
        &self.antagonist
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        self.end();
        self.join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DurationRange;

    fn quick_config() -> HiveConfig {
        HiveConfig {
            workers: 4,
            hunt_ms: DurationRange::new(20, 40),
            release_interval_ms: DurationRange::new(2, 5),
            penalty_ms: 100,
            run_duration_ms: 300,
            seed: Some(11),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let result = Simulation::new(HiveConfig {
            workers: 0,
            ..Default::default()
        });
        assert!(matches!(result, Err(HiveError::InvalidConfig(_))));
    }

    #[test]
    fn test_start_twice_rejected() {
        let mut sim = Simulation::new(quick_config()).unwrap();
        sim.start().unwrap();
        assert!(matches!(sim.start(), Err(HiveError::AlreadyStarted)));

        sim.end();
        assert_eq!(sim.join(), 0);
    }

    #[test]
    fn test_end_and_join_are_idempotent() {
        let mut sim = Simulation::new(quick_config()).unwrap();
        sim.start().unwrap();
        thread::sleep(Duration::from_millis(50));

        sim.end();
        sim.end();
        assert_eq!(sim.join(), 0);
        assert_eq!(sim.join(), 0);

        let stats = sim.stats();
        assert_eq!(stats.active_workers, 0);
        assert_eq!(stats.pool_size, 4);
    }

    #[test]
    fn test_drop_without_start() {
        let sim = Simulation::new(quick_config()).unwrap();
        drop(sim);
    }

    #[test]
    fn test_run_reports_activity() {
        let sim = Simulation::new(quick_config()).unwrap();
        let report = sim.run().unwrap();

        assert!(report.hive.releases > 0);
        assert_eq!(report.hive.releases, report.hive.returns);
        assert_eq!(report.hive.pool_size, 4);
        assert!(report.hive.yield_count <= 30);
        assert_eq!(
            report.antagonist.attempts,
            report.antagonist.successes + report.antagonist.failures
        );
        assert!(report.elapsed >= Duration::from_millis(300));
        assert!(report.to_string().contains("releases"));
    }
}
