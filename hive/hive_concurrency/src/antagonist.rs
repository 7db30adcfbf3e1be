//! The antagonist ("Winnie").
//!
//! Parks on the coordinator's yield wait until the counter reaches the
//! trigger, then tries to exploit the pool. A failed attempt costs a fixed
//! penalty before the next try.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use log::{debug, info};

use crate::error::Result;
use crate::pool::{ExploitOutcome, PoolCoordinator};
use crate::sync::{spawn_named, EventCounter, StopFlag};

/// Statistics about exploit attempts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AntagonistStats {
    /// Exploits attempted
    pub attempts: usize,

    /// Exploits that emptied the yield counter
    pub successes: usize,

    /// Exploits that were repelled
    pub failures: usize,

    /// Sum of the yield taken by successful exploits
    pub yield_taken: usize,
}

/// Thread that races the yield counter against the pool's defences
pub struct Antagonist {
    coordinator: Arc<PoolCoordinator>,
    stop: StopFlag,
    penalty: Duration,
    attempts: EventCounter,
    successes: EventCounter,
    failures: EventCounter,
    yield_taken: EventCounter,
}

impl Antagonist {
    /// Create an antagonist preying on `coordinator`.
    pub fn new(coordinator: Arc<PoolCoordinator>) -> Self {
        let penalty = coordinator.config().penalty();
        Self {
            coordinator,
            stop: StopFlag::new(),
            penalty,
            attempts: EventCounter::new(),
            successes: EventCounter::new(),
            failures: EventCounter::new(),
            yield_taken: EventCounter::new(),
        }
    }

    /// Spawn the antagonist thread.
    pub fn start(self: &Arc<Self>) -> Result<JoinHandle<()>> {
        let name = format!("{}-antagonist", self.coordinator.config().thread_name_prefix);
        let antagonist = Arc::clone(self);
        spawn_named(name, move || antagonist.run())
    }

    /// Antagonist thread main loop.
    pub fn run(&self) {
        debug!("Antagonist: starting");

        while let Some(outcome) = self.coordinator.await_exploit(&self.stop) {
            self.attempts.increment();

            match outcome {
                ExploitOutcome::Success { taken, pool_size } => {
                    self.successes.increment();
                    self.yield_taken.add(taken);
                    info!(
                        "Exploit succeeded: took {} yield from a pool of {}",
                        taken, pool_size
                    );
                }
                ExploitOutcome::Failure {
                    pool_size,
                    yield_count,
                } => {
                    self.failures.increment();
                    info!(
                        "Exploit failed against a pool of {} (yield {}), recovering for {}ms",
                        pool_size,
                        yield_count,
                        self.penalty.as_millis()
                    );
                    if self.coordinator.penalty_pause(self.penalty, &self.stop) {
                        break;
                    }
                }
            }
        }

        info!("Antagonist shutting down");
    }

    /// Ask the run loop to exit.
    pub fn stop(&self) {
        if self.stop.raise() {
            self.coordinator.wake_yield_waiters();
        }
    }

    /// Whether `stop` has been called.
    pub fn is_stopped(&self) -> bool {
        self.stop.is_raised()
    }

    /// Attempt counts so far.
    pub fn stats(&self) -> AntagonistStats {
        AntagonistStats {
            attempts: self.attempts.get(),
            successes: self.successes.get(),
            failures: self.failures.get(),
            yield_taken: self.yield_taken.get(),
        }
    }
}
