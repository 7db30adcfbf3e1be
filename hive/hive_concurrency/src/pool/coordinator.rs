//! The pool coordinator ("hive").
//!
//! One lock guards the idle-worker queue, the yield counter and the stop flag.
//! Every read of the pool, including its size, goes through that lock, and a
//! worker return pushes the worker and bumps the counter in one critical
//! section. Two condition variables hang off the same lock:
//!
//! - `pool_ready` parks the scheduler until more than one worker is idle
//! - `yield_ready` parks the antagonist until the counter reaches its trigger

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use log::{debug, info, warn};
use parking_lot::{Condvar, Mutex};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::counter::YieldCounter;
use super::worker::{Worker, WorkerHome, WorkerId};
use crate::config::{DurationRange, HiveConfig};
use crate::error::{HiveError, Result};
use crate::sync::{join_all, spawn_named, StopFlag};

/// Result of an exploit attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExploitOutcome {
    /// The pool was below the threshold and the yield was taken
    Success {
        /// Yield counter value before the reset
        taken: usize,

        /// Pool size observed during the attempt
        pool_size: usize,
    },

    /// The pool was too well defended; nothing changed
    Failure {
        /// Pool size observed during the attempt
        pool_size: usize,

        /// Yield counter value left in place
        yield_count: usize,
    },
}

impl ExploitOutcome {
    /// Whether the exploit succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// A consistent snapshot of the hive, taken under the pool lock
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HiveStats {
    /// Number of workers owned by the hive
    pub total_workers: usize,

    /// Workers currently idle in the pool
    pub pool_size: usize,

    /// Workers taken out of the pool and not yet returned
    pub active_workers: usize,

    /// Current yield counter value
    pub yield_count: usize,

    /// Workers released since construction
    pub releases: usize,

    /// Workers returned since construction
    pub returns: usize,
}

/// Everything guarded by the pool lock
#[derive(Debug)]
struct HiveState {
    pool: VecDeque<Arc<Worker>>,
    yield_counter: YieldCounter,
    active: usize,
    releases: usize,
    returns: usize,
    started: bool,
    stopped: bool,
}

/// Owns the workers, the idle pool, the yield counter and the scheduler
pub struct PoolCoordinator {
    config: HiveConfig,
    workers: Vec<Arc<Worker>>,
    state: Mutex<HiveState>,
    pool_ready: Condvar,
    yield_ready: Condvar,
    rng: Mutex<StdRng>,
}

impl PoolCoordinator {
    /// Create a coordinator with `config.workers` idle workers, all in the pool.
    pub fn new(config: HiveConfig) -> Result<Self> {
        config.validate()?;

        let workers: Vec<_> = (0..config.workers)
            .map(|id| Arc::new(Worker::new(id)))
            .collect();
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        info!(
            "Creating hive with {} workers (yield cap {})",
            config.workers, config.yield_cap
        );

        Ok(Self {
            state: Mutex::new(HiveState {
                pool: workers.iter().cloned().collect(),
                yield_counter: YieldCounter::new(config.yield_cap),
                active: 0,
                releases: 0,
                returns: 0,
                started: false,
                stopped: false,
            }),
            workers,
            config,
            pool_ready: Condvar::new(),
            yield_ready: Condvar::new(),
            rng: Mutex::new(rng),
        })
    }

    /// Spawn one thread per worker plus the scheduler thread.
    ///
    /// On a spawn failure everything already spawned is stopped and joined.
    pub fn start(self: &Arc<Self>) -> Result<Vec<JoinHandle<()>>> {
        {
            let mut state = self.state.lock();
            if state.started {
                return Err(HiveError::AlreadyStarted);
            }
            state.started = true;
        }

        let prefix = &self.config.thread_name_prefix;
        let mut handles = Vec::with_capacity(self.workers.len() + 1);

        for worker in &self.workers {
            let name = format!("{}-worker-{}", prefix, worker.id());
            let coordinator = Arc::clone(self);
            let worker = Arc::clone(worker);
            match spawn_named(name, move || worker.run(coordinator.as_ref())) {
                Ok(handle) => handles.push(handle),
                Err(e) => return Err(self.abort_start(handles, e)),
            }
        }

        let coordinator = Arc::clone(self);
        match spawn_named(format!("{}-scheduler", prefix), move || {
            coordinator.run_scheduler()
        }) {
            Ok(handle) => handles.push(handle),
            Err(e) => return Err(self.abort_start(handles, e)),
        }

        info!("Hive started with {} worker threads", self.workers.len());
        Ok(handles)
    }

    fn abort_start(&self, handles: Vec<JoinHandle<()>>, error: HiveError) -> HiveError {
        warn!("Hive start failed: {}", error);
        self.stop();
        join_all(handles);
        error
    }

    /// Current number of idle workers in the pool.
    pub fn size(&self) -> usize {
        self.state.lock().pool.len()
    }

    /// Current yield counter value.
    pub fn yield_count(&self) -> usize {
        self.state.lock().yield_counter.get()
    }

    /// Release the front worker of the pool on a hunt.
    ///
    /// Returns the released worker's id, or `None` if the pool is empty.
    pub fn release_one(&self) -> Option<WorkerId> {
        let (worker, pool_size) = self.take_front()?;

        let duration = self.draw(&self.config.hunt_ms);
        if !worker.activate(duration) {
            // Only a stopping worker refuses; it will never report back itself.
            self.restore(&worker);
            return None;
        }

        info!(
            "Worker {} released for {}ms, pool size {}",
            worker.id(),
            duration.as_millis(),
            pool_size
        );
        Some(worker.id())
    }

    /// Pop the front worker and mark it active.
    fn take_front(&self) -> Option<(Arc<Worker>, usize)> {
        let mut state = self.state.lock();
        let worker = state.pool.pop_front()?;
        state.active += 1;
        state.releases += 1;
        Some((worker, state.pool.len()))
    }

    /// Put back a worker that was taken but never activated.
    fn restore(&self, worker: &Arc<Worker>) {
        {
            let mut state = self.state.lock();
            state.pool.push_back(Arc::clone(worker));
            state.active = state.active.saturating_sub(1);
            state.releases = state.releases.saturating_sub(1);
        }
        self.pool_ready.notify_all();
        debug!("Worker {} restored to the pool without hunting", worker.id());
    }

    /// Take a worker back into the pool and collect its yield.
    pub fn return_worker(&self, worker: &Arc<Worker>) {
        let (yield_count, yield_cap, full, pool_size) = {
            let mut state = self.state.lock();
            state.pool.push_back(Arc::clone(worker));
            state.active = state.active.saturating_sub(1);
            state.returns += 1;
            let yield_count = state.yield_counter.increment();
            (
                yield_count,
                state.yield_counter.cap(),
                state.yield_counter.is_full(),
                state.pool.len(),
            )
        };

        self.pool_ready.notify_all();
        self.yield_ready.notify_all();

        info!(
            "Worker {} returned, yield count {}/{}, pool size {}",
            worker.id(),
            yield_count,
            yield_cap,
            pool_size
        );
        if full {
            debug!("Yield counter is full; further returns are not counted");
        }
    }

    /// Attempt to exploit the pool right now.
    ///
    /// Succeeds, resetting the yield counter, only if fewer than
    /// `exploit_pool_threshold` workers are idle.
    pub fn try_exploit(&self) -> ExploitOutcome {
        let mut state = self.state.lock();
        self.exploit_locked(&mut state)
    }

    fn exploit_locked(&self, state: &mut HiveState) -> ExploitOutcome {
        let pool_size = state.pool.len();
        if pool_size < self.config.exploit_pool_threshold {
            ExploitOutcome::Success {
                taken: state.yield_counter.take(),
                pool_size,
            }
        } else {
            ExploitOutcome::Failure {
                pool_size,
                yield_count: state.yield_counter.get(),
            }
        }
    }

    /// Block until the yield counter reaches the trigger, then exploit.
    ///
    /// The wait and the attempt share one critical section. Returns `None` if
    /// the hive or `stop` is stopped first.
    pub fn await_exploit(&self, stop: &StopFlag) -> Option<ExploitOutcome> {
        let trigger = self.config.exploit_trigger;
        let mut state = self.state.lock();
        self.yield_ready.wait_while(&mut state, |s| {
            s.yield_counter.get() < trigger && !s.stopped && !stop.is_raised()
        });

        if state.stopped || stop.is_raised() {
            return None;
        }
        Some(self.exploit_locked(&mut state))
    }

    /// Sit out `duration` unless the hive or `stop` is stopped first.
    ///
    /// Returns true if the pause ended because of a stop.
    pub fn penalty_pause(&self, duration: Duration, stop: &StopFlag) -> bool {
        self.pause_on(&self.yield_ready, duration, Some(stop))
    }

    fn pause_on(&self, cvar: &Condvar, duration: Duration, stop: Option<&StopFlag>) -> bool {
        let halted = |s: &HiveState| s.stopped || stop.map_or(false, StopFlag::is_raised);

        let mut state = self.state.lock();
        if !halted(&*state) {
            cvar.wait_while_for(&mut state, |s| !halted(&*s), duration);
        }
        halted(&*state)
    }

    /// Wake everything parked on the yield wait.
    ///
    /// The lock is taken first so a waiter between its predicate check and
    /// parking cannot miss the wake.
    pub fn wake_yield_waiters(&self) {
        let _state = self.state.lock();
        self.yield_ready.notify_all();
    }

    /// Scheduler thread main loop.
    fn run_scheduler(&self) {
        debug!("Scheduler: starting");

        loop {
            {
                let mut state = self.state.lock();
                self.pool_ready
                    .wait_while(&mut state, |s| s.pool.len() <= 1 && !s.stopped);
                if state.stopped {
                    break;
                }
            }

            self.release_one();

            let interval = self.draw(&self.config.release_interval_ms);
            if self.pause_on(&self.pool_ready, interval, None) {
                break;
            }
        }

        info!("Scheduler shutting down");
    }

    /// Stop the scheduler and every worker.
    ///
    /// Workers mid-hunt finish and report back before exiting.
    pub fn stop(&self) {
        {
            let mut state = self.state.lock();
            if state.stopped {
                return;
            }
            state.stopped = true;
        }

        self.pool_ready.notify_all();
        self.yield_ready.notify_all();

        for worker in &self.workers {
            worker.stop();
        }

        info!("Hive shutting down");
    }

    /// Whether `stop` has been called.
    pub fn is_stopped(&self) -> bool {
        self.state.lock().stopped
    }

    /// Snapshot of the pool and counters.
    pub fn stats(&self) -> HiveStats {
        let state = self.state.lock();
        HiveStats {
            total_workers: self.workers.len(),
            pool_size: state.pool.len(),
            active_workers: state.active,
            yield_count: state.yield_counter.get(),
            releases: state.releases,
            returns: state.returns,
        }
    }

    /// All workers owned by the hive, in id order.
    pub fn workers(&self) -> &[Arc<Worker>] {
        &self.workers
    }

    /// The configuration the hive was built with.
    pub fn config(&self) -> &HiveConfig {
        &self.config
    }

    fn draw(&self, range: &DurationRange) -> Duration {
        range.sample(&mut *self.rng.lock())
    }

    #[cfg(test)]
    fn force_yield(&self, value: usize) {
        let mut state = self.state.lock();
        state.yield_counter.take();
        for _ in 0..value {
            state.yield_counter.increment();
        }
    }
}

impl WorkerHome for PoolCoordinator {
    fn return_worker(&self, worker: &Arc<Worker>) {
        PoolCoordinator::return_worker(self, worker);
    }
}
