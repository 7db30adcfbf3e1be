//! Workers ("bees") released from the pool to perform a timed hunt.
//!
//! Each worker owns a private lock and condition variable. Its state only
//! changes while that lock is held, and its run loop re-checks the wait
//! predicate after every wake.

use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, trace, warn};
use parking_lot::{Condvar, Mutex};

/// Identifier of a worker within its pool
pub type WorkerId = usize;

/// Operational state of a worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Waiting in (or on its way back to) the pool
    Idle,

    /// Released and hunting
    Active,

    /// Run loop has exited
    Stopped,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Active => write!(f, "active"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Where a worker reports back after a hunt.
pub trait WorkerHome: Send + Sync {
    /// Take the worker back into the pool.
    fn return_worker(&self, worker: &Arc<Worker>);
}

/// State guarded by the worker's own lock
#[derive(Debug)]
struct WorkerInner {
    state: WorkerState,
    pending: Duration,
    stop_requested: bool,
}

/// A single pool member
#[derive(Debug)]
pub struct Worker {
    id: WorkerId,
    inner: Mutex<WorkerInner>,
    wake: Condvar,
}

impl Worker {
    /// Create an idle worker.
    pub fn new(id: WorkerId) -> Self {
        Self {
            id,
            inner: Mutex::new(WorkerInner {
                state: WorkerState::Idle,
                pending: Duration::ZERO,
                stop_requested: false,
            }),
            wake: Condvar::new(),
        }
    }

    /// The worker's identifier.
    pub fn id(&self) -> WorkerId {
        self.id
    }

    /// The worker's current state.
    pub fn state(&self) -> WorkerState {
        self.inner.lock().state
    }

    /// Send the worker on a hunt lasting `duration`.
    ///
    /// The caller must have taken the worker out of the pool. Returns false,
    /// leaving the worker untouched, if it is not idle or is shutting down.
    pub fn activate(&self, duration: Duration) -> bool {
        let mut inner = self.inner.lock();
        if inner.state != WorkerState::Idle || inner.stop_requested {
            warn!(
                "Worker {}: refusing activation while {} (stop requested: {})",
                self.id, inner.state, inner.stop_requested
            );
            return false;
        }

        inner.pending = duration;
        inner.state = WorkerState::Active;
        drop(inner);

        self.wake.notify_all();
        true
    }

    /// Ask the run loop to exit at its next wait.
    pub fn stop(&self) {
        let mut inner = self.inner.lock();
        inner.stop_requested = true;
        drop(inner);

        self.wake.notify_all();
    }

    /// Worker thread main loop.
    ///
    /// A hunt already under way is finished and reported before the stop
    /// request is honoured. A hunt that was assigned but not yet begun when
    /// the stop arrived is abandoned, and the worker reports back at once.
    pub fn run<H: WorkerHome + ?Sized>(self: &Arc<Self>, home: &H) {
        debug!("Worker {}: starting", self.id);

        loop {
            let hunt = {
                let mut inner = self.inner.lock();
                self.wake.wait_while(&mut inner, |inner| {
                    inner.state == WorkerState::Idle && !inner.stop_requested
                });

                match (inner.state, inner.stop_requested) {
                    (WorkerState::Active, false) => Some(inner.pending),
                    (WorkerState::Active, true) => {
                        debug!("Worker {}: hunt abandoned for shutdown", self.id);
                        inner.state = WorkerState::Idle;
                        None
                    }
                    _ => {
                        inner.state = WorkerState::Stopped;
                        break;
                    }
                }
            };

            if let Some(duration) = hunt {
                trace!("Worker {}: hunting for {}ms", self.id, duration.as_millis());
                thread::sleep(duration);
                self.inner.lock().state = WorkerState::Idle;
            }

            home.return_worker(self);
        }

        debug!("Worker {}: shutting down", self.id);
    }
}
