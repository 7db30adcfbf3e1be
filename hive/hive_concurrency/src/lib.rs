#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

//! # Hive Concurrency
//!
//! A bounded worker pool under producer/consumer pressure, raced by an
//! antagonist thread.
//!
//! This crate provides:
//!
//! - Workers ("bees") that hunt for a timed duration and report back
//! - A pool coordinator ("hive") that releases workers and collects a capped yield
//! - An antagonist that exploits the pool when it is nearly empty
//! - A lifecycle controller that starts, stops and joins every thread
//!
//! ## Threads and locks
//!
//! A running simulation has one thread per worker, one scheduler and one
//! antagonist. The pool queue and the yield counter sit behind a single
//! coordinator lock; each worker's state sits behind that worker's own lock.
//! No lock is held while a thread sleeps.

/// The antagonist thread and its statistics
pub mod antagonist;

/// Construction-time configuration
pub mod config;

/// Error types
pub mod error;

/// Start/stop orchestration of the whole simulation
pub mod lifecycle;

/// Serialized line-oriented log sink
pub mod logging;

/// Workers, the yield counter and the pool coordinator
pub mod pool;

/// Stop flags, event counters and thread helpers
pub mod sync;

// Re-export key types for easier access
pub use antagonist::{Antagonist, AntagonistStats};
pub use config::{DurationRange, HiveConfig};
pub use error::{HiveError, Result};
pub use lifecycle::{Simulation, SimulationReport};
pub use logging::LogSink;
pub use pool::{ExploitOutcome, HiveStats, PoolCoordinator, Worker, WorkerState};
