//! The worker pool: workers, the bounded yield counter and the coordinator
//! that releases and reabsorbs workers.

pub mod coordinator;
pub mod counter;
pub mod worker;

pub use coordinator::{ExploitOutcome, HiveStats, PoolCoordinator};
pub use counter::YieldCounter;
pub use worker::{Worker, WorkerHome, WorkerId, WorkerState};
