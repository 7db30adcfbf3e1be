//! Small synchronization and threading helpers shared by the simulation actors.
//!
//! - A one-way stop flag for cooperative shutdown
//! - A monotonic event counter for statistics
//! - Named thread spawning and joining

pub mod atomic;
pub mod thread;

pub use atomic::{EventCounter, StopFlag};
pub use thread::{join_all, spawn_named};
