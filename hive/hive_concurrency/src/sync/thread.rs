//! Named thread spawning.

use std::thread::{self, JoinHandle};

use log::trace;

use crate::error::{HiveError, Result};

/// Spawn a named thread, mapping an OS refusal into [`HiveError::Spawn`].
pub fn spawn_named<F>(name: String, f: F) -> Result<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    trace!("Spawning thread {}", name);
    thread::Builder::new()
        .name(name.clone())
        .spawn(f)
        .map_err(|source| HiveError::Spawn { name, source })
}

/// Join every handle, logging threads that panicked.
///
/// Returns the number of threads that panicked.
pub fn join_all(handles: impl IntoIterator<Item = JoinHandle<()>>) -> usize {
    let mut panicked = 0;
    for handle in handles {
        let name = handle.thread().name().unwrap_or("unnamed").to_string();
        if let Err(e) = handle.join() {
            panicked += 1;
            log::error!(
                "Thread {} panicked: {:?}",
                name,
                e.downcast_ref::<&str>().unwrap_or(&"<unknown panic>")
            );
        }
    }
    panicked
}
