//! Lock-free flags and counters.
//!
//! Neither type is used to guard shared state: anything that must be
//! consistent with the pool lives under the coordinator lock.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// A flag that, once raised, stays raised.
///
/// Waiters that park on a condition variable must still be woken after the
/// flag is raised, under the lock their predicate is checked with.
#[derive(Debug, Default)]
pub struct StopFlag {
    flag: AtomicBool,
}

impl StopFlag {
    /// Create a lowered flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag.
    ///
    /// Returns true if this call raised it, false if it was already raised.
    pub fn raise(&self) -> bool {
        !self.flag.swap(true, Ordering::SeqCst)
    }

    /// Check whether the flag has been raised.
    pub fn is_raised(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// A counter of events that only ever grows.
#[derive(Debug, Default)]
pub struct EventCounter {
    value: AtomicUsize,
}

impl EventCounter {
    /// Create a counter starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one event and return the new total.
    pub fn increment(&self) -> usize {
        self.add(1)
    }

    /// Record `n` events and return the new total.
    pub fn add(&self, n: usize) -> usize {
        self.value.fetch_add(n, Ordering::Relaxed) + n
    }

    /// Current total.
    pub fn get(&self) -> usize {
        self.value.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_stop_flag() {
        let flag = StopFlag::new();

        assert!(!flag.is_raised());
        assert!(flag.raise());
        assert!(flag.is_raised());
        assert!(!flag.raise()); // Already raised
        assert!(flag.is_raised());
    }

    #[test]
    fn test_stop_flag_threads() {
        let flag = Arc::new(StopFlag::new());
        let winners = Arc::new(EventCounter::new());

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let flag = Arc::clone(&flag);
                let winners = Arc::clone(&winners);
                thread::spawn(move || {
                    if flag.raise() {
                        winners.increment();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        // Only one thread raises the flag
        assert_eq!(winners.get(), 1);
    }

    #[test]
    fn test_event_counter_threads() {
        let counter = Arc::new(EventCounter::new());
        let threads = 10;
        let increments_per_thread = 1000;

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let counter = Arc::clone(&counter);
                thread::spawn(move || {
                    for _ in 0..increments_per_thread {
                        counter.increment();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(counter.get(), threads * increments_per_thread);
        assert_eq!(counter.add(5), threads * increments_per_thread + 5);
    }
}
