//! The bounded yield counter.
//!
//! Deliberately not atomic: it lives inside the coordinator's locked state so
//! the bound check, the increment and the reset share the pool's critical
//! section.

/// A counter clamped to `[0, cap]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YieldCounter {
    value: usize,
    cap: usize,
}

impl YieldCounter {
    /// Create a counter at zero with the given upper bound.
    pub fn new(cap: usize) -> Self {
        Self { value: 0, cap }
    }

    /// Increment unless already at the cap. Returns the resulting value.
    pub fn increment(&mut self) -> usize {
        if self.value < self.cap {
            self.value += 1;
        }
        self.value
    }

    /// Reset to zero and return the value taken.
    pub fn take(&mut self) -> usize {
        std::mem::take(&mut self.value)
    }

    /// Current value.
    pub fn get(&self) -> usize {
        self.value
    }

    /// Upper bound.
    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Whether the counter sits at its upper bound.
    pub fn is_full(&self) -> bool {
        self.value == self.cap
    }
}
