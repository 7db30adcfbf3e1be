//! Construction-time configuration for the hive simulation.
//!
//! All durations are in milliseconds. Every field has a default, so a TOML
//! document only needs to name the values it overrides.

use std::path::Path;
use std::time::Duration;

use log::LevelFilter;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{HiveError, Result};

/// An inclusive range of durations sampled uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationRange {
    /// Shortest duration that can be drawn
    pub min_ms: u64,

    /// Longest duration that can be drawn
    pub max_ms: u64,
}

impl DurationRange {
    /// Create a new range.
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// A range that always yields the same duration.
    pub fn fixed(ms: u64) -> Self {
        Self::new(ms, ms)
    }

    /// Draw a duration from the range.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        Duration::from_millis(rng.gen_range(self.min_ms..=self.max_ms))
    }

    fn validate(&self, field: &str) -> Result<()> {
        if self.min_ms > self.max_ms {
            return Err(HiveError::InvalidConfig(format!(
                "{}: min_ms {} exceeds max_ms {}",
                field, self.min_ms, self.max_ms
            )));
        }
        Ok(())
    }
}

/// Configuration for a hive simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HiveConfig {
    /// Number of workers created in the pool
    pub workers: usize,

    /// Duration of a single hunt
    pub hunt_ms: DurationRange,

    /// Pause between two releases by the scheduler
    pub release_interval_ms: DurationRange,

    /// Upper bound of the yield counter
    pub yield_cap: usize,

    /// An exploit succeeds while the pool holds fewer workers than this
    pub exploit_pool_threshold: usize,

    /// Yield level at which the antagonist attempts an exploit
    pub exploit_trigger: usize,

    /// Time the antagonist sits out after a failed exploit
    pub penalty_ms: u64,

    /// How long `Simulation::run` lets the hive work before shutting down
    pub run_duration_ms: u64,

    /// Seed for the duration draws; `None` seeds from the OS
    pub seed: Option<u64>,

    /// Name prefix for spawned threads
    pub thread_name_prefix: String,

    /// Minimum level written by the log sink
    pub log_level: String,
}

impl Default for HiveConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            hunt_ms: DurationRange::new(800, 1200),
            release_interval_ms: DurationRange::new(50, 100),
            yield_cap: 30,
            exploit_pool_threshold: 3,
            exploit_trigger: 15,
            penalty_ms: 2000,
            run_duration_ms: 15_000,
            seed: None,
            thread_name_prefix: "hive".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl HiveConfig {
    /// Parse and validate a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check the constraints between fields.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(HiveError::InvalidConfig(
                "workers must be at least 1".to_string(),
            ));
        }
        self.hunt_ms.validate("hunt_ms")?;
        self.release_interval_ms.validate("release_interval_ms")?;
        if self.exploit_pool_threshold == 0 {
            return Err(HiveError::InvalidConfig(
                "exploit_pool_threshold must be at least 1".to_string(),
            ));
        }
        if self.exploit_trigger == 0 {
            return Err(HiveError::InvalidConfig(
                "exploit_trigger must be at least 1".to_string(),
            ));
        }
        if self.exploit_trigger > self.yield_cap {
            return Err(HiveError::InvalidConfig(format!(
                "exploit_trigger {} exceeds yield_cap {}",
                self.exploit_trigger, self.yield_cap
            )));
        }
        self.level_filter()?;
        Ok(())
    }

    /// The configured log level as a filter.
    pub fn level_filter(&self) -> Result<LevelFilter> {
        self.log_level
            .parse()
            .map_err(|_| HiveError::InvalidConfig(format!("unknown log level {}", self.log_level)))
    }

    /// Penalty as a `Duration`.
    pub fn penalty(&self) -> Duration {
        Duration::from_millis(self.penalty_ms)
    }

    /// Run duration as a `Duration`.
    pub fn run_duration(&self) -> Duration {
        Duration::from_millis(self.run_duration_ms)
    }
}
