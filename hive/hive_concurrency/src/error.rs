//! Error types for the hive simulation.
//!
//! The simulation itself has no recoverable business errors. What can fail is
//! the setup around it: loading configuration, spawning threads, installing
//! the logger.

use thiserror::Error;

/// Errors raised while configuring or starting a simulation.
#[derive(Error, Debug)]
pub enum HiveError {
    /// The configuration violates one of its constraints
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configuration text could not be parsed
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Reading configuration from disk failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The OS refused to spawn a simulation thread
    #[error("failed to spawn thread {name}: {source}")]
    Spawn {
        /// Name of the thread that could not be spawned
        name: String,

        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// `start` was called on a simulation that already ran
    #[error("simulation already started")]
    AlreadyStarted,

    /// A global logger was already installed
    #[error("logger already initialized: {0}")]
    Logger(#[from] log::SetLoggerError),
}

/// Result type used throughout the hive crates.
pub type Result<T> = std::result::Result<T, HiveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_error_names_thread() {
        let err = HiveError::Spawn {
            name: "hive-worker-3".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "out of threads"),
        };

        let message = err.to_string();
        assert!(message.contains("hive-worker-3"));
        assert!(message.contains("out of threads"));
    }

    #[test]
    fn test_parse_error_conversion() {
        let parse = toml::from_str::<toml::Value>("workers = ").unwrap_err();
        let err: HiveError = parse.into();
        assert!(matches!(err, HiveError::Parse(_)));
    }
}
