//! Common error types for seamtouch

use thiserror::Error;

use crate::sensor::SensorPosition;

/// Common result type for seamtouch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across seamtouch crates
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A position index or name outside the four quadrant positions
    #[error("Unrecognized sensor position: {0}")]
    UnrecognizedPosition(String),

    /// Two hardware identifiers claim the same persisted position
    #[error("Sensor position {position} claimed by both {first} and {second}")]
    PositionConflict {
        position: SensorPosition,
        first: String,
        second: String,
    },

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
