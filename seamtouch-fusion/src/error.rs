//! Error types for seamtouch-fusion
//!
//! Configuration errors are fatal: they abort fusion and shut the whole
//! process down. Rejected samples (debounce, deghost, protocol errors) are
//! not errors at all; the pipeline reports them as suppressed.

use seamtouch_common::SensorPosition;
use thiserror::Error;

/// Main error type for the fusion service
#[derive(Error, Debug)]
pub enum Error {
    /// A second sensor registered at an occupied position
    #[error("Duplicate configuration for sensor position {0}")]
    DuplicatePosition(SensorPosition),

    /// A neighbour geometry required for mapping is not registered
    #[error("Cannot map {position}: neighbour {neighbor} is not registered")]
    UnresolvedNeighbor {
        position: SensorPosition,
        neighbor: SensorPosition,
    },

    /// The opposite sensor along the seam axis is not registered
    #[error("Cannot find opposite configuration for sensor position {0}")]
    MissingOpposite(SensorPosition),

    /// Active areas leave a gap instead of overlapping
    #[error("Gap of {gap} units in touch active area between {position} and its opposite sensor")]
    SeamGap { position: SensorPosition, gap: u32 },

    /// Sensor transport failures (connect, handshake, disconnect)
    #[error("Sensor transport error: {0}")]
    Transport(String),

    /// Inter-thread queue failures
    #[error("Queue error: {0}")]
    Queue(String),

    /// Worker thread spawn or join failures
    #[error("Thread error: {0}")]
    Thread(String),

    /// Pointer output device errors
    #[error("Presentation error: {0}")]
    Presentation(String),

    /// Shared configuration and data model errors
    #[error(transparent)]
    Common(#[from] seamtouch_common::Error),
}

impl Error {
    /// Configuration errors that must terminate the process
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::Presentation(_) | Error::Queue(_))
    }
}

/// Convenience Result type using the fusion Error
pub type Result<T> = std::result::Result<T, Error>;
