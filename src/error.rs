//! Error types for autoframe.

use thiserror::Error;

/// Main error type for all framing operations.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Invalid construction parameters (zero frame size, bad field width, ...).
    #[error("invalid codec configuration: {0}")]
    InvalidConfig(String),

    /// Encode called with a payload that violates the codec's precondition.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O error during transport receive.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A dump sink failed to persist a frame record.
    #[error("dump error: {0}")]
    Dump(String),
}

/// Result type alias using FrameError.
pub type Result<T> = std::result::Result<T, FrameError>;
