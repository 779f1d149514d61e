//! Error types for codec and storage operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for codec operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Codec error types.
#[derive(Debug, Error)]
pub enum Error {
    /// Cannot open an input or output file.
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Cannot determine the size of a file.
    #[error("failed to stat {path}: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Memory map failed.
    #[error("failed to map {path}: {source}")]
    Map {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Resizing an output file failed.
    #[error("failed to resize {path} to {len} bytes: {source}")]
    Truncate {
        path: PathBuf,
        len: u64,
        #[source]
        source: std::io::Error,
    },

    /// Short or failed read.
    #[error("read failed: {0}")]
    Read(#[source] std::io::Error),

    /// Short or failed write.
    #[error("write failed: {0}")]
    Write(#[source] std::io::Error),

    /// Input data is corrupted or inconsistent with its own framing.
    #[error("malformed input: {message}")]
    MalformedInput { message: String },

    /// A caller-supplied argument violates the API contract.
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// A cursor or index operation would pass the end of its span.
    #[error("out of range: {message}")]
    OutOfRange { message: String },
}

impl Error {
    /// Create a malformed input error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Error::MalformedInput {
            message: message.into(),
        }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an out of range error.
    pub fn out_of_range(message: impl Into<String>) -> Self {
        Error::OutOfRange {
            message: message.into(),
        }
    }

    /// Get error category for metrics.
    pub fn category(&self) -> &'static str {
        match self {
            Error::Open { .. } => "io_open",
            Error::Stat { .. } => "io_stat",
            Error::Map { .. } => "io_map",
            Error::Truncate { .. } => "io_truncate",
            Error::Read(_) => "io_read",
            Error::Write(_) => "io_write",
            Error::MalformedInput { .. } => "malformed_input",
            Error::InvalidArgument { .. } => "invalid_argument",
            Error::OutOfRange { .. } => "out_of_range",
        }
    }
}
