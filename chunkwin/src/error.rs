//! Error types for the chunkwin windowed array and its reservoir driver.
//!
//! Out-of-order insertion is not an error: [`WindowedArray::put`] reports it
//! with a `false` return. Everything here concerns configuration.
//!
//! [`WindowedArray::put`]: crate::array::WindowedArray::put

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// The main error type for all chunkwin operations.
#[derive(Error, Debug)]
pub enum ChunkwinError {
    /// Error validating or loading a configuration.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors that can occur when validating or loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Chunk capacity must be at least one slot.
    #[error("invalid chunk capacity: {capacity} (must be > 0)")]
    InvalidChunkCapacity {
        /// The rejected capacity.
        capacity: usize,
    },

    /// Chunk capacity exceeds the per-chunk allocation limit.
    #[error("chunk capacity {capacity} exceeds maximum {max}")]
    ChunkCapacityTooLarge {
        /// The rejected capacity.
        capacity: usize,
        /// The largest accepted capacity.
        max: usize,
    },

    /// The retention window is zero.
    #[error("retention window must be non-zero")]
    EmptyWindow,

    /// The retention window cannot be expressed in ticks without overflow.
    #[error("retention window {window:?} exceeds maximum {max:?}")]
    WindowTooLarge {
        /// The rejected window.
        window: Duration,
        /// The largest accepted window.
        max: Duration,
    },

    /// The trim threshold must be at least one update.
    #[error("trim threshold must be > 0")]
    InvalidTrimThreshold,

    /// The configuration file could not be read.
    #[error("failed to read config file '{}': {source}", path.display())]
    Read {
        /// The config file path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for the expected type.
    #[error("failed to parse config file '{}': {source}", path.display())]
    Parse {
        /// The config file path.
        path: PathBuf,
        /// The underlying JSON parsing error.
        #[source]
        source: serde_json::Error,
    },
}

/// Type alias for `Result<T, ChunkwinError>`.
pub type Result<T> = std::result::Result<T, ChunkwinError>;
