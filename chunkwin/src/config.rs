//! Configuration types for chunkwin arrays and reservoirs.
//!
//! Both types deserialize from JSON with every field optional, falling back
//! to the defaults below, and are validated before any storage is allocated.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use chunkwin::config::{ArrayConfig, ReservoirConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let array = ArrayConfig::new(128)?;
//! assert_eq!(array.chunk_capacity, 128);
//!
//! let reservoir = ReservoirConfig::new(Duration::from_secs(30))?;
//! assert_eq!(reservoir.chunk_capacity, chunkwin::config::DEFAULT_CHUNK_CAPACITY);
//! # Ok(())
//! # }
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Number of slots in a freshly allocated chunk.
pub const DEFAULT_CHUNK_CAPACITY: usize = 512;

/// Upper bound on chunk capacity.
///
/// Each slot holds a key and a value, so this caps a single block at a few
/// tens of MiB for 8-byte values.
pub const MAX_CHUNK_CAPACITY: usize = 1 << 20;

/// Default retention window of a reservoir.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Default number of updates between window enforcements.
pub const DEFAULT_TRIM_THRESHOLD: u64 = 256;

/// Largest window whose tick span fits in an `i64`.
#[allow(clippy::cast_sign_loss)] // i64::MAX / 256 is positive
pub const MAX_WINDOW: Duration =
    Duration::from_nanos((i64::MAX / crate::reservoir::COLLISION_BUFFER) as u64);

/// Storage configuration for a [`WindowedArray`](crate::array::WindowedArray).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArrayConfig {
    /// Slots per chunk. Only affects allocation granularity, never content.
    pub chunk_capacity: usize,
}

impl Default for ArrayConfig {
    fn default() -> Self {
        Self {
            chunk_capacity: DEFAULT_CHUNK_CAPACITY,
        }
    }
}

impl ArrayConfig {
    /// Creates a validated array configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `chunk_capacity` is zero or larger than
    /// [`MAX_CHUNK_CAPACITY`].
    pub fn new(chunk_capacity: usize) -> Result<Self> {
        let config = Self { chunk_capacity };
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if validation fails.
    pub fn validate(&self) -> Result<()> {
        validate_chunk_capacity(self.chunk_capacity)
    }

    /// Loads and validates a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, parsed, or fails
    /// validation.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config: Self = read_json(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }
}

/// Configuration for a [`SlidingWindowReservoir`](crate::reservoir::SlidingWindowReservoir).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReservoirConfig {
    /// How far back samples are retained.
    pub window: Duration,

    /// Slots per chunk of the underlying array.
    pub chunk_capacity: usize,

    /// The window is enforced once every this many updates, and on every read.
    pub trim_threshold: u64,
}

impl Default for ReservoirConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            chunk_capacity: DEFAULT_CHUNK_CAPACITY,
            trim_threshold: DEFAULT_TRIM_THRESHOLD,
        }
    }
}

impl ReservoirConfig {
    /// Creates a validated configuration with the given window and default
    /// storage settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the window is zero or exceeds [`MAX_WINDOW`].
    pub fn new(window: Duration) -> Result<Self> {
        let config = Self {
            window,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Returns the storage part of this configuration.
    pub fn array(&self) -> ArrayConfig {
        ArrayConfig {
            chunk_capacity: self.chunk_capacity,
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if validation fails.
    pub fn validate(&self) -> Result<()> {
        if self.window.is_zero() {
            return Err(ConfigError::EmptyWindow.into());
        }

        if self.window > MAX_WINDOW {
            return Err(ConfigError::WindowTooLarge {
                window: self.window,
                max: MAX_WINDOW,
            }
            .into());
        }

        if self.trim_threshold == 0 {
            return Err(ConfigError::InvalidTrimThreshold.into());
        }

        validate_chunk_capacity(self.chunk_capacity)
    }

    /// Loads and validates a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, parsed, or fails
    /// validation.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config: Self = read_json(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }
}

fn validate_chunk_capacity(capacity: usize) -> Result<()> {
    if capacity == 0 {
        return Err(ConfigError::InvalidChunkCapacity { capacity }.into());
    }
    if capacity > MAX_CHUNK_CAPACITY {
        return Err(ConfigError::ChunkCapacityTooLarge {
            capacity,
            max: MAX_CHUNK_CAPACITY,
        }
        .into());
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let json = fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;

    let value = serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(value)
}
