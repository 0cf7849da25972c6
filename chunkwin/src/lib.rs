//! # chunkwin
//!
//! Chunked sliding-window key/value storage for metrics reservoirs.
//!
//! chunkwin keeps `(tick, value)` measurements in arrival order and supports
//! cheap removal of arbitrary key ranges, so a sampling reservoir can retain
//! only what falls inside its retention window.
//!
//! **Status**: This crate is in early development. The API is not yet stable.
//!
//! ## Key Properties
//!
//! - Amortized O(1) appends into fixed-capacity chunks
//! - Window trims and range clears relink chunks instead of copying entries
//! - Chunk capacity affects allocation only, never observable content
//! - One lock per array; every operation is atomic with respect to the others
//! - No background threads, no persistence
//!
//! ## Quick Start
//!
//! ```rust
//! use chunkwin::WindowedArray;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let array: WindowedArray<i64> = WindowedArray::with_chunk_capacity(4)?;
//! for tick in 1..=6 {
//!     array.put(tick, tick * 10);
//! }
//!
//! // Retain ticks 3..6
//! array.trim_to_window(3, 6);
//! assert_eq!(array.values(), vec![30, 40, 50]);
//!
//! // Nothing to clear below tick 3
//! array.clear_range(1, 2);
//! assert_eq!(array.values(), vec![30, 40, 50]);
//! assert_eq!(array.debug_string(), "[(3: 30) (4: 40) ]->[(5: 50) ]");
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`WindowedArray`]: The locked, chunked key/value sequence
//! - [`SlidingWindowReservoir`]: Clock-driven driver that keeps a time window
//! - [`ArrayConfig`] / [`ReservoirConfig`]: Validated, serde-loadable settings
//!
//! ## Modules
//!
//! - [`array`]: Windowed array operations
//! - [`reservoir`]: Tick generation and window enforcement
//! - [`clock`]: Monotonic and manual tick sources
//! - [`config`]: Configuration types
//! - [`error`]: Error types

pub mod array;
mod chunk;
pub mod clock;
pub mod config;
pub mod error;
pub mod reservoir;

// Re-export primary API types at crate root for convenience.
pub use array::WindowedArray;
pub use chunk::Tick;
pub use config::{ArrayConfig, ReservoirConfig};
pub use error::{ChunkwinError, ConfigError, Result};
pub use reservoir::SlidingWindowReservoir;
