//! The windowed key/value array.
//!
//! A [`WindowedArray`] behaves as one sorted sequence of `(tick, value)`
//! entries split across fixed-capacity chunks. New entries are appended to
//! the head chunk; the chain behind it holds progressively older entries.
//! Two range operations restructure the chain without copying entries:
//!
//! ```text
//! [3, 4, 5, 9] -> [10, 13, 14, 15] -> [21, 24, 29, 30] -> [31]   :: start layout
//!
//! trim_to_window(5, 23):
//!       [5, 9] -> [10, 13, 14, 15] -> [21]                       :: kept
//!
//! clear_range(5, 23):
//! [3, 4]              ->               [24, 29, 30] -> [31]      :: kept
//! ```
//!
//! # Thread Safety
//!
//! Every public operation holds one per-instance lock for its full duration,
//! so concurrent callers only ever observe whole-operation effects.

use std::fmt;

use parking_lot::Mutex;

use crate::chunk::{ChunkArena, ChunkId, Tick};
use crate::config::ArrayConfig;
use crate::error::Result;

/// A time-ordered, append-mostly key/value store with range trimming.
///
/// Keys are [`Tick`]s supplied by the caller; they must be non-decreasing
/// relative to the head chunk, otherwise [`put`](Self::put) rejects the
/// entry.
///
/// # Examples
///
/// ```rust
/// use chunkwin::WindowedArray;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let array: WindowedArray<i64> = WindowedArray::with_chunk_capacity(4)?;
/// for tick in 1..=6 {
///     assert!(array.put(tick, tick * 10));
/// }
/// assert_eq!(array.values(), vec![10, 20, 30, 40, 50, 60]);
///
/// array.trim_to_window(3, 6);
/// assert_eq!(array.values(), vec![30, 40, 50]);
///
/// // Older than the head's last key.
/// assert!(!array.put(2, 0));
/// # Ok(())
/// # }
/// ```
pub struct WindowedArray<V = i64> {
    config: ArrayConfig,
    chain: Mutex<ChunkChain<V>>,
}

impl<V: Copy + Default> WindowedArray<V> {
    /// Creates an empty array with the default chunk capacity.
    pub fn new() -> Self {
        Self::from_valid_config(ArrayConfig::default())
    }

    /// Creates an empty array whose chunks hold `chunk_capacity` entries.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`](crate::error::ConfigError) if the capacity is
    /// zero or too large.
    pub fn with_chunk_capacity(chunk_capacity: usize) -> Result<Self> {
        Self::with_config(ArrayConfig::new(chunk_capacity)?)
    }

    /// Creates an empty array from a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`](crate::error::ConfigError) if the
    /// configuration is invalid.
    pub fn with_config(config: ArrayConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: ArrayConfig) -> Self {
        Self {
            config,
            chain: Mutex::new(ChunkChain::new(config.chunk_capacity)),
        }
    }

    /// Returns the configuration this array was created with.
    pub fn config(&self) -> &ArrayConfig {
        &self.config
    }

    /// Appends an entry.
    ///
    /// Returns `false` and leaves the array untouched if `key` is smaller
    /// than the last key of the head chunk. Amortized O(1).
    pub fn put(&self, key: Tick, value: V) -> bool {
        self.chain.lock().put(key, value)
    }

    /// Number of retained entries. O(number of chunks).
    pub fn size(&self) -> usize {
        self.chain.lock().size()
    }

    /// Returns `true` if no entries are retained.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Number of chunks currently in the chain, including empty ones.
    pub fn chunk_count(&self) -> usize {
        self.chain.lock().chunk_ids().len()
    }

    /// Snapshot of all values in chronological (key) order.
    pub fn values(&self) -> Vec<V> {
        self.chain.lock().values()
    }

    /// Keeps exactly the entries with `start <= key < end`.
    pub fn trim_to_window(&self, start: Tick, end: Tick) {
        self.chain.lock().trim_to_window(start, end);
    }

    /// Removes exactly the entries with `start <= key < end`, keeping
    /// everything before and after.
    pub fn clear_range(&self, start: Tick, end: Tick) {
        self.chain.lock().clear_range(start, end);
    }

    /// Removes every entry, reusing the head chunk's storage.
    pub fn clear_all(&self) {
        self.chain.lock().clear_all();
    }
}

impl<V: Copy + Default + fmt::Display> WindowedArray<V> {
    /// Renders the chain as `[(k: v) ...]->[(k: v) ...]`, oldest chunk first.
    ///
    /// An empty array renders as `[]`. Meant for diagnostics, not parsing.
    pub fn debug_string(&self) -> String {
        self.to_string()
    }
}

impl<V: Copy + Default> Default for WindowedArray<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Copy + Default + fmt::Display> fmt::Display for WindowedArray<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.chain.lock().render(f)
    }
}

impl<V> fmt::Debug for WindowedArray<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowedArray")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// The unsynchronized chain behind a [`WindowedArray`].
#[derive(Debug)]
struct ChunkChain<V> {
    arena: ChunkArena<V>,
    /// Chunk accepting appends; holds the largest keys.
    head: ChunkId,
    chunk_capacity: usize,
}

impl<V: Copy + Default> ChunkChain<V> {
    fn new(chunk_capacity: usize) -> Self {
        let mut arena = ChunkArena::new();
        let head = arena.alloc(chunk_capacity, None);
        Self {
            arena,
            head,
            chunk_capacity,
        }
    }

    fn put(&mut self, key: Tick, value: V) -> bool {
        if let Some(last) = self.arena.last_key(self.head)
            && key < last
        {
            tracing::trace!(key, last, "rejected out-of-order put");
            return false;
        }

        if self.arena.get(self.head).is_full() {
            self.head = self.arena.alloc(self.chunk_capacity, Some(self.head));
        }
        self.arena.append(self.head, key, value);
        true
    }

    /// Chunk ids from oldest to newest.
    fn chunk_ids(&self) -> Vec<ChunkId> {
        let mut ids = Vec::new();
        let mut current = Some(self.head);
        while let Some(id) = current {
            ids.push(id);
            current = self.arena.get(id).older();
        }
        ids.reverse();
        ids
    }

    fn size(&self) -> usize {
        let mut size = 0;
        let mut current = Some(self.head);
        while let Some(id) = current {
            let chunk = self.arena.get(id);
            size += chunk.len();
            current = chunk.older();
        }
        size
    }

    fn values(&self) -> Vec<V> {
        let ids = self.chunk_ids();
        let size = ids.iter().map(|&id| self.arena.get(id).len()).sum();

        let mut values = Vec::with_capacity(size);
        for id in ids {
            values.extend_from_slice(self.arena.values(id));
        }
        values
    }

    fn trim_to_window(&mut self, start: Tick, end: Tick) {
        // Everything newer than the chunk holding `end` goes.
        let new_head = self.arena.find_containing(self.head, end);
        self.arena.release_until(Some(self.head), Some(new_head));
        self.head = new_head;
        let cursor = self.arena.lower_bound(new_head, end);
        self.arena.truncate(new_head, cursor);

        // Everything older than `start` goes.
        let tail = self.arena.find_containing(new_head, start);
        let new_start = self.arena.lower_bound(tail, start);
        if new_start != self.arena.get(tail).start() {
            self.arena.advance_start(tail, new_start);
            self.arena.relink(tail, None);
        }

        tracing::debug!(start, end, chunks = self.arena.live_chunks(), "trimmed to window");
    }

    fn clear_range(&mut self, start: Tick, end: Tick) {
        if start >= end {
            return;
        }

        let (newer, boundary) = self.arena.find_containing_with_newer(self.head, end);
        let split = self.arena.lower_bound(boundary, end);
        let chunk = *self.arena.get(boundary);

        // `upper` is the oldest surviving chunk above the gap (all keys >= end),
        // `below` the newest chunk that may still hold keys inside the gap.
        let (upper, below) = if split == chunk.start() {
            // Nothing below `end` at all.
            return;
        } else if split == chunk.cursor() {
            (newer, boundary)
        } else {
            match self.arena.split_at(boundary, end) {
                Some(older) => (Some(boundary), older),
                None => return,
            }
        };

        let after_gap = self.arena.find_containing(below, start);
        let cut = self.arena.lower_bound(after_gap, start);
        let gap_chunk = *self.arena.get(after_gap);

        // The oldest surviving chunk below the gap, if any.
        let survivor = if cut == gap_chunk.start() {
            None
        } else {
            if cut != gap_chunk.cursor() {
                if after_gap == self.head {
                    self.arena.truncate(after_gap, cut);
                } else {
                    self.arena.truncate_and_seal(after_gap, cut);
                }
            }
            Some(after_gap)
        };

        match (upper, survivor) {
            (Some(upper), survivor) => self.arena.relink(upper, survivor),
            (None, Some(survivor)) => {
                self.arena.release_until(Some(self.head), Some(survivor));
                self.head = survivor;
            }
            (None, None) => self.arena.reset(self.head),
        }

        tracing::debug!(start, end, chunks = self.arena.live_chunks(), "cleared range");
    }

    fn clear_all(&mut self) {
        self.arena.reset(self.head);
        tracing::debug!("cleared all entries");
    }
}

impl<V: Copy + Default + fmt::Display> ChunkChain<V> {
    fn render(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.size() == 0 {
            return f.write_str("[]");
        }

        for (i, id) in self.chunk_ids().into_iter().enumerate() {
            if i > 0 {
                f.write_str("->")?;
            }
            f.write_str("[")?;
            let keys = self.arena.keys(id);
            let values = self.arena.values(id);
            for (key, value) in keys.iter().zip(values) {
                write!(f, "({key}: {value}) ")?;
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}
