//! Chunk storage for the windowed key/value array.
//!
//! A chunk is a window `[start, cursor)` over a fixed-size physical block of
//! parallel key/value slots, plus a link to the chunk holding the next older
//! (strictly smaller) keys. Chunks and blocks live in a [`ChunkArena`] and are
//! referenced by index, so the chain is an acyclic list of ids rather than a
//! web of owning pointers.
//!
//! # Design
//!
//! - Blocks are allocated once, at full capacity, and never grow
//! - A split produces a second chunk over the *same* block; the two logical
//!   windows never overlap, so no data is copied
//! - Each block counts the live chunks windowing into it and is freed when
//!   the last one is released
//! - Released chunk and block slots are recycled by later allocations
//!
//! ```text
//!  block:  [ 1 | 2 | 3 | 4 | 5 | 6 | 7 | 8 ]
//!
//!  split_at(5)
//!
//!  block:  [ 1 | 2 | 3 | 4 | 5 | 6 | 7 | 8 ]
//!          |s--older---e| |s-original--e|
//! ```

/// Ordering key of an entry: an arrival tick supplied by the caller.
pub type Tick = i64;

/// Index of a chunk descriptor inside a [`ChunkArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ChunkId(usize);

/// Index of a physical block inside a [`ChunkArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct BlockId(usize);

/// Fixed-size parallel key/value storage shared by one or more chunks.
#[derive(Debug)]
struct Block<V> {
    keys: Box<[Tick]>,
    values: Box<[V]>,
    /// Number of live chunks windowing into this block.
    owners: usize,
}

/// A logical window over a block.
///
/// Invariant: `keys[start..cursor]` is non-decreasing and
/// `start + capacity <= block length`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Chunk {
    block: BlockId,
    /// First live slot.
    start: usize,
    /// First free slot, one past the last live entry.
    cursor: usize,
    /// Logical capacity; shrinks below the block length after a boundary trim.
    capacity: usize,
    /// Chunk holding strictly smaller keys, if any.
    older: Option<ChunkId>,
}

impl Chunk {
    /// Number of live entries.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.cursor - self.start
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.len() == self.capacity
    }

    #[inline]
    pub(crate) fn start(&self) -> usize {
        self.start
    }

    #[inline]
    pub(crate) fn cursor(&self) -> usize {
        self.cursor
    }

    #[inline]
    pub(crate) fn older(&self) -> Option<ChunkId> {
        self.older
    }
}

/// Owner of every chunk descriptor and block reachable from a chain.
#[derive(Debug)]
pub(crate) struct ChunkArena<V> {
    chunks: Vec<Option<Chunk>>,
    free_chunks: Vec<usize>,
    blocks: Vec<Option<Block<V>>>,
    free_blocks: Vec<usize>,
}

impl<V: Copy + Default> ChunkArena<V> {
    pub(crate) fn new() -> Self {
        Self {
            chunks: Vec::new(),
            free_chunks: Vec::new(),
            blocks: Vec::new(),
            free_blocks: Vec::new(),
        }
    }

    /// Allocates an empty chunk over a fresh block of `capacity` slots.
    pub(crate) fn alloc(&mut self, capacity: usize, older: Option<ChunkId>) -> ChunkId {
        let block = Block {
            keys: vec![0; capacity].into_boxed_slice(),
            values: vec![V::default(); capacity].into_boxed_slice(),
            owners: 0,
        };
        let block = match self.free_blocks.pop() {
            Some(slot) => {
                self.blocks[slot] = Some(block);
                BlockId(slot)
            }
            None => {
                self.blocks.push(Some(block));
                BlockId(self.blocks.len() - 1)
            }
        };

        tracing::trace!(capacity, "allocated chunk block");

        self.insert_chunk(Chunk {
            block,
            start: 0,
            cursor: 0,
            capacity,
            older,
        })
    }

    fn insert_chunk(&mut self, chunk: Chunk) -> ChunkId {
        self.block_mut(chunk.block).owners += 1;
        match self.free_chunks.pop() {
            Some(slot) => {
                self.chunks[slot] = Some(chunk);
                ChunkId(slot)
            }
            None => {
                self.chunks.push(Some(chunk));
                ChunkId(self.chunks.len() - 1)
            }
        }
    }

    /// Returns the descriptor for a live chunk.
    ///
    /// # Panics
    ///
    /// Panics if `id` was released; a dangling id is an internal-consistency
    /// fault of the chain, never a caller error.
    pub(crate) fn get(&self, id: ChunkId) -> &Chunk {
        match self.chunks.get(id.0) {
            Some(Some(chunk)) => chunk,
            _ => panic!("chunk {} is not live", id.0),
        }
    }

    fn get_mut(&mut self, id: ChunkId) -> &mut Chunk {
        match self.chunks.get_mut(id.0) {
            Some(Some(chunk)) => chunk,
            _ => panic!("chunk {} is not live", id.0),
        }
    }

    fn block(&self, id: BlockId) -> &Block<V> {
        match self.blocks.get(id.0) {
            Some(Some(block)) => block,
            _ => panic!("block {} is not live", id.0),
        }
    }

    fn block_mut(&mut self, id: BlockId) -> &mut Block<V> {
        match self.blocks.get_mut(id.0) {
            Some(Some(block)) => block,
            _ => panic!("block {} is not live", id.0),
        }
    }

    /// Number of live chunks in the arena.
    pub(crate) fn live_chunks(&self) -> usize {
        self.chunks.len() - self.free_chunks.len()
    }

    /// Live keys of a chunk, oldest first.
    pub(crate) fn keys(&self, id: ChunkId) -> &[Tick] {
        let chunk = self.get(id);
        &self.block(chunk.block).keys[chunk.start..chunk.cursor]
    }

    /// Live values of a chunk, oldest first.
    pub(crate) fn values(&self, id: ChunkId) -> &[V] {
        let chunk = self.get(id);
        &self.block(chunk.block).values[chunk.start..chunk.cursor]
    }

    /// Largest live key of a chunk.
    pub(crate) fn last_key(&self, id: ChunkId) -> Option<Tick> {
        self.keys(id).last().copied()
    }

    /// Writes `(key, value)` at the cursor and advances it.
    ///
    /// The caller guarantees spare logical capacity and key ordering.
    pub(crate) fn append(&mut self, id: ChunkId, key: Tick, value: V) {
        let chunk = *self.get(id);
        debug_assert!(!chunk.is_full(), "append to a full chunk");
        let block = self.block_mut(chunk.block);
        block.keys[chunk.cursor] = key;
        block.values[chunk.cursor] = value;
        self.get_mut(id).cursor += 1;
    }

    /// True if the chunk is empty or its smallest live key is `>= key`.
    pub(crate) fn first_key_empty_or_at_least(&self, id: ChunkId, key: Tick) -> bool {
        self.keys(id).first().is_none_or(|&first| first >= key)
    }

    /// Slot index of the first live entry with a key `>= key`, or the cursor
    /// when every live key is smaller.
    pub(crate) fn lower_bound(&self, id: ChunkId, key: Tick) -> usize {
        let start = self.get(id).start;
        if self.first_key_empty_or_at_least(id, key) {
            return start;
        }
        start + self.keys(id).partition_point(|&k| k < key)
    }

    /// Walks older links from `from` to the first chunk whose smallest key is
    /// below `key`, stopping at the oldest chunk if none qualifies.
    pub(crate) fn find_containing(&self, from: ChunkId, key: Tick) -> ChunkId {
        self.find_containing_with_newer(from, key).1
    }

    /// Same walk as [`find_containing`](Self::find_containing), also
    /// returning the chunk visited just before the result (`None` if the
    /// walk never left `from`).
    pub(crate) fn find_containing_with_newer(
        &self,
        from: ChunkId,
        key: Tick,
    ) -> (Option<ChunkId>, ChunkId) {
        let mut newer = None;
        let mut current = from;
        while self.first_key_empty_or_at_least(current, key) {
            match self.get(current).older {
                Some(older) => {
                    newer = Some(current);
                    current = older;
                }
                None => break,
            }
        }
        (newer, current)
    }

    /// Splits a chunk at `lower_bound(key)`.
    ///
    /// Entries below `key` move to a new chunk over the same block, linked
    /// between `id` and its previous older chunk; `id` keeps the rest. When
    /// the split point is at either edge nothing changes and the existing
    /// older link is returned.
    pub(crate) fn split_at(&mut self, id: ChunkId, key: Tick) -> Option<ChunkId> {
        let split = self.lower_bound(id, key);
        let chunk = *self.get(id);
        if split == chunk.start || split == chunk.cursor {
            return chunk.older;
        }

        let older_len = split - chunk.start;
        let older = self.insert_chunk(Chunk {
            block: chunk.block,
            start: chunk.start,
            cursor: split,
            capacity: older_len,
            older: chunk.older,
        });

        let chunk = self.get_mut(id);
        chunk.start = split;
        chunk.capacity -= older_len;
        chunk.older = Some(older);
        Some(older)
    }

    /// Drops every entry at or above slot `cursor`.
    pub(crate) fn truncate(&mut self, id: ChunkId, cursor: usize) {
        let chunk = self.get_mut(id);
        debug_assert!(chunk.start <= cursor && cursor <= chunk.cursor);
        chunk.cursor = cursor;
    }

    /// Like [`truncate`](Self::truncate), and also shrinks the logical
    /// capacity so the dropped slots are never appended to again.
    pub(crate) fn truncate_and_seal(&mut self, id: ChunkId, cursor: usize) {
        self.truncate(id, cursor);
        let chunk = self.get_mut(id);
        chunk.capacity = chunk.cursor - chunk.start;
    }

    /// Drops every entry below slot `start` and seals the chunk.
    pub(crate) fn advance_start(&mut self, id: ChunkId, start: usize) {
        let chunk = self.get_mut(id);
        debug_assert!(chunk.start <= start && start <= chunk.cursor);
        chunk.start = start;
        chunk.capacity = chunk.cursor - chunk.start;
    }

    /// Replaces the older link of `id`, releasing whatever the old link
    /// reached down to (but excluding) `older`.
    pub(crate) fn relink(&mut self, id: ChunkId, older: Option<ChunkId>) {
        let previous = self.get(id).older;
        self.release_until(previous, older);
        self.get_mut(id).older = older;
    }

    /// Releases the chain starting at `from`, following older links until
    /// `stop` (exclusive) or the end of the chain.
    pub(crate) fn release_until(&mut self, from: Option<ChunkId>, stop: Option<ChunkId>) {
        let mut current = from;
        while let Some(id) = current {
            if Some(id) == stop {
                return;
            }
            current = self.release(id);
        }
        debug_assert!(stop.is_none(), "release walked past its stop chunk");
    }

    /// Frees one chunk and returns its older link. The block is freed with
    /// its last owner.
    fn release(&mut self, id: ChunkId) -> Option<ChunkId> {
        let Some(chunk) = self.chunks[id.0].take() else {
            panic!("chunk {} released twice", id.0);
        };
        self.free_chunks.push(id.0);

        let block = self.block_mut(chunk.block);
        block.owners -= 1;
        if block.owners == 0 {
            self.blocks[chunk.block.0] = None;
            self.free_blocks.push(chunk.block.0);
        }
        chunk.older
    }

    /// Empties a chunk and gives it back the whole physical block.
    ///
    /// The chunk must be the block's only owner, so anything older has to be
    /// released first.
    pub(crate) fn reset(&mut self, id: ChunkId) {
        self.relink(id, None);
        let chunk = *self.get(id);
        let block = self.block(chunk.block);
        debug_assert_eq!(block.owners, 1, "reset of a shared block");
        let physical = block.keys.len();

        let chunk = self.get_mut(id);
        chunk.start = 0;
        chunk.cursor = 0;
        chunk.capacity = physical;
    }
}
