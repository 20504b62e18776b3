//! Block allocator backing every [`crate::byte_store::ByteStore`] in one
//! [`crate::tree::FileTree`] (spec.md 4.3). Adapted from the teacher
//! repository's buffer pool (`allocator/{buffer,list}.rs`, originally a
//! `tokio::sync::mpsc`-backed channel of reusable buffers) to a blocking,
//! thread-safe free list built on `crossbeam_queue::ArrayQueue` — there is
//! no async runtime in this crate's concurrency model (spec.md 5).

use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_queue::ArrayQueue;

/// Shared pool of fixed-size, zero-filled byte blocks.
///
/// Freed blocks are returned here instead of being deallocated immediately,
/// capping peak memory at `max_cached_blocks * block_size` while avoiding
/// repeated allocation churn for files that grow and shrink repeatedly.
/// The pool is internally synchronized and shared across every
/// [`crate::byte_store::ByteStore`] in a [`crate::tree::FileTree`]
/// (spec.md 5, "Shared-resource policy").
pub struct BlockPool {
    block_size: usize,
    free: ArrayQueue<Box<[u8]>>,
    allocated: AtomicUsize,
}

impl BlockPool {
    /// Creates a pool for `block_size`-byte blocks that retains at most
    /// `max_cache_bytes` worth of freed blocks (rounded down to whole
    /// blocks; at least one block is always cached).
    pub fn new(block_size: usize, max_cache_bytes: usize) -> BlockPool {
        assert!(block_size > 0, "block size must be non-zero");
        let capacity = (max_cache_bytes / block_size).max(1);
        BlockPool { block_size, free: ArrayQueue::new(capacity), allocated: AtomicUsize::new(0) }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Returns a zero-filled block, reusing a cached one when available.
    pub fn acquire(&self) -> Box<[u8]> {
        match self.free.pop() {
            Some(mut block) => {
                block.iter_mut().for_each(|byte| *byte = 0);
                block
            }
            None => {
                self.allocated.fetch_add(1, Ordering::Relaxed);
                vec![0u8; self.block_size].into_boxed_slice()
            }
        }
    }

    /// Returns a block to the pool; dropped outright once the cache is full.
    pub fn release(&self, block: Box<[u8]>) {
        debug_assert_eq!(block.len(), self.block_size);
        let _ = self.free.push(block);
    }

    /// Total blocks ever allocated fresh (never reused from the pool) —
    /// exposed for tests and `fs_stat`-style introspection.
    pub fn blocks_allocated(&self) -> usize {
        self.allocated.load(Ordering::Relaxed)
    }
}
