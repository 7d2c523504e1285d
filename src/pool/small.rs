// src/pool/small.rs
//! Free list of fixed-size blocks.

use parking_lot::Mutex;

use crate::error::{PoolError, Result};
use crate::events::SharedEventSink;
use crate::pool::block::Block;

struct Inner {
    free: Vec<Block>,
    free_bytes: usize,
    in_use_bytes: usize,
}

/// The pool of fixed-size blocks. All mutation happens under a single
/// lock so the free-bytes/in-use-bytes counters are never observed
/// inconsistent with the free list they describe.
pub struct SmallPool {
    block_size: usize,
    maximum_free_bytes: usize,
    inner: Mutex<Inner>,
    sink: SharedEventSink,
}

impl SmallPool {
    pub fn new(block_size: usize, maximum_free_bytes: usize, sink: SharedEventSink) -> Self {
        Self {
            block_size,
            maximum_free_bytes,
            inner: Mutex::new(Inner {
                free: Vec::new(),
                free_bytes: 0,
                in_use_bytes: 0,
            }),
            sink,
        }
    }

    /// Size of every block this pool hands out.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Pop a free block, or allocate a fresh zeroed one.
    pub fn acquire(&self) -> Block {
        let mut inner = self.inner.lock();
        let block = match inner.free.pop() {
            Some(block) => {
                inner.free_bytes -= self.block_size;
                block
            }
            None => {
                drop(inner);
                self.sink.read().block_created(self.block_size);
                let block = Block::zeroed(self.block_size);
                self.inner.lock().in_use_bytes += self.block_size;
                return block;
            }
        };
        inner.in_use_bytes += self.block_size;
        block
    }

    /// Return a batch of blocks, zeroing each one before it re-enters the
    /// free list or is dropped. The whole batch is validated before any
    /// counter mutation, so a malformed batch leaves pool state untouched.
    pub fn release(&self, mut blocks: Vec<Block>) -> Result<()> {
        for block in &blocks {
            if block.len() != self.block_size {
                return Err(PoolError::ArgumentInvalid(format!(
                    "block of length {} does not match pool block_size {}",
                    block.len(),
                    self.block_size
                )));
            }
        }

        let mut inner = self.inner.lock();
        inner.in_use_bytes -= blocks.len() * self.block_size;

        for mut block in blocks.drain(..) {
            block.zero_fill();
            let would_exceed = self.maximum_free_bytes != 0
                && inner.free_bytes + self.block_size > self.maximum_free_bytes;
            if would_exceed {
                drop(block);
                self.sink.read().block_discarded(self.block_size);
            } else {
                inner.free_bytes += self.block_size;
                inner.free.push(block);
            }
        }
        Ok(())
    }

    pub fn free_size(&self) -> usize {
        self.inner.lock().free_bytes
    }

    pub fn in_use_size(&self) -> usize {
        self.inner.lock().in_use_bytes
    }
}
