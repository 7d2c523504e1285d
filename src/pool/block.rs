// src/pool/block.rs
//! The small pool's unit of storage: a fixed-size, zero-filled byte array.

use zeroize::Zeroize;

/// A single fixed-size block, owned either by the small pool's free list
/// or by exactly one stream.
#[derive(Debug)]
pub struct Block(Box<[u8]>);

impl Block {
    /// Allocate a fresh, zero-filled block of `size` bytes.
    pub fn zeroed(size: usize) -> Self {
        Self(vec![0u8; size].into_boxed_slice())
    }

    /// Overwrite every byte with zero, in place, without reallocating.
    pub fn zero_fill(&mut self) {
        self.0.zeroize();
    }

    /// Block length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` when the block has zero length (never produced by
    /// [`Block::zeroed`] with a positive `block_size`, but checked rather
    /// than assumed).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::ops::Deref for Block {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl std::ops::DerefMut for Block {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeroed_block_is_all_zero() {
        let block = Block::zeroed(64);
        assert_eq!(block.len(), 64);
        assert!(block.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_zero_fill_clears_dirty_bytes() {
        let mut block = Block::zeroed(16);
        block.iter_mut().for_each(|b| *b = 0xAB);
        block.zero_fill();
        assert!(block.iter().all(|&b| b == 0));
    }
}
