// src/stream/buffer_view.rs
//! Contiguous views over a stream's content.

use crate::error::Result;
use crate::stream::backing::StreamBacking;
use crate::stream::core::RecycledStream;

impl RecycledStream {
    /// Return a contiguous view of the stream's backing storage.
    ///
    /// A stream whose content fits in a single block (`length` and
    /// `capacity` both at most one block) is handed back that block's view
    /// directly — no large-buffer rental. Only a stream that already spans
    /// more than one block, or whose length exceeds a block, is promoted
    /// to a single contiguous large buffer, the first time this is called.
    ///
    /// The returned slice spans the view's full capacity (a block, or a
    /// permitted large-pool size), not just `length`; callers index it
    /// with `length` when they want only the logical content.
    pub fn get_buffer(&mut self) -> Result<&[u8]> {
        self.check_live()?;
        let manager = self.manager.clone();
        let id = self.id;
        let data = self.data.get_mut();
        let block_size = manager.block_size() as u64;

        let needs_large = match &data.backing {
            StreamBacking::Large { .. } => true,
            StreamBacking::Empty => false,
            StreamBacking::Blocks(blocks) => blocks.len() as u64 > 1 || data.length > block_size,
        };

        if !needs_large {
            if matches!(data.backing, StreamBacking::Empty) {
                RecycledStream::grow_capacity(&manager, id, data, block_size)?;
            }
            return match &data.backing {
                StreamBacking::Blocks(blocks) => Ok(&blocks[0][..]),
                _ => unreachable!("a non-large, non-empty backing is always Blocks"),
            };
        }

        RecycledStream::promote_to_large(&manager, data)?;
        match &data.backing {
            StreamBacking::Large { buffer, .. } => Ok(&buffer[..]),
            _ => unreachable!("promote_to_large always leaves a Large backing"),
        }
    }

    /// Copy the logical content into a fresh, non-aliasing `Vec<u8>`.
    pub fn to_array(&self) -> Result<Vec<u8>> {
        self.check_live()?;
        let data = self.data.lock();
        let length = data.length as usize;
        let mut out = vec![0u8; length];
        let block_size = self.manager.block_size();
        super::io::copy_from_backing(&data.backing, block_size, 0, &mut out);
        drop(data);
        self.manager.sink().stream_converted_to_array(self.id, length as u64);
        Ok(out)
    }

    /// Write the full logical content to another sink.
    pub fn write_to<W: std::io::Write>(&self, target: &mut W) -> Result<()> {
        let bytes = self.to_array()?;
        target.write_all(&bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{PoolManager, PoolManagerConfig};
    use std::sync::Arc;

    fn manager() -> Arc<PoolManager> {
        Arc::new(PoolManager::new(PoolManagerConfig::small_test()).unwrap())
    }

    #[test]
    fn test_get_buffer_promotes_across_block_boundary() {
        let mut stream = RecycledStream::new(manager());
        let payload: Vec<u8> = (0..16_385u32).map(|i| (i % 256) as u8).collect();
        stream.write_at(&payload).unwrap();
        assert_eq!(stream.capacity().unwrap(), 32_768);

        let view_len = stream.get_buffer().unwrap().len();
        assert_eq!(view_len, 1_048_576);
        assert_eq!(stream.capacity().unwrap(), 1_048_576);

        stream.set_position(0).unwrap();
        let mut out = vec![0u8; payload.len()];
        stream.read_at(&mut out).unwrap();
        assert_eq!(out, payload);
    }

    #[test]
    fn test_get_buffer_on_small_stream_does_not_rent_large_buffer() {
        let manager = manager();
        let mut stream = manager.get_stream();
        stream.write_at(b"small payload").unwrap();

        let view = stream.get_buffer().unwrap();
        assert_eq!(view.len(), 16_384);
        assert_eq!(&view[..13], b"small payload");
        assert_eq!(manager.stats().large_pool_in_use_size, 0);
    }

    #[test]
    fn test_get_buffer_on_empty_stream_returns_block_sized_view() {
        let manager = manager();
        let mut stream = manager.get_stream();

        let view = stream.get_buffer().unwrap();
        assert_eq!(view.len(), 16_384);
        assert_eq!(manager.stats().large_pool_in_use_size, 0);
        assert_eq!(manager.stats().small_pool_in_use_size, 16_384);
    }

    #[test]
    fn test_get_buffer_stable_until_growth() {
        let mut stream = RecycledStream::new(manager());
        stream.write_at(&[1u8; 20_000]).unwrap();
        let first_ptr = stream.get_buffer().unwrap().as_ptr();
        let second_ptr = stream.get_buffer().unwrap().as_ptr();
        assert_eq!(first_ptr, second_ptr);
    }

    #[test]
    fn test_to_array_does_not_alias_get_buffer() {
        let mut stream = RecycledStream::new(manager());
        stream.write_at(b"hello world").unwrap();
        let array = stream.to_array().unwrap();
        let buffer_ptr = stream.get_buffer().unwrap().as_ptr();
        assert_ne!(array.as_ptr(), buffer_ptr);
        assert_eq!(&array, b"hello world");
    }

    #[test]
    fn test_write_to_sink() {
        let mut stream = RecycledStream::new(manager());
        stream.write_at(b"payload").unwrap();
        let mut out = Vec::new();
        stream.write_to(&mut out).unwrap();
        assert_eq!(out, b"payload");
    }
}
