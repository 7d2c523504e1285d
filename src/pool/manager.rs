// src/pool/manager.rs
//! The pool manager: owns the small and large pools, validates
//! configuration, and is the sole factory for streams.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::Result;
use crate::events::{self, EventSink, NullEventSink, SharedEventSink};
use crate::pool::block::Block;
use crate::pool::config::PoolManagerConfig;
use crate::pool::large::{LargeBuffer, LargePool};
use crate::pool::small::SmallPool;
use crate::pool::stats::PoolManagerStats;
use crate::stream::RecycledStream;

/// Owns the small and large pools and mediates every block/large-buffer
/// rental and return. Shared across threads via `Arc<PoolManager>`.
pub struct PoolManager {
    small: SmallPool,
    large: LargePool,
    aggressive_buffer_return: AtomicBool,
    maximum_stream_capacity: AtomicU64,
    generate_call_stacks: AtomicBool,
    maximum_free_small_pool_bytes: AtomicUsize,
    sink: SharedEventSink,
}

impl PoolManager {
    /// Validate `config` and construct a manager, or fail with the
    /// matching error.
    pub fn new(config: PoolManagerConfig) -> Result<Self> {
        config.validate()?;
        let sink: SharedEventSink = events::shared(Arc::new(NullEventSink));
        Ok(Self {
            small: SmallPool::new(
                config.block_size,
                config.maximum_free_small_pool_bytes,
                Arc::clone(&sink),
            ),
            large: LargePool::new(
                config.large_buffer_multiple,
                config.maximum_buffer_size,
                config.use_exponential_large_buffer,
                config.maximum_free_large_pool_bytes,
                Arc::clone(&sink),
            ),
            aggressive_buffer_return: AtomicBool::new(config.aggressive_buffer_return),
            maximum_stream_capacity: AtomicU64::new(config.maximum_stream_capacity),
            generate_call_stacks: AtomicBool::new(config.generate_call_stacks),
            maximum_free_small_pool_bytes: AtomicUsize::new(config.maximum_free_small_pool_bytes),
            sink,
        })
    }

    /// Replace the event sink used for future lifecycle notifications.
    ///
    /// The small and large pools share this same sink reference, so this
    /// reaches every hook in [`EventSink`] — block/large-buffer churn as
    /// well as stream lifecycle events — not just the ones the manager
    /// fires directly.
    pub fn set_event_sink(&self, sink: Arc<dyn EventSink>) {
        *self.sink.write() = sink;
    }

    pub(crate) fn sink(&self) -> Arc<dyn EventSink> {
        self.sink.read().clone()
    }

    pub fn block_size(&self) -> usize {
        self.small.block_size()
    }

    pub fn aggressive_buffer_return(&self) -> bool {
        self.aggressive_buffer_return.load(Ordering::Relaxed)
    }

    pub fn set_aggressive_buffer_return(&self, value: bool) {
        self.aggressive_buffer_return.store(value, Ordering::Relaxed);
    }

    pub fn maximum_stream_capacity(&self) -> u64 {
        self.maximum_stream_capacity.load(Ordering::Relaxed)
    }

    pub fn set_maximum_stream_capacity(&self, value: u64) {
        self.maximum_stream_capacity.store(value, Ordering::Relaxed);
    }

    pub fn generate_call_stacks(&self) -> bool {
        self.generate_call_stacks.load(Ordering::Relaxed)
    }

    pub fn set_generate_call_stacks(&self, value: bool) {
        self.generate_call_stacks.store(value, Ordering::Relaxed);
    }

    /// `0` means unbounded (the public accessor mirrors the config field
    /// of the same name).
    pub fn maximum_free_small_pool_bytes(&self) -> usize {
        self.maximum_free_small_pool_bytes.load(Ordering::Relaxed)
    }

    pub(crate) fn acquire_block(&self) -> Block {
        self.small.acquire()
    }

    pub(crate) fn release_blocks(&self, blocks: Vec<Block>) -> Result<()> {
        self.small.release(blocks)
    }

    pub(crate) fn acquire_large(&self, required: usize) -> LargeBuffer {
        self.large.acquire(required)
    }

    pub(crate) fn release_large(&self, buffer: LargeBuffer) -> Result<()> {
        self.large.release(buffer)
    }

    pub(crate) fn permitted_large_size(&self, required: usize) -> Option<usize> {
        self.large.permitted_size(required)
    }

    /// A consistent point-in-time snapshot of pool byte counters.
    pub fn stats(&self) -> PoolManagerStats {
        PoolManagerStats {
            small_pool_free_size: self.small.free_size(),
            small_pool_in_use_size: self.small.in_use_size(),
            large_pool_free_size: self.large.free_size(),
            large_pool_in_use_size: self.large.in_use_size(),
        }
    }

    /// Construct a fresh, empty, untagged stream.
    pub fn get_stream(self: &Arc<Self>) -> RecycledStream {
        RecycledStream::new(Arc::clone(self))
    }

    /// Construct a fresh, empty stream carrying a caller-supplied tag.
    pub fn get_stream_with_tag(self: &Arc<Self>, tag: impl Into<String>) -> RecycledStream {
        RecycledStream::with_tag(Arc::clone(self), tag)
    }

    /// Construct a stream pre-sized to `required_size` bytes of capacity,
    /// allocated lazily in block mode.
    pub fn get_stream_with_capacity(
        self: &Arc<Self>,
        tag: impl Into<String>,
        required_size: usize,
    ) -> Result<RecycledStream> {
        RecycledStream::with_capacity(Arc::clone(self), tag, required_size)
    }

    /// Construct a stream pre-sized to `required_size` bytes, either as a
    /// single contiguous large buffer (`contiguous = true`) or lazily
    /// block-by-block (`contiguous = false`).
    pub fn get_stream_contiguous(
        self: &Arc<Self>,
        tag: impl Into<String>,
        required_size: usize,
        contiguous: bool,
    ) -> Result<RecycledStream> {
        if contiguous {
            RecycledStream::with_contiguous_capacity(Arc::clone(self), tag, required_size)
        } else {
            RecycledStream::with_capacity(Arc::clone(self), tag, required_size)
        }
    }

    /// Construct a stream whose initial content is a copy of `source`.
    /// `source` is not retained; the returned stream's storage never
    /// aliases it.
    pub fn get_stream_from_slice(
        self: &Arc<Self>,
        tag: impl Into<String>,
        source: &[u8],
    ) -> Result<RecycledStream> {
        RecycledStream::from_slice(Arc::clone(self), tag, source)
    }
}

impl Default for PoolManager {
    fn default() -> Self {
        Self::new(PoolManagerConfig::default()).expect("default configuration is always valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_manager_is_empty() {
        let manager = PoolManager::default();
        let stats = manager.stats();
        assert_eq!(stats.small_pool_in_use_size, 0);
        assert_eq!(stats.large_pool_in_use_size, 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PoolManagerConfig::new(0, 1024, 8192, false);
        assert!(PoolManager::new(config).is_err());
    }

    #[test]
    fn test_block_round_trip_through_manager() {
        let manager = PoolManager::new(PoolManagerConfig::small_test()).unwrap();
        let block = manager.acquire_block();
        assert_eq!(manager.stats().small_pool_in_use_size, manager.block_size());
        manager.release_blocks(vec![block]).unwrap();
        assert_eq!(manager.stats().small_pool_in_use_size, 0);
        assert_eq!(manager.stats().small_pool_free_size, manager.block_size());
    }

    #[derive(Default)]
    struct CountingSink {
        blocks_created: std::sync::atomic::AtomicUsize,
        large_buffers_created: std::sync::atomic::AtomicUsize,
    }

    impl EventSink for CountingSink {
        fn block_created(&self, _block_size: usize) {
            self.blocks_created.fetch_add(1, Ordering::Relaxed);
        }

        fn large_buffer_created(&self, _size: usize) {
            self.large_buffers_created.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn test_custom_sink_set_after_construction_observes_pool_events() {
        let manager = PoolManager::new(PoolManagerConfig::small_test()).unwrap();
        let sink = Arc::new(CountingSink::default());
        manager.set_event_sink(sink.clone());

        let block = manager.acquire_block();
        manager.release_blocks(vec![block]).unwrap();
        let buffer = manager.acquire_large(1_000_000);
        manager.release_large(buffer).unwrap();

        assert_eq!(sink.blocks_created.load(Ordering::Relaxed), 1);
        assert_eq!(sink.large_buffers_created.load(Ordering::Relaxed), 1);
    }
}
