// src/events.rs
//! Lifecycle event hooks fired by the pool manager and streams.
//!
//! Every call point here is paired with a `tracing` event at the same
//! place, so a binary that never registers a custom sink still gets
//! visibility through its `tracing` subscriber.

use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Why a large buffer was discarded instead of returned to its free list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LargeBufferDiscardReason {
    /// Buffer length is not a permitted pool size (an oversize rental).
    TooLarge,
    /// Returning it would push the large pool's free bytes past its cap.
    OverFreeCapacity,
}

impl fmt::Display for LargeBufferDiscardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLarge => write!(f, "too large to pool"),
            Self::OverFreeCapacity => write!(f, "free pool over capacity"),
        }
    }
}

/// Named lifecycle hooks a caller can subscribe to.
///
/// Default method bodies are no-ops, so implementors only need to override
/// the events they care about.
pub trait EventSink: Send + Sync {
    /// A new fixed-size block was allocated because the small pool's free
    /// list was empty.
    fn block_created(&self, _block_size: usize) {}

    /// A returned block was dropped instead of pooled (free-capacity cap).
    fn block_discarded(&self, _block_size: usize) {}

    /// A new large buffer was allocated at a permitted pool size.
    fn large_buffer_created(&self, _size: usize) {}

    /// An oversize large buffer was allocated; it will never be pooled.
    fn non_pooled_large_buffer_created(&self, _size: usize) {}

    /// A returned large buffer was dropped instead of pooled.
    fn large_buffer_discarded(&self, _size: usize, _reason: LargeBufferDiscardReason) {}

    /// A stream was constructed.
    fn stream_created(&self, _id: Uuid, _tag: Option<&str>) {}

    /// A stream completed its (first) disposal.
    fn stream_disposed(&self, _id: Uuid, _tag: Option<&str>) {}

    /// A stream's `dispose` was invoked more than once.
    fn stream_double_dispose(&self, _id: Uuid, _tag: Option<&str>) {}

    /// A stream's contents were copied out via `to_array`.
    fn stream_converted_to_array(&self, _id: Uuid, _length: u64) {}

    /// A stream's capacity grew beyond a size worth flagging to the sink
    /// (used by callers who want to watch for runaway growth).
    fn stream_over_capacity(&self, _id: Uuid, _requested: u64, _maximum: u64) {}
}

/// A sink shared between the pool manager and both of its pools, so that
/// [`crate::pool::PoolManager::set_event_sink`] reaches every hook rather
/// than only the stream-level ones the manager fires directly.
pub(crate) type SharedEventSink = Arc<parking_lot::RwLock<Arc<dyn EventSink>>>;

/// Wrap `sink` for sharing between a manager and its pools.
pub(crate) fn shared(sink: Arc<dyn EventSink>) -> SharedEventSink {
    Arc::new(parking_lot::RwLock::new(sink))
}

/// The default sink: every hook is a no-op.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventSink;

impl EventSink for NullEventSink {}

/// A sink that forwards every hook to `tracing`, at the level matching the
/// teacher's routine/lifecycle/discard split: `trace` for block/buffer
/// churn, `debug` for stream lifecycle, `warn` for discards and
/// over-capacity.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn block_created(&self, block_size: usize) {
        tracing::trace!(block_size, "block created");
    }

    fn block_discarded(&self, block_size: usize) {
        tracing::warn!(block_size, "block discarded");
    }

    fn large_buffer_created(&self, size: usize) {
        tracing::trace!(size, "large buffer created");
    }

    fn non_pooled_large_buffer_created(&self, size: usize) {
        tracing::trace!(size, "non-pooled large buffer created");
    }

    fn large_buffer_discarded(&self, size: usize, reason: LargeBufferDiscardReason) {
        tracing::warn!(size, %reason, "large buffer discarded");
    }

    fn stream_created(&self, id: Uuid, tag: Option<&str>) {
        tracing::debug!(%id, tag, "stream created");
    }

    fn stream_disposed(&self, id: Uuid, tag: Option<&str>) {
        tracing::debug!(%id, tag, "stream disposed");
    }

    fn stream_double_dispose(&self, id: Uuid, tag: Option<&str>) {
        tracing::warn!(%id, tag, "stream disposed more than once");
    }

    fn stream_converted_to_array(&self, id: Uuid, length: u64) {
        tracing::trace!(%id, length, "stream converted to array");
    }

    fn stream_over_capacity(&self, id: Uuid, requested: u64, maximum: u64) {
        tracing::warn!(%id, requested, maximum, "stream requested capacity above configured maximum");
    }
}
