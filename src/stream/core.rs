// src/stream/core.rs
//! The pooled, seekable byte stream and its state machine.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::diagnostics::CallStack;
use crate::error::{PoolError, Result};
use crate::pool::manager::PoolManager;
use crate::stream::backing::{locate, StreamBacking};

/// Largest position/length/capacity value the stream will accept,
/// matching a signed 32-bit byte count.
pub const MAX_STREAM_SIZE: u64 = i32::MAX as u64;

pub(crate) const LIVE: u8 = 0;
pub(crate) const DISPOSING: u8 = 1;
pub(crate) const DISPOSED: u8 = 2;

pub(crate) struct StreamData {
    pub(crate) length: u64,
    pub(crate) position: u64,
    pub(crate) backing: StreamBacking,
    pub(crate) dispose_stack_1: Option<CallStack>,
    pub(crate) dispose_stack_2: Option<CallStack>,
}

impl StreamData {
    fn empty() -> Self {
        Self {
            length: 0,
            position: 0,
            backing: StreamBacking::Empty,
            dispose_stack_1: None,
            dispose_stack_2: None,
        }
    }
}

/// A seekable, pool-backed byte stream.
///
/// Storage starts as a growable list of fixed-size blocks and is promoted
/// to a single contiguous buffer the first time a caller asks for one
/// (via [`RecycledStream::get_buffer`] or by requesting a contiguous
/// stream from the pool manager). Promotion never reverses. All storage
/// returns to the pool on [`RecycledStream::dispose`] or when the stream
/// is dropped.
pub struct RecycledStream {
    pub(crate) manager: Arc<PoolManager>,
    pub(crate) id: Uuid,
    pub(crate) tag: Option<String>,
    pub(crate) state: AtomicU8,
    pub(crate) data: Mutex<StreamData>,
    pub(crate) allocation_stack: Option<CallStack>,
}

impl RecycledStream {
    /// Construct a fresh, empty, untagged stream.
    pub fn new(manager: Arc<PoolManager>) -> Self {
        Self::build(manager, None, StreamBacking::Empty)
    }

    /// Construct a fresh, empty stream carrying `tag`.
    pub fn with_tag(manager: Arc<PoolManager>, tag: impl Into<String>) -> Self {
        Self::build(manager, Some(tag.into()), StreamBacking::Empty)
    }

    /// Construct a stream pre-sized to `required_size` bytes, acquired
    /// lazily as whole blocks.
    pub fn with_capacity(
        manager: Arc<PoolManager>,
        tag: impl Into<String>,
        required_size: usize,
    ) -> Result<Self> {
        let mut stream = Self::build(manager, Some(tag.into()), StreamBacking::Empty);
        let data = stream.data.get_mut();
        Self::grow_capacity(&stream.manager, stream.id, data, required_size as u64)?;
        Ok(stream)
    }

    /// Construct a stream pre-sized to `required_size` bytes as a single
    /// contiguous large buffer.
    pub fn with_contiguous_capacity(
        manager: Arc<PoolManager>,
        tag: impl Into<String>,
        required_size: usize,
    ) -> Result<Self> {
        let buffer = manager.acquire_large(required_size);
        let stream = Self::build(
            manager,
            Some(tag.into()),
            StreamBacking::Large {
                buffer,
                prior: None,
            },
        );
        Ok(stream)
    }

    /// Construct a stream whose initial content is a copy of `source`.
    pub fn from_slice(
        manager: Arc<PoolManager>,
        tag: impl Into<String>,
        source: &[u8],
    ) -> Result<Self> {
        let mut stream = Self::with_capacity(manager, tag, source.len())?;
        stream.write_at(source)?;
        stream.set_position(0)?;
        Ok(stream)
    }

    fn build(manager: Arc<PoolManager>, tag: Option<String>, backing: StreamBacking) -> Self {
        let id = Uuid::new_v4();
        let allocation_stack = if manager.generate_call_stacks() {
            Some(CallStack::capture_if(true))
        } else {
            None
        };
        manager.sink().stream_created(id, tag.as_deref());
        Self {
            id,
            tag,
            state: AtomicU8::new(LIVE),
            data: Mutex::new(StreamData {
                backing,
                ..StreamData::empty()
            }),
            allocation_stack,
            manager,
        }
    }

    pub(crate) fn check_live(&self) -> Result<()> {
        if self.state.load(Ordering::Acquire) != LIVE {
            return Err(PoolError::ObjectDisposed);
        }
        Ok(())
    }

    /// Opaque 128-bit stream identity, assigned at construction.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Caller-supplied tag, if any.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// `true` once `dispose` has completed (for either the winner or a
    /// concurrent loser waiting on it).
    pub fn is_disposed(&self) -> bool {
        self.state.load(Ordering::Acquire) == DISPOSED
    }

    /// Logical byte length of the stream's content.
    pub fn length(&self) -> Result<u64> {
        self.check_live()?;
        Ok(self.data.lock().length)
    }

    /// Current read/write cursor.
    pub fn position(&self) -> Result<u64> {
        self.check_live()?;
        Ok(self.data.lock().position)
    }

    /// Move the cursor to `v`. Does not allocate or affect `length`.
    pub fn set_position(&mut self, v: u64) -> Result<()> {
        self.check_live()?;
        if v > MAX_STREAM_SIZE {
            return Err(PoolError::ArgumentRange(format!(
                "position {v} exceeds maximum stream size"
            )));
        }
        self.data.get_mut().position = v;
        Ok(())
    }

    /// Bytes of backing storage currently held.
    pub fn capacity(&self) -> Result<u64> {
        self.check_live()?;
        let data = self.data.lock();
        Ok(data.backing.capacity(self.manager.block_size()))
    }

    /// Grow capacity to at least `v`. Never shrinks. Fails without
    /// mutating any state if growth would exceed the configured maximum
    /// stream capacity.
    pub fn set_capacity(&mut self, v: u64) -> Result<()> {
        self.check_live()?;
        let data = self.data.get_mut();
        Self::grow_capacity(&self.manager, self.id, data, v)
    }

    /// Set the logical length to `n`, growing capacity if needed. If the
    /// current position is beyond the new length, the position is pulled
    /// back to `n`.
    pub fn set_length(&mut self, n: u64) -> Result<()> {
        self.check_live()?;
        if n > MAX_STREAM_SIZE {
            return Err(PoolError::ArgumentRange(format!(
                "length {n} exceeds maximum stream size"
            )));
        }
        {
            let data = self.data.get_mut();
            Self::grow_capacity(&self.manager, self.id, data, n)?;
        }
        let data = self.data.get_mut();
        data.length = n;
        if data.position > n {
            data.position = n;
        }
        Ok(())
    }

    /// Grow `data.backing` so its capacity is at least `required`,
    /// respecting `maximum_stream_capacity`. Leaves `data` untouched on
    /// failure. A free function (rather than a method) so callers can
    /// hold a `&mut` borrow of `data` and a `&` borrow of `manager`
    /// simultaneously without fighting the borrow checker over `self`.
    pub(crate) fn grow_capacity(
        manager: &Arc<PoolManager>,
        id: Uuid,
        data: &mut StreamData,
        required: u64,
    ) -> Result<()> {
        let block_size = manager.block_size();
        let current = data.backing.capacity(block_size);
        if current >= required {
            return Ok(());
        }
        let block_size = block_size as u64;

        let max = manager.maximum_stream_capacity();
        if max != 0 && required > max {
            manager.sink().stream_over_capacity(id, required, max);
            return Err(PoolError::InvalidOperation(format!(
                "required capacity {required} exceeds maximum_stream_capacity {max}"
            )));
        }

        match &mut data.backing {
            StreamBacking::Empty => {
                let blocks_needed = required.div_ceil(block_size).max(1);
                let mut blocks = Vec::with_capacity(blocks_needed as usize);
                for _ in 0..blocks_needed {
                    blocks.push(manager.acquire_block());
                }
                data.backing = StreamBacking::Blocks(blocks);
                Ok(())
            }
            StreamBacking::Blocks(blocks) => {
                let blocks_needed = required.div_ceil(block_size) as usize;
                while blocks.len() < blocks_needed {
                    blocks.push(manager.acquire_block());
                }
                Ok(())
            }
            StreamBacking::Large { buffer, .. } => {
                let new_size = manager
                    .permitted_large_size(required as usize)
                    .unwrap_or(required as usize);
                let mut new_buffer = manager.acquire_large(new_size);
                new_buffer[..buffer.len()].copy_from_slice(buffer);
                let aggressive = manager.aggressive_buffer_return();
                let old = std::mem::replace(buffer, new_buffer);
                if aggressive {
                    manager.release_large(old)?;
                } else {
                    let backing = std::mem::replace(&mut data.backing, StreamBacking::Empty);
                    if let StreamBacking::Large { buffer, prior } = backing {
                        data.backing = StreamBacking::Large {
                            buffer,
                            prior: Some(Box::new(StreamBacking::Large {
                                buffer: old,
                                prior,
                            })),
                        };
                    }
                }
                Ok(())
            }
        }
    }

    /// Promote block-mode storage to a single contiguous large buffer
    /// able to hold at least `data.length` bytes, or grow the existing
    /// large buffer. A free function for the same borrow-checker reasons
    /// as [`RecycledStream::grow_capacity`].
    pub(crate) fn promote_to_large(
        manager: &Arc<PoolManager>,
        data: &mut StreamData,
    ) -> Result<()> {
        let block_size = manager.block_size() as u64;
        let required = data.length.max(1);

        let needs_new_buffer = match &data.backing {
            StreamBacking::Large { buffer, .. } => (buffer.len() as u64) < required,
            _ => true,
        };
        if !needs_new_buffer {
            return Ok(());
        }

        let target_size = manager
            .permitted_large_size(required as usize)
            .unwrap_or(required as usize)
            .max(block_size as usize);

        let mut new_buffer = manager.acquire_large(target_size);
        let old = std::mem::replace(&mut data.backing, StreamBacking::Empty);
        match &old {
            StreamBacking::Blocks(blocks) => {
                let mut written = 0usize;
                for block in blocks {
                    let take = block.len().min(new_buffer.len() - written);
                    new_buffer[written..written + take].copy_from_slice(&block[..take]);
                    written += take;
                    if written >= new_buffer.len() {
                        break;
                    }
                }
            }
            StreamBacking::Large { buffer, .. } => {
                let take = buffer.len().min(new_buffer.len());
                new_buffer[..take].copy_from_slice(&buffer[..take]);
            }
            StreamBacking::Empty => {}
        }

        let aggressive = manager.aggressive_buffer_return();
        if aggressive {
            old.release_all(manager)?;
            data.backing = StreamBacking::Large {
                buffer: new_buffer,
                prior: None,
            };
        } else {
            data.backing = StreamBacking::Large {
                buffer: new_buffer,
                prior: Some(Box::new(old)),
            };
        }
        Ok(())
    }

    /// Translate a logical offset into its `(block_index, intra_offset)`
    /// coordinates under the current block size.
    pub(crate) fn locate(&self, offset: u64) -> (usize, usize) {
        locate(offset, self.manager.block_size())
    }
}
