// src/pool/large.rs
//! Free lists of contiguous large buffers, bucketed by permitted size.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use zeroize::Zeroize;

use crate::error::{PoolError, Result};
use crate::events::{LargeBufferDiscardReason, SharedEventSink};

/// A contiguous byte array owned either by a large pool's free list or by
/// exactly one stream. May be an unpooled, oversize rental whose length
/// is not one of the pool's permitted bucket sizes.
#[derive(Debug)]
pub struct LargeBuffer(Box<[u8]>);

impl LargeBuffer {
    fn zeroed(size: usize) -> Self {
        Self(vec![0u8; size].into_boxed_slice())
    }

    fn zero_fill(&mut self) {
        self.0.zeroize();
    }

    /// Buffer length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` when the buffer has zero length.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::ops::Deref for LargeBuffer {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl std::ops::DerefMut for LargeBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }
}

struct Inner {
    free: BTreeMap<usize, Vec<LargeBuffer>>,
    free_bytes: usize,
    in_use_bytes: usize,
}

/// The pool of contiguous large buffers, bucketed by permitted size under
/// either a linear (`k * multiple`) or exponential (`multiple * 2^i`)
/// sizing rule.
pub struct LargePool {
    multiple: usize,
    maximum_buffer_size: usize,
    exponential: bool,
    maximum_free_bytes: usize,
    inner: Mutex<Inner>,
    sink: SharedEventSink,
}

impl LargePool {
    pub fn new(
        multiple: usize,
        maximum_buffer_size: usize,
        exponential: bool,
        maximum_free_bytes: usize,
        sink: SharedEventSink,
    ) -> Self {
        Self {
            multiple,
            maximum_buffer_size,
            exponential,
            maximum_free_bytes,
            inner: Mutex::new(Inner {
                free: BTreeMap::new(),
                free_bytes: 0,
                in_use_bytes: 0,
            }),
            sink,
        }
    }

    /// The smallest permitted bucket size that is `>= required`, if
    /// `required` does not exceed `maximum_buffer_size`.
    pub fn permitted_size(&self, required: usize) -> Option<usize> {
        if required > self.maximum_buffer_size {
            return None;
        }
        Some(self.round_up(required))
    }

    /// Round `required` up to the next size that the active sizing rule
    /// would produce, ignoring `maximum_buffer_size` (used both for
    /// in-range requests and to compute an oversize rental's length).
    fn round_up(&self, required: usize) -> usize {
        let required = required.max(1);
        if self.exponential {
            let mut value = self.multiple;
            while value < required {
                value *= 2;
            }
            value
        } else {
            let k = required.div_ceil(self.multiple);
            k * self.multiple
        }
    }

    /// `true` if `size` is one of the buckets the active sizing rule
    /// produces at or below `maximum_buffer_size`.
    fn is_permitted_bucket(&self, size: usize) -> bool {
        if size == 0 || size > self.maximum_buffer_size {
            return false;
        }
        if self.exponential {
            let mut value = self.multiple;
            while value < size {
                value *= 2;
            }
            value == size
        } else {
            size % self.multiple == 0
        }
    }

    /// Rent a buffer of at least `required` bytes. Requests above
    /// `maximum_buffer_size` are served as unpooled, oversize rentals.
    pub fn acquire(&self, required: usize) -> LargeBuffer {
        if required > self.maximum_buffer_size {
            let size = self.round_up(required);
            self.sink.read().non_pooled_large_buffer_created(size);
            let mut inner = self.inner.lock();
            inner.in_use_bytes += size;
            return LargeBuffer::zeroed(size);
        }

        let size = self.round_up(required);
        let mut inner = self.inner.lock();
        let bucket = inner.free.get_mut(&size);
        let buffer = match bucket.and_then(|v| v.pop()) {
            Some(buffer) => {
                inner.free_bytes -= size;
                buffer
            }
            None => {
                drop(inner);
                self.sink.read().large_buffer_created(size);
                let buffer = LargeBuffer::zeroed(size);
                self.inner.lock().in_use_bytes += size;
                return buffer;
            }
        };
        inner.in_use_bytes += size;
        buffer
    }

    /// Return a buffer to the pool, or drop it if it is oversize or would
    /// push the free pool past its cap.
    pub fn release(&self, mut buffer: LargeBuffer) -> Result<()> {
        let size = buffer.len();
        if size == 0 {
            return Err(PoolError::ArgumentInvalid(
                "cannot return a zero-length large buffer".into(),
            ));
        }

        let mut inner = self.inner.lock();
        inner.in_use_bytes -= size;

        if !self.is_permitted_bucket(size) {
            drop(inner);
            drop(buffer);
            self.sink
                .read()
                .large_buffer_discarded(size, LargeBufferDiscardReason::TooLarge);
            return Ok(());
        }

        let would_exceed =
            self.maximum_free_bytes != 0 && inner.free_bytes + size > self.maximum_free_bytes;
        if would_exceed {
            drop(inner);
            drop(buffer);
            self.sink
                .read()
                .large_buffer_discarded(size, LargeBufferDiscardReason::OverFreeCapacity);
            return Ok(());
        }

        buffer.zero_fill();
        inner.free_bytes += size;
        inner.free.entry(size).or_default().push(buffer);
        Ok(())
    }

    pub fn free_size(&self) -> usize {
        self.inner.lock().free_bytes
    }

    pub fn in_use_size(&self) -> usize {
        self.inner.lock().in_use_bytes
    }
}
