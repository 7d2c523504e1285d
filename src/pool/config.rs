// src/pool/config.rs
//! Configuration for the pool manager.

use crate::error::{PoolError, Result};

/// Validated, immutable-after-construction sizing rules for a
/// [`crate::pool::PoolManager`], plus the knobs that remain mutable for
/// the lifetime of the manager.
#[derive(Debug, Clone)]
pub struct PoolManagerConfig {
    /// Size of every block handed out by the small pool, in bytes.
    pub block_size: usize,
    /// Step between permitted large-buffer sizes (linear mode) or the base
    /// value that gets doubled (exponential mode).
    pub large_buffer_multiple: usize,
    /// Largest large-buffer size the pool will track in a bucket. Requests
    /// above this are served as unpooled, oversize rentals.
    pub maximum_buffer_size: usize,
    /// `true` selects exponential bucket sizing (`multiple * 2^i`);
    /// `false` selects linear (`k * multiple`).
    pub use_exponential_large_buffer: bool,
    /// Return a stream's prior storage to the pool immediately on
    /// promotion/regrow instead of holding it until dispose.
    pub aggressive_buffer_return: bool,
    /// Upper bound on a single stream's capacity; `0` means unbounded.
    pub maximum_stream_capacity: u64,
    /// Upper bound on the small pool's free bytes; `0` means unbounded.
    pub maximum_free_small_pool_bytes: usize,
    /// Upper bound on the large pool's free bytes; `0` means unbounded.
    pub maximum_free_large_pool_bytes: usize,
    /// Capture allocation/dispose call stacks for diagnostics.
    pub generate_call_stacks: bool,
}

impl Default for PoolManagerConfig {
    fn default() -> Self {
        Self {
            block_size: 128 * 1024,
            large_buffer_multiple: 1024 * 1024,
            maximum_buffer_size: 128 * 1024 * 1024,
            use_exponential_large_buffer: false,
            aggressive_buffer_return: false,
            maximum_stream_capacity: 0,
            maximum_free_small_pool_bytes: 0,
            maximum_free_large_pool_bytes: 0,
            generate_call_stacks: false,
        }
    }
}

impl PoolManagerConfig {
    /// Build a config with the four sizing parameters that determine the
    /// permitted large-buffer bucket set; the remaining fields take their
    /// `Default` values.
    pub fn new(
        block_size: usize,
        large_buffer_multiple: usize,
        maximum_buffer_size: usize,
        use_exponential_large_buffer: bool,
    ) -> Self {
        Self {
            block_size,
            large_buffer_multiple,
            maximum_buffer_size,
            use_exponential_large_buffer,
            ..Self::default()
        }
    }

    /// Preset matching the test suite's small, easy-to-reason-about
    /// geometry (16 KiB blocks, 1 MiB multiple, 8 MiB ceiling, linear).
    pub fn small_test() -> Self {
        Self::new(16 * 1024, 1024 * 1024, 8 * 1024 * 1024, false)
    }

    /// Validate the sizing rules, returning the matching [`PoolError`] for
    /// the first violation found.
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(PoolError::ArgumentRange(
                "block_size must be greater than zero".into(),
            ));
        }
        if self.large_buffer_multiple == 0 {
            return Err(PoolError::ArgumentRange(
                "large_buffer_multiple must be greater than zero".into(),
            ));
        }
        if self.maximum_buffer_size < self.block_size {
            return Err(PoolError::ArgumentInvalid(
                "maximum_buffer_size must be at least block_size".into(),
            ));
        }
        if self.use_exponential_large_buffer {
            let mut value = self.large_buffer_multiple;
            loop {
                if value == self.maximum_buffer_size {
                    break;
                }
                if value > self.maximum_buffer_size {
                    return Err(PoolError::ArgumentInvalid(
                        "maximum_buffer_size is not an exact power-of-two multiple of large_buffer_multiple".into(),
                    ));
                }
                value *= 2;
            }
        } else if self.maximum_buffer_size % self.large_buffer_multiple != 0 {
            return Err(PoolError::ArgumentInvalid(
                "maximum_buffer_size is not an exact multiple of large_buffer_multiple".into(),
            ));
        }
        Ok(())
    }
}
