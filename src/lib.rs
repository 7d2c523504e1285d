// src/lib.rs
//! # streampool
//!
//! A pooled, seekable byte-stream allocator: [`RecycledStream`] behaves
//! like an in-memory file, but its backing storage is rented from a
//! [`PoolManager`] and returned on disposal instead of going through the
//! allocator on every resize.
//!
//! Streams start out backed by a growable list of fixed-size blocks and
//! are promoted, on demand, to a single contiguous buffer once a caller
//! asks for a contiguous view via [`RecycledStream::get_buffer`]. This
//! keeps small, short-lived streams cheap (a handful of block rentals)
//! while still giving callers who need a contiguous `&[u8]` one without
//! a copy-on-every-write design.
//!
//! ```
//! use std::io::{Read, Write};
//! use std::sync::Arc;
//! use streampool::prelude::*;
//!
//! let manager = Arc::new(PoolManager::default());
//! let mut stream = manager.get_stream();
//! stream.write_all(b"hello pool").unwrap();
//! stream.set_position(0).unwrap();
//!
//! let mut out = String::new();
//! stream.read_to_string(&mut out).unwrap();
//! assert_eq!(out, "hello pool");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod diagnostics;
pub mod error;
pub mod events;
pub mod pool;
pub mod stream;

pub use error::{PoolError, Result};
pub use events::{EventSink, LargeBufferDiscardReason, NullEventSink, TracingEventSink};
pub use pool::{PoolManager, PoolManagerConfig, PoolManagerStats};
pub use stream::{RecycledStream, MAX_STREAM_SIZE};

/// Commonly used imports.
pub mod prelude {
    pub use crate::error::{PoolError, Result};
    pub use crate::events::{EventSink, LargeBufferDiscardReason, NullEventSink, TracingEventSink};
    pub use crate::pool::{PoolManager, PoolManagerConfig, PoolManagerStats};
    pub use crate::stream::RecycledStream;
}
