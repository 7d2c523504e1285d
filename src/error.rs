// src/error.rs
//! Error taxonomy for pool and stream operations.

use std::fmt;

/// Errors that can occur during pool manager and stream operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// An offset, count, position or length fell outside its valid range
    /// (e.g. above `i32::MAX`, or a seek origin computed a negative
    /// absolute target before the I/O check below even runs).
    ArgumentRange(String),
    /// An argument's shape was structurally invalid: a wrong-sized block in
    /// a `release` batch, a zero-length large buffer returned, or a
    /// `PoolManagerConfig` rule violation caught at construction time.
    ArgumentInvalid(String),
    /// An I/O-shaped failure: seeking to a negative absolute position, or a
    /// write whose endpoint would exceed the addressable range.
    Io(String),
    /// The operation is not permitted given the stream's configuration,
    /// most commonly a capacity grow that would exceed
    /// `maximum_stream_capacity`.
    InvalidOperation(String),
    /// The stream has already been disposed; every operation except a
    /// further `dispose()` (or drop) fails with this.
    ObjectDisposed,
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArgumentRange(msg) => write!(f, "argument out of range: {msg}"),
            Self::ArgumentInvalid(msg) => write!(f, "invalid argument: {msg}"),
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
            Self::InvalidOperation(msg) => write!(f, "invalid operation: {msg}"),
            Self::ObjectDisposed => write!(f, "stream has already been disposed"),
        }
    }
}

impl std::error::Error for PoolError {}

/// Convert a [`PoolError`] to [`std::io::Error`], matching the error kind a
/// `std::io::{Read, Write, Seek}` implementation is expected to surface.
impl From<PoolError> for std::io::Error {
    fn from(err: PoolError) -> Self {
        use std::io::ErrorKind;
        match &err {
            PoolError::Io(msg) => std::io::Error::new(ErrorKind::InvalidInput, msg.clone()),
            PoolError::ArgumentRange(_) | PoolError::ArgumentInvalid(_) => {
                std::io::Error::new(ErrorKind::InvalidInput, err)
            }
            PoolError::InvalidOperation(_) | PoolError::ObjectDisposed => {
                std::io::Error::new(ErrorKind::Other, err)
            }
        }
    }
}

/// Convert a bare `std::io::Error` back into a `PoolError`, for code that
/// calls into another `Write`/`Read` sink from inside a pool operation (see
/// `RecycledStream::write_to`).
impl From<std::io::Error> for PoolError {
    fn from(err: std::io::Error) -> Self {
        PoolError::Io(err.to_string())
    }
}

/// Result type alias for pool and stream operations.
pub type Result<T> = std::result::Result<T, PoolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_io() {
        let err = PoolError::Io("seek to negative offset".into());
        let io_err: std::io::Error = err.into();
        assert_eq!(io_err.kind(), std::io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_object_disposed_display() {
        assert!(PoolError::ObjectDisposed.to_string().contains("disposed"));
    }

    #[test]
    fn test_invalid_operation_display() {
        let err = PoolError::InvalidOperation("capacity grow exceeds limit".into());
        assert!(err.to_string().contains("capacity grow exceeds limit"));
    }
}
