// src/diagnostics.rs
//! Optional allocation/dispose call-stack capture.
//!
//! Disabled by default; when a `PoolManager` is configured with
//! `generate_call_stacks`, streams record a [`std::backtrace::Backtrace`]
//! at construction and at each dispose, to aid tracking down code that
//! leaks streams or disposes them more than once.

use std::backtrace::Backtrace;
use std::fmt;

/// A captured call stack, or the absence of one when diagnostics are off.
#[derive(Default)]
pub struct CallStack(Option<Backtrace>);

impl CallStack {
    /// Capture the current call stack if `enabled`, else record nothing.
    pub fn capture_if(enabled: bool) -> Self {
        if enabled {
            Self(Some(Backtrace::capture()))
        } else {
            Self(None)
        }
    }

    /// `true` if a backtrace was actually captured.
    pub fn is_present(&self) -> bool {
        self.0.is_some()
    }
}

impl fmt::Debug for CallStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(bt) => write!(f, "{bt}"),
            None => write!(f, "<call stack capture disabled>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_capture_is_absent() {
        let stack = CallStack::capture_if(false);
        assert!(!stack.is_present());
    }

    #[test]
    fn test_enabled_capture_is_present() {
        let stack = CallStack::capture_if(true);
        assert!(stack.is_present());
    }
}
