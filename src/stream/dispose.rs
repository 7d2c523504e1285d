// src/stream/dispose.rs
//! Disposal: returning storage to the pool, and the double-dispose guard.

use std::fmt;
use std::sync::atomic::Ordering;

use crate::diagnostics::CallStack;
use crate::stream::backing::StreamBacking;
use crate::stream::core::{RecycledStream, DISPOSED, DISPOSING, LIVE};

impl RecycledStream {
    /// Return all held storage to the pool manager and mark the stream
    /// disposed. Idempotent: a second call (from this thread or another)
    /// does not double-free pool resources, and fires
    /// [`crate::events::EventSink::stream_double_dispose`] instead.
    ///
    /// Takes `&self` rather than `&mut self` so that concurrent calls from
    /// multiple threads against a shared `Arc<RecycledStream>` are well
    /// defined: exactly one call performs the pool return, and every other
    /// call blocks briefly until that return completes, then reports the
    /// double-dispose event.
    pub fn dispose(&self) {
        match self
            .state
            .compare_exchange(LIVE, DISPOSING, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => self.dispose_as_winner(),
            Err(_) => self.dispose_as_loser(),
        }
    }

    fn dispose_as_winner(&self) {
        let mut data = self.data.lock();
        if self.manager.generate_call_stacks() {
            data.dispose_stack_1 = Some(CallStack::capture_if(true));
        }
        let backing = std::mem::replace(&mut data.backing, StreamBacking::Empty);
        drop(data);
        // Best-effort: a release failure here (only possible on a
        // malformed batch, which this crate never constructs) is not
        // actionable from Drop, so it is swallowed after being logged.
        if let Err(err) = backing.release_all(&self.manager) {
            tracing::warn!(id = %self.id, %err, "pool return failed during dispose");
        }
        self.manager.sink().stream_disposed(self.id, self.tag.as_deref());
        self.state.store(DISPOSED, Ordering::Release);
    }

    fn dispose_as_loser(&self) {
        if self.manager.generate_call_stacks() {
            let mut data = self.data.lock();
            data.dispose_stack_2 = Some(CallStack::capture_if(true));
        }
        self.manager
            .sink()
            .stream_double_dispose(self.id, self.tag.as_deref());
        while self.state.load(Ordering::Acquire) != DISPOSED {
            std::hint::spin_loop();
        }
    }
}

impl Drop for RecycledStream {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Display for RecycledStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let length = self.data.lock().length;
        write!(
            f,
            "RecycledStream {{ id: {}, tag: {:?}, length: {} }}",
            self.id,
            self.tag.as_deref().unwrap_or("<untagged>"),
            length
        )
    }
}

impl fmt::Debug for RecycledStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
