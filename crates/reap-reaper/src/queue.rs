//! Safe-point release queue.
//!
//! Some hosts have a natural moment at which no record can be in use:
//! a lock acquisition, the top of an event-loop turn, the end of a GC
//! pass. [`DeferredQueue`] collects handles from any thread and frees them
//! only when the owner calls [`process_all`](DeferredQueue::process_all)
//! at such a point.
//!
//! ```ignore
//! let queue = DeferredQueue::new();
//!
//! // From any thread, while tearing down a wrapper:
//! unsafe { release(ptr, &dealloc, &queue) };
//!
//! // Later, at a safe point on the owning thread:
//! queue.process_all();
//! ```

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use reap_core::{DeferredReleaser, FinalizerHandle};

/// Thread-safe queue of handles awaiting a safe point.
pub struct DeferredQueue {
    queue: Mutex<VecDeque<FinalizerHandle>>,
    /// Lock-free pending count for the fast path.
    pending_count: AtomicU64,
    /// Held for the whole of a drain so two drains never free concurrently.
    drain: Mutex<()>,
}

impl Default for DeferredQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl DeferredQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::with_capacity(8)),
            pending_count: AtomicU64::new(0),
            drain: Mutex::new(()),
        }
    }

    /// Whether any handle is waiting.
    #[inline]
    pub fn has_pending(&self) -> bool {
        self.pending_count.load(Ordering::Acquire) > 0
    }

    /// Number of waiting handles.
    #[inline]
    pub fn len(&self) -> u64 {
        self.pending_count.load(Ordering::Acquire)
    }

    /// Whether the queue is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        !self.has_pending()
    }

    /// Free every waiting handle, in mark order. Returns how many were
    /// freed (including any whose deallocator panicked).
    ///
    /// Call only at a point where no record over a queued buffer can be
    /// enumerating.
    pub fn process_all(&self) -> usize {
        if !self.has_pending() {
            return 0;
        }

        let _drain = self.drain.lock().unwrap_or_else(PoisonError::into_inner);
        let handles = std::mem::take(
            &mut *self.queue.lock().unwrap_or_else(PoisonError::into_inner),
        );
        let count = handles.len();
        if count == 0 {
            return 0;
        }

        for handle in handles {
            let ptr = handle.as_ptr();
            if panic::catch_unwind(AssertUnwindSafe(|| handle.free())).is_err() {
                tracing::error!(?ptr, "deallocator panicked");
            }
        }
        self.pending_count
            .fetch_sub(count as u64, Ordering::Release);

        tracing::trace!("Processed {} deferred releases", count);
        count
    }
}

impl DeferredReleaser for DeferredQueue {
    fn mark(&self, handle: FinalizerHandle) {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        queue.push_back(handle);
        // Counted under the queue lock so a concurrent drain never takes
        // a handle it has not seen counted.
        self.pending_count.fetch_add(1, Ordering::Release);
        drop(queue);

        tracing::trace!("Deferred buffer release (pending: {})", self.len());
    }
}

impl Drop for DeferredQueue {
    fn drop(&mut self) {
        let freed = self.process_all();
        if freed > 0 {
            tracing::debug!("Released {} buffers on queue drop", freed);
        }
    }
}

impl std::fmt::Debug for DeferredQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredQueue")
            .field("pending_count", &self.len())
            .finish()
    }
}
