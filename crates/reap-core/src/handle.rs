//! Move-only release capability and the releaser contract.
//!
//! A [`FinalizerHandle`] stands for "the one permitted deallocation of
//! one buffer". [`free`](FinalizerHandle::free) consumes it, so a single
//! handle cannot be freed twice. Handles are not freed on drop: the
//! foreign deallocation call only ever happens when a
//! [`DeferredReleaser`] decides it is safe.

use std::ffi::c_void;
use std::fmt;
use std::ptr::NonNull;
use std::sync::Arc;

use crate::dealloc::Deallocator;

/// Capability to free exactly one foreign buffer.
///
/// Dropping a handle without calling [`free`](Self::free) leaks the buffer.
#[must_use = "dropping a FinalizerHandle leaks its buffer; pass it to a DeferredReleaser"]
pub struct FinalizerHandle {
    ptr: NonNull<c_void>,
    dealloc: Arc<dyn Deallocator>,
}

// SAFETY: the handle is the sole owner of the right to free `ptr` and
// never dereferences it. The deallocator is `Send + Sync` by trait bound.
#[allow(unsafe_code)]
unsafe impl Send for FinalizerHandle {}

impl FinalizerHandle {
    /// Wrap `ptr` together with the routine that frees it.
    ///
    /// # Safety
    ///
    /// - `ptr` must have been allocated by the foreign library `dealloc`
    ///   belongs to and must not have been freed yet.
    /// - No other `FinalizerHandle` for `ptr` may exist or be created
    ///   later. Two handles for one buffer is a double free.
    #[allow(unsafe_code)]
    pub unsafe fn new(ptr: NonNull<c_void>, dealloc: Arc<dyn Deallocator>) -> Self {
        Self { ptr, dealloc }
    }

    /// The buffer this handle will free.
    pub fn as_ptr(&self) -> *mut c_void {
        self.ptr.as_ptr()
    }

    /// Issue the foreign deallocation call for the buffer.
    ///
    /// Consumes the handle. The caller (normally a [`DeferredReleaser`])
    /// must ensure no record view still reads the buffer.
    pub fn free(self) {
        tracing::debug!(ptr = ?self.ptr, "free_buffer");
        self.dealloc.free_buffer(self.ptr);
    }
}

impl fmt::Debug for FinalizerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FinalizerHandle")
            .field("ptr", &self.ptr)
            .finish_non_exhaustive()
    }
}

/// A service that frees submitted handles later, at a safe point.
///
/// Implementations free each marked handle at most once and never
/// concurrently with another `free` from the same releaser. `mark` must
/// not block on the foreign library and must not free the handle
/// synchronously.
///
/// A releaser may free a handle as soon as it is marked. The caller of
/// `mark` (or of `release`) must ensure no record over the buffer is
/// still being enumerated.
pub trait DeferredReleaser {
    /// Register `handle` for deferred release.
    fn mark(&self, handle: FinalizerHandle);
}

impl<R: DeferredReleaser + ?Sized> DeferredReleaser for &R {
    fn mark(&self, handle: FinalizerHandle) {
        (**self).mark(handle)
    }
}

impl<R: DeferredReleaser + ?Sized> DeferredReleaser for Arc<R> {
    fn mark(&self, handle: FinalizerHandle) {
        (**self).mark(handle)
    }
}
