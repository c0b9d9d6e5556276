//! The release entry point used by wrapper teardown paths.

use std::ffi::c_void;
use std::ptr::NonNull;
use std::sync::Arc;

use reap_core::{Deallocator, DeferredReleaser, FinalizerHandle};

/// Release the foreign buffer at `ptr` through `releaser`.
///
/// A null `ptr` is a no-op: no handle is created and `mark` is not
/// called. Otherwise exactly one [`FinalizerHandle`] is created and
/// marked. The buffer is never freed synchronously.
///
/// # Safety
///
/// A non-null `ptr` must be a live buffer allocated by the library
/// `dealloc` belongs to, released here exactly once, and not read by any
/// record view once `releaser` decides to free it.
#[allow(unsafe_code)]
pub unsafe fn release<R>(ptr: *mut c_void, dealloc: &Arc<dyn Deallocator>, releaser: &R)
where
    R: DeferredReleaser + ?Sized,
{
    let Some(ptr) = NonNull::new(ptr) else {
        return;
    };
    tracing::trace!(?ptr, "release");
    // SAFETY: forwarded from this function's contract.
    let handle = unsafe { FinalizerHandle::new(ptr, Arc::clone(dealloc)) };
    releaser.mark(handle);
}

#[cfg(test)]
#[allow(unsafe_code)]
mod tests {
    use super::*;
    use reap_test_utils::{MockDeallocator, RecordingReleaser};

    #[test]
    fn null_is_not_registered() {
        let mock = Arc::new(MockDeallocator::new());
        let dealloc: Arc<dyn Deallocator> = mock.clone();
        let releaser = RecordingReleaser::new();
        unsafe { release(std::ptr::null_mut(), &dealloc, &releaser) };
        assert_eq!(releaser.mark_count(), 0);
        assert_eq!(mock.free_count(), 0);
    }

    #[test]
    fn non_null_marks_exactly_one_handle_without_freeing() {
        let mock = Arc::new(MockDeallocator::new());
        let dealloc: Arc<dyn Deallocator> = mock.clone();
        let releaser = RecordingReleaser::new();
        unsafe { release(0xBEE0 as *mut c_void, &dealloc, &releaser) };
        assert_eq!(releaser.mark_count(), 1);
        assert_eq!(releaser.marked_ptrs(), vec![0xBEE0]);
        assert_eq!(mock.free_count(), 0);

        assert_eq!(releaser.free_all(), 1);
        assert_eq!(mock.freed(), vec![0xBEE0]);
    }
}
