//! The foreign library's deallocation routine.

use std::ffi::c_void;
use std::fmt;
use std::ptr::NonNull;

/// Issues the foreign library's deallocation call for one buffer.
///
/// Implementations are not expected to be idempotent. Whoever calls
/// [`free_buffer`](Deallocator::free_buffer) must guarantee that:
///
/// - `ptr` was produced by the foreign library this deallocator belongs to
/// - `ptr` is freed at most once
/// - no view of the buffer is in use when the call happens
///
/// [`FinalizerHandle`](crate::FinalizerHandle) is the only caller in this
/// workspace and upholds these through its `unsafe` constructor.
pub trait Deallocator: Send + Sync {
    /// Release the buffer at `ptr`.
    fn free_buffer(&self, ptr: NonNull<c_void>);
}

impl<F> Deallocator for F
where
    F: Fn(NonNull<c_void>) + Send + Sync,
{
    fn free_buffer(&self, ptr: NonNull<c_void>) {
        self(ptr)
    }
}

/// Signature of a C deallocation routine: `void free_buffer(void *)`.
pub type BufferFreeFn = unsafe extern "C" fn(*mut c_void);

/// [`Deallocator`] backed by a C function pointer.
#[derive(Clone, Copy)]
pub struct ExternDeallocator {
    free_fn: BufferFreeFn,
}

impl ExternDeallocator {
    /// Wrap a foreign deallocation routine.
    ///
    /// # Safety
    ///
    /// `free_fn` must be safe to call from any thread with any non-null
    /// pointer the foreign library handed out, once per pointer.
    #[allow(unsafe_code)]
    pub unsafe fn new(free_fn: BufferFreeFn) -> Self {
        Self { free_fn }
    }
}

impl Deallocator for ExternDeallocator {
    #[allow(unsafe_code)]
    fn free_buffer(&self, ptr: NonNull<c_void>) {
        // SAFETY: the constructor's contract covers calling `free_fn` with a
        // foreign pointer; callers of `free_buffer` guarantee at-most-once.
        unsafe { (self.free_fn)(ptr.as_ptr()) }
    }
}

impl fmt::Debug for ExternDeallocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternDeallocator")
            .field("free_fn", &(self.free_fn as *const ()))
            .finish()
    }
}

#[cfg(test)]
#[allow(unsafe_code)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    static FREED: Mutex<Vec<usize>> = Mutex::new(Vec::new());

    unsafe extern "C" fn record_free(ptr: *mut c_void) {
        FREED.lock().unwrap().push(ptr as usize);
    }

    #[test]
    fn extern_deallocator_forwards_pointer() {
        let mut byte = 0u8;
        let ptr = NonNull::from(&mut byte).cast::<c_void>();
        let dealloc = unsafe { ExternDeallocator::new(record_free) };
        dealloc.free_buffer(ptr);
        assert!(FREED.lock().unwrap().contains(&(ptr.as_ptr() as usize)));
    }

    #[test]
    fn closures_are_deallocators() {
        let calls = AtomicUsize::new(0);
        let dealloc = |_ptr: NonNull<c_void>| {
            calls.fetch_add(1, Ordering::Relaxed);
        };
        dealloc.free_buffer(NonNull::dangling());
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }
}
