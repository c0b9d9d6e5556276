//! Mock collaborators for the release protocol.

use std::ffi::c_void;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use reap_core::{Deallocator, DeferredReleaser, FinalizerHandle};

/// A non-null pointer with the given address. Never dereferenced by
/// [`MockDeallocator`], so any non-zero address will do.
pub fn fake_ptr(addr: usize) -> NonNull<c_void> {
    NonNull::new(addr as *mut c_void).expect("fake pointer address must be non-zero")
}

/// Stand-in for the foreign `free_buffer` routine.
///
/// Records every pointer it is asked to free, in call order, and notices
/// if two calls ever overlap.
#[derive(Default)]
pub struct MockDeallocator {
    freed: Mutex<Vec<usize>>,
    in_flight: AtomicUsize,
    overlapped: AtomicBool,
    delay: Option<Duration>,
    panic_on: Option<usize>,
}

impl MockDeallocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep for `delay` inside every call, widening any race window.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Panic (after recording) when asked to free `addr`.
    pub fn panicking_on(mut self, addr: usize) -> Self {
        self.panic_on = Some(addr);
        self
    }

    /// Addresses freed so far, in call order.
    pub fn freed(&self) -> Vec<usize> {
        self.freed.lock().unwrap().clone()
    }

    /// Total number of free calls.
    pub fn free_count(&self) -> usize {
        self.freed.lock().unwrap().len()
    }

    /// How many times `addr` was freed.
    pub fn times_freed(&self, addr: usize) -> usize {
        self.freed
            .lock()
            .unwrap()
            .iter()
            .filter(|&&a| a == addr)
            .count()
    }

    /// Whether two free calls were ever in progress at the same time.
    pub fn saw_overlap(&self) -> bool {
        self.overlapped.load(Ordering::SeqCst)
    }
}

impl Deallocator for MockDeallocator {
    fn free_buffer(&self, ptr: NonNull<c_void>) {
        if self.in_flight.fetch_add(1, Ordering::SeqCst) > 0 {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        let addr = ptr.as_ptr() as usize;
        self.freed.lock().unwrap().push(addr);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.panic_on == Some(addr) {
            panic!("mock deallocator asked to panic on {addr:#x}");
        }
    }
}

/// Test double for a [`DeferredReleaser`] that only records what it was given.
///
/// Nothing is freed until [`free_all`](RecordingReleaser::free_all).
#[derive(Default)]
pub struct RecordingReleaser {
    marked: Mutex<Vec<FinalizerHandle>>,
    mark_calls: AtomicUsize,
}

impl RecordingReleaser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `mark` calls received.
    pub fn mark_count(&self) -> usize {
        self.mark_calls.load(Ordering::SeqCst)
    }

    /// Addresses of the handles currently held, in mark order.
    pub fn marked_ptrs(&self) -> Vec<usize> {
        self.marked
            .lock()
            .unwrap()
            .iter()
            .map(|h| h.as_ptr() as usize)
            .collect()
    }

    /// Free every held handle, in mark order. Returns how many were freed.
    pub fn free_all(&self) -> usize {
        let handles = std::mem::take(&mut *self.marked.lock().unwrap());
        let n = handles.len();
        for handle in handles {
            handle.free();
        }
        n
    }
}

impl DeferredReleaser for RecordingReleaser {
    fn mark(&self, handle: FinalizerHandle) {
        self.mark_calls.fetch_add(1, Ordering::SeqCst);
        self.marked.lock().unwrap().push(handle);
    }
}
