//! Reaper lifecycle and the release entry point.
//!
//! `reap_install` records the foreign deallocation routine next to the
//! global reaper. `reap_subscribers_release` is safe to call from any
//! thread and any teardown context: it only enqueues.

use std::ffi::c_void;
use std::sync::{Arc, PoisonError, RwLock};

use reap_core::{Deallocator, ExternDeallocator};
use reap_reaper::{GlobalReaper, ReaperConfig};

use crate::status::ReapStatus;

/// Foreign deallocation routine: `void free_buffer(void *buffer)`.
pub type ReapFreeFn = unsafe extern "C" fn(*mut c_void);

static DEALLOC: RwLock<Option<Arc<dyn Deallocator>>> = RwLock::new(None);

/// Install the process-wide reaper with the foreign `free_fn`.
///
/// `free_fn` must be callable from the reaper thread. Returns
/// `InvalidArgument` for a null `free_fn` and `AlreadyInstalled` if a
/// reaper is already running.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn reap_install(free_fn: Option<ReapFreeFn>) -> i32 {
    ffi_guard!({
        let Some(free_fn) = free_fn else {
            return ReapStatus::InvalidArgument as i32;
        };
        let mut slot = DEALLOC.write().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = reap_reaper::install_global(ReaperConfig::default()) {
            return ReapStatus::from(&e) as i32;
        }
        // SAFETY: the caller supplies the library's own free routine and
        // promises it may be called from the reaper thread.
        let dealloc = unsafe { ExternDeallocator::new(free_fn) };
        *slot = Some(Arc::new(dealloc));
        ReapStatus::Ok as i32
    })
}

/// Release a subscribers record returned by the foreign library.
///
/// Null is a no-op. Otherwise the record is queued and freed later on
/// the reaper thread. Each non-null pointer must be released exactly
/// once and not read afterwards.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn reap_subscribers_release(ptr: *mut c_void) {
    let _ = ffi_guard!({
        if ptr.is_null() {
            return ReapStatus::Ok as i32;
        }
        let slot = DEALLOC.read().unwrap_or_else(PoisonError::into_inner);
        let Some(dealloc) = slot.as_ref() else {
            tracing::warn!(?ptr, "reap_subscribers_release before reap_install; leaking buffer");
            return ReapStatus::NotInstalled as i32;
        };
        // SAFETY: the caller releases each foreign pointer exactly once.
        unsafe { reap_reaper::release(ptr, dealloc, &GlobalReaper) };
        ReapStatus::Ok as i32
    });
}

/// Block until every record released so far has been freed.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn reap_flush() -> i32 {
    ffi_guard!({
        match reap_reaper::with_global(|reaper| reaper.flush()) {
            Ok(Ok(())) => ReapStatus::Ok as i32,
            Ok(Err(e)) | Err(e) => ReapStatus::from(&e) as i32,
        }
    })
}

/// Drain and stop the process-wide reaper.
///
/// Every record released before this call is freed before it returns.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn reap_shutdown() -> i32 {
    ffi_guard!({
        // Unset first so releases racing the drain leak instead of blocking.
        DEALLOC
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match reap_reaper::shutdown_global() {
            Ok(()) => ReapStatus::Ok as i32,
            Err(e) => ReapStatus::from(&e) as i32,
        }
    })
}
