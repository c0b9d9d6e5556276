//! Integration test: the process-wide reaper.
//!
//! Global state is shared by every test in a binary, so the whole
//! lifecycle runs in one test function.

#![allow(unsafe_code)]

use std::ffi::c_void;
use std::sync::Arc;

use reap_core::Deallocator;
use reap_reaper::{
    install_global, is_global_installed, release, shutdown_global, with_global, GlobalReaper,
    ReaperConfig, ReaperError,
};
use reap_test_utils::MockDeallocator;

#[test]
fn global_reaper_lifecycle() {
    let mock = Arc::new(MockDeallocator::new());
    let dealloc: Arc<dyn Deallocator> = mock.clone();

    // Not installed: operations report it, releases leak instead of freeing.
    assert!(!is_global_installed());
    assert_eq!(shutdown_global(), Err(ReaperError::NotInstalled));
    assert!(matches!(with_global(|r| r.freed()), Err(ReaperError::NotInstalled)));
    unsafe { release(0x1000 as *mut c_void, &dealloc, &GlobalReaper) };
    assert_eq!(mock.free_count(), 0);

    install_global(ReaperConfig::default()).unwrap();
    assert!(is_global_installed());
    assert_eq!(
        install_global(ReaperConfig::default()),
        Err(ReaperError::AlreadyInstalled)
    );

    for addr in [0x2000usize, 0x3000, 0x4000] {
        unsafe { release(addr as *mut c_void, &dealloc, &GlobalReaper) };
    }
    unsafe { release(std::ptr::null_mut(), &dealloc, &GlobalReaper) };
    with_global(|r| r.flush()).unwrap().unwrap();
    assert_eq!(mock.freed(), vec![0x2000, 0x3000, 0x4000]);

    // Queued work is drained by shutdown.
    unsafe { release(0x5000 as *mut c_void, &dealloc, &GlobalReaper) };
    shutdown_global().unwrap();
    assert_eq!(mock.times_freed(0x5000), 1);
    assert!(!is_global_installed());

    // A fresh install works after shutdown.
    install_global(ReaperConfig::default()).unwrap();
    shutdown_global().unwrap();
    assert_eq!(mock.free_count(), 4);
}
