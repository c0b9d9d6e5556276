//! Integration test: the C ABI lifecycle, install → release → flush → shutdown.
//!
//! The global reaper is process-wide, so the whole sequence runs in a
//! single test function.

use std::ffi::c_void;
use std::sync::Mutex;

use reap_ffi::record::reap_subscribers_count;
use reap_ffi::release::{reap_flush, reap_install, reap_shutdown, reap_subscribers_release};
use reap_ffi::status::ReapStatus;
use reap_test_utils::ForeignBuffer;

static FREED: Mutex<Vec<usize>> = Mutex::new(Vec::new());

unsafe extern "C" fn playlist_subscribers_free(ptr: *mut c_void) {
    FREED.lock().unwrap().push(ptr as usize);
}

fn freed() -> Vec<usize> {
    FREED.lock().unwrap().clone()
}

#[test]
fn install_release_flush_shutdown() {
    // Before install: nothing to flush or stop, releases are dropped.
    assert_eq!(reap_flush(), ReapStatus::NotInstalled as i32);
    assert_eq!(reap_shutdown(), ReapStatus::NotInstalled as i32);
    reap_subscribers_release(0x1000 as *mut c_void);
    assert!(freed().is_empty());

    assert_eq!(reap_install(None), ReapStatus::InvalidArgument as i32);
    assert_eq!(reap_install(Some(playlist_subscribers_free)), ReapStatus::Ok as i32);
    assert_eq!(
        reap_install(Some(playlist_subscribers_free)),
        ReapStatus::AlreadyInstalled as i32
    );

    // A real record is readable right up until it is released.
    let buffer = ForeignBuffer::new(&["alice", "bob", "carol"]);
    let mut count = 0u32;
    assert_eq!(reap_subscribers_count(buffer.as_ptr(), &mut count), 0);
    assert_eq!(count, 3);

    // The mock free routine never dereferences, so the buffer's address
    // can stand in for a foreign allocation.
    let addr = buffer.as_ptr() as usize;
    reap_subscribers_release(addr as *mut c_void);
    reap_subscribers_release(std::ptr::null_mut());
    reap_subscribers_release(0x2000 as *mut c_void);
    assert_eq!(reap_flush(), ReapStatus::Ok as i32);
    assert_eq!(freed(), vec![addr, 0x2000]);

    reap_subscribers_release(0x3000 as *mut c_void);
    assert_eq!(reap_shutdown(), ReapStatus::Ok as i32);
    assert_eq!(freed(), vec![addr, 0x2000, 0x3000]);

    // After shutdown the surface behaves as before install.
    assert_eq!(reap_flush(), ReapStatus::NotInstalled as i32);
    reap_subscribers_release(0x4000 as *mut c_void);
    assert_eq!(freed().len(), 3);
}
