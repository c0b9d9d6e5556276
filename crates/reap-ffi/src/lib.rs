//! C FFI bindings for reap.
//!
//! Lets a foreign runtime's wrapper objects hand subscriber records back
//! from their teardown path (`reap_subscribers_release`) without ever
//! calling the foreign free routine from that path. Each exported
//! function carries its own `#[allow(unsafe_code)]`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

/// Run an FFI body, converting a panic into `ReapStatus::Panicked`.
macro_rules! ffi_guard {
    ($body:block) => {
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| $body)) {
            Ok(status) => status,
            Err(_) => {
                tracing::error!("panic caught at FFI boundary");
                $crate::status::ReapStatus::Panicked as i32
            }
        }
    };
}

pub mod record;
pub mod release;
pub mod status;
