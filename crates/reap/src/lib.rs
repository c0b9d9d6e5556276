//! Reap: views over variable-length foreign records, and deferred,
//! exactly-once release of the memory behind them.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the reap sub-crates. For most users, adding `reap` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use std::ffi::c_void;
//! use std::ptr::NonNull;
//! use std::sync::Arc;
//! use reap::prelude::*;
//!
//! // A record allocated here, shaped like the foreign library's.
//! let mut buf = RecordBuf::with_capacity(2).unwrap();
//! unsafe {
//!     buf.set_entry(0, c"alice".as_ptr()).unwrap();
//!     buf.set_entry(1, c"bob".as_ptr()).unwrap();
//! }
//! let names: Vec<String> = buf
//!     .view()
//!     .unwrap()
//!     .entries()
//!     .map(|e| e.unwrap().into_owned())
//!     .collect();
//! assert_eq!(names, ["alice", "bob"]);
//!
//! // Foreign buffers are released through a deferred releaser.
//! let reaper = Reaper::spawn(ReaperConfig::default()).unwrap();
//! let dealloc: Arc<dyn Deallocator> = Arc::new(|_ptr: NonNull<c_void>| {});
//! unsafe { release(std::ptr::null_mut(), &dealloc, &reaper) }; // no-op
//! reaper.mark(buf.into_handle());
//! reaper.flush().unwrap();
//! assert_eq!(reaper.freed(), 1);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `reap-core` | Layout, limits, errors, `FinalizerHandle`, `DeferredReleaser` |
//! | [`record`] | `reap-record` | `Record` views, `Entries`, `RecordBuf` |
//! | [`reaper`] | `reap-reaper` | `release`, `Reaper`, `DeferredQueue`, global reaper |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and traits (`reap-core`).
///
/// Contains [`types::RecordLayout`], [`types::RecordLimits`], the error
/// types, and the release capabilities [`types::FinalizerHandle`] and
/// [`types::DeferredReleaser`].
pub use reap_core as types;

/// Record views and owned buffers (`reap-record`).
pub use reap_record as record;

/// Deferred release (`reap-reaper`).
///
/// [`reaper::Reaper`] frees on a dedicated thread,
/// [`reaper::DeferredQueue`] frees at caller-chosen safe points.
pub use reap_reaper as reaper;

/// Common imports for typical reap usage.
///
/// ```rust
/// use reap::prelude::*;
/// ```
pub mod prelude {
    pub use reap_core::{
        Deallocator, DeferredReleaser, ExternDeallocator, FinalizerHandle, RecordError,
        RecordLimits, SlotPacking,
    };
    pub use reap_record::{Entries, Record, RecordBuf};
    pub use reap_reaper::{
        release, DeferredQueue, GlobalReaper, Reaper, ReaperConfig, ReaperError,
    };
}
