//! Deferred, exactly-once release of foreign record buffers.
//!
//! The moment a wrapper object stops needing a foreign buffer (a drop,
//! a GC finalizer, a scope exit) is often a moment when calling back into
//! the foreign library is unsafe. [`release`] therefore never frees: it
//! wraps the pointer in a [`FinalizerHandle`](reap_core::FinalizerHandle)
//! and marks it with a [`DeferredReleaser`](reap_core::DeferredReleaser).
//!
//! Two releasers are provided:
//!
//! ```text
//! release(ptr) ──► FinalizerHandle ──► mark()
//!                                        │
//!                ┌───────────────────────┴──────────────────┐
//!                ▼                                          ▼
//!   Reaper (dedicated thread)                DeferredQueue (safe points)
//!   ├── crossbeam channel, FIFO              ├── Mutex<VecDeque>
//!   ├── frees one handle at a time           ├── process_all() by owner
//!   └── drains on shutdown                   └── drains on drop
//! ```
//!
//! A process-wide [`Reaper`] can be installed with [`install_global`] and
//! reached through [`GlobalReaper`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod global;
pub mod queue;
pub mod reaper;
pub mod release;

pub use config::ReaperConfig;
pub use error::ReaperError;
pub use global::{install_global, is_global_installed, shutdown_global, with_global, GlobalReaper};
pub use queue::DeferredQueue;
pub use reaper::Reaper;
pub use release::release;
