//! Core types and traits for the reap workspace.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the shape of a count-prefixed foreign record ([`RecordLayout`]),
//! the limits applied when reading one ([`RecordLimits`]), and the two
//! capabilities of the release protocol: the move-only
//! [`FinalizerHandle`] and the [`DeferredReleaser`] it is handed to.
//!
//! # Ownership regimes
//!
//! ```text
//! foreign buffer ──► Record<'a>        (reap-record, borrowed view)
//!        │
//!        └────────► FinalizerHandle    (owned until free(self))
//!                        │
//!                        ▼
//!                  DeferredReleaser    (reap-reaper, serialized free)
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod config;
pub mod dealloc;
pub mod error;
pub mod handle;
pub mod layout;

pub use config::{ConfigError, RecordLimits, DEFAULT_MAX_ENTRIES};
pub use dealloc::{BufferFreeFn, Deallocator, ExternDeallocator};
pub use error::RecordError;
pub use handle::{DeferredReleaser, FinalizerHandle};
pub use layout::{RecordLayout, SlotPacking, COUNT_SIZE, SLOT_WIDTH};
