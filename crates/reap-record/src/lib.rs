//! Views over count-prefixed foreign records.
//!
//! A record is a `u32` count followed by `count` pointer slots, each
//! slot a borrowed pointer to a NUL-terminated UTF-8 string owned by a
//! foreign library. The number of slots is only known at runtime, so
//! the layout is computed when the record is constructed.
//!
//! Two types cover the two ownership regimes:
//!
//! - [`Record`]: a borrowed view. Built from a foreign pointer with
//!   [`Record::from_ptr`] (null reads as empty) or from a [`RecordBuf`].
//!   Dropping it frees nothing.
//! - [`RecordBuf`]: a zero-filled buffer allocated here for a requested
//!   capacity, owned by the caller, typically handed to a foreign call
//!   that populates it.
//!
//! Releasing foreign buffers is not this crate's job: see `reap-reaper`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod buf;
pub mod entries;
mod raw;
pub mod record;

pub use buf::RecordBuf;
pub use entries::Entries;
pub use record::Record;
