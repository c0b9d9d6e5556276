//! Test utilities and mock collaborators for reap development.
//!
//! Provides stand-ins for the two external collaborators of the release
//! protocol ([`MockDeallocator`] for the foreign free routine,
//! [`RecordingReleaser`] for the deferred releaser) and a
//! [`ForeignBuffer`] builder that lays out a record byte-for-byte the way
//! the foreign library would.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod buffer;
pub mod mocks;

pub use buffer::ForeignBuffer;
pub use mocks::{fake_ptr, MockDeallocator, RecordingReleaser};
