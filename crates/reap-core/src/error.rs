//! Record-specific error types.

use std::error::Error;
use std::fmt;

/// Errors that can occur while viewing or populating a record.
///
/// Null buffers are never an error; they read as an empty record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordError {
    /// The `count` header exceeds the configured entry ceiling. The
    /// buffer is most likely corrupt or not a record at all.
    CorruptRecord {
        /// The count read from the header.
        count: u32,
        /// The configured ceiling.
        max: u32,
    },
    /// `count` slots do not fit in the address space.
    LayoutOverflow {
        /// The count that overflowed.
        count: u32,
    },
    /// A slot index at or past `count`.
    IndexOutOfBounds {
        /// The requested slot.
        index: u32,
        /// Number of slots in the record.
        count: u32,
    },
    /// The allocator could not provide the buffer.
    AllocationFailed {
        /// Bytes requested.
        bytes: usize,
    },
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CorruptRecord { count, max } => {
                write!(f, "corrupt record: count {count} exceeds ceiling {max}")
            }
            Self::LayoutOverflow { count } => {
                write!(f, "record layout overflow: {count} slots do not fit in memory")
            }
            Self::IndexOutOfBounds { index, count } => {
                write!(f, "slot {index} out of bounds for record of {count} entries")
            }
            Self::AllocationFailed { bytes } => {
                write!(f, "failed to allocate {bytes}-byte record buffer")
            }
        }
    }
}

impl Error for RecordError {}
