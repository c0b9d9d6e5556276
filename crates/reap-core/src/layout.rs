//! Runtime layout of a count-prefixed record.
//!
//! A record's shape is only known once its `count` header has been read
//! (or requested), so its size is computed here instead of by a fixed
//! `repr(C)` type:
//!
//! ```text
//! offset 0:            u32   count
//! offset H:            ptr[0]
//! offset H + w:        ptr[1]
//! ...
//! offset H + (n-1)*w:  ptr[n-1]
//! ```
//!
//! `w` is the native pointer width. `H` depends on [`SlotPacking`].

use std::ffi::c_char;
use std::mem::{align_of, size_of};

use crate::error::RecordError;

/// Size of the `count` header in bytes.
pub const COUNT_SIZE: usize = size_of::<u32>();

/// Width of one entry slot (a native pointer) in bytes.
pub const SLOT_WIDTH: usize = size_of::<*const c_char>();

const SLOT_ALIGN: usize = align_of::<*const c_char>();

/// Placement of the first slot relative to the `count` header.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SlotPacking {
    /// Slots start immediately after the 4-byte header (offset 4).
    /// Slot reads are unaligned on 64-bit targets.
    #[default]
    Packed,
    /// Slots start at the next pointer-aligned offset, as a C compiler
    /// lays out `struct { unsigned int count; char *items[]; }`.
    Natural,
}

impl SlotPacking {
    /// Byte offset of slot 0.
    pub const fn entries_offset(self) -> usize {
        match self {
            Self::Packed => COUNT_SIZE,
            Self::Natural => COUNT_SIZE.div_ceil(SLOT_ALIGN) * SLOT_ALIGN,
        }
    }
}

/// Size and slot offsets of one record, computed at construction time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RecordLayout {
    count: u32,
    packing: SlotPacking,
    byte_len: usize,
}

impl RecordLayout {
    /// Layout of a record with no entries. Used for null-backed records.
    pub const fn empty(packing: SlotPacking) -> Self {
        Self {
            count: 0,
            packing,
            byte_len: packing.entries_offset(),
        }
    }

    /// Compute the layout for `count` entries.
    ///
    /// Fails with [`RecordError::LayoutOverflow`] if the total byte length
    /// does not fit in `isize` (the limit for any Rust allocation or slice).
    pub fn for_count(count: u32, packing: SlotPacking) -> Result<Self, RecordError> {
        let byte_len = (count as usize)
            .checked_mul(SLOT_WIDTH)
            .and_then(|slots| slots.checked_add(packing.entries_offset()))
            .filter(|&len| len <= isize::MAX as usize)
            .ok_or(RecordError::LayoutOverflow { count })?;
        Ok(Self {
            count,
            packing,
            byte_len,
        })
    }

    /// Number of entry slots.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Slot placement used by this layout.
    pub fn packing(&self) -> SlotPacking {
        self.packing
    }

    /// Byte offset of slot 0.
    pub fn entries_offset(&self) -> usize {
        self.packing.entries_offset()
    }

    /// Total size of the record in bytes: header, padding, and all slots.
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    /// Byte offset of slot `index`, or `None` if `index >= count`.
    pub fn slot_offset(&self, index: u32) -> Option<usize> {
        if index >= self.count {
            return None;
        }
        Some(self.entries_offset() + index as usize * SLOT_WIDTH)
    }
}
