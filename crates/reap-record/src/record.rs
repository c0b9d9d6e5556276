//! Borrowed view over a foreign record.

#![allow(unsafe_code)]

use std::ffi::c_void;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

use reap_core::{RecordError, RecordLayout, RecordLimits, SlotPacking};

use crate::entries::Entries;
use crate::raw;

/// Read-only view over a count-prefixed array of borrowed string pointers.
///
/// The view never frees its buffer. A record built over a null pointer
/// is empty whatever bytes happen to sit anywhere else.
#[derive(Clone, Copy)]
pub struct Record<'a> {
    base: Option<NonNull<u8>>,
    layout: RecordLayout,
    _borrow: PhantomData<&'a [u8]>,
}

// SAFETY: a `Record` only ever reads; `from_ptr`'s contract forbids writes
// to the buffer or its strings for 'a. Concurrent enumerations are reads.
unsafe impl Send for Record<'_> {}
unsafe impl Sync for Record<'_> {}

impl<'a> Record<'a> {
    /// The empty, null-backed record.
    pub fn null() -> Self {
        Self::null_with(SlotPacking::default())
    }

    fn null_with(packing: SlotPacking) -> Self {
        Self {
            base: None,
            layout: RecordLayout::empty(packing),
            _borrow: PhantomData,
        }
    }

    /// View the record at `ptr`.
    ///
    /// A null `ptr` yields the empty record. Otherwise the `count`
    /// header is read at offset 0 and checked against `limits` before
    /// any slot is touched.
    ///
    /// # Safety
    ///
    /// If `ptr` is non-null, for the whole of `'a`:
    ///
    /// - `ptr` must be readable for 4 bytes, and for the full record
    ///   length implied by its header and `limits.packing`
    /// - every non-null slot must point to a NUL-terminated string
    /// - neither the buffer nor the strings may be written or freed
    pub unsafe fn from_ptr(ptr: *const c_void, limits: &RecordLimits) -> Result<Self, RecordError> {
        let Some(base) = NonNull::new(ptr.cast_mut().cast::<u8>()) else {
            return Ok(Self::null_with(limits.packing));
        };
        // SAFETY: non-null and readable for the header per caller contract.
        let count = unsafe { raw::read_count(base) };
        let layout = limits.layout_for(count).inspect_err(|e| {
            tracing::error!(ptr = ?base, error = %e, "rejecting foreign record");
        })?;
        Ok(Self {
            base: Some(base),
            layout,
            _borrow: PhantomData,
        })
    }

    /// Number of entries: `0` for a null-backed record, else the header.
    pub(crate) fn count(&self) -> u32 {
        match self.base {
            Some(_) => self.layout.count(),
            None => 0,
        }
    }

    /// Iterate the entries in slot order.
    ///
    /// Restartable: every call starts again at slot 0.
    pub fn entries(&self) -> Entries<'a> {
        Entries::new(self.base, self.layout)
    }

    /// The layout computed for this record.
    pub fn layout(&self) -> &RecordLayout {
        &self.layout
    }

    /// Whether the record is backed by a null pointer.
    pub fn is_null(&self) -> bool {
        self.base.is_none()
    }

    /// The backing pointer, null for a null-backed record.
    pub fn as_ptr(&self) -> *const c_void {
        self.base
            .map_or(std::ptr::null(), |base| base.as_ptr().cast_const().cast())
    }
}

impl Default for Record<'_> {
    fn default() -> Self {
        Self::null()
    }
}

impl<'a> IntoIterator for &Record<'a> {
    type Item = <Entries<'a> as Iterator>::Item;
    type IntoIter = Entries<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries()
    }
}

impl fmt::Debug for Record<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("ptr", &self.as_ptr())
            .field("count", &self.count())
            .field("packing", &self.layout.packing())
            .finish()
    }
}
