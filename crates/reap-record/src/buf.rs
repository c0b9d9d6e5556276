//! Owned, zero-filled record buffers.
//!
//! A [`RecordBuf`] is allocated on this side of the boundary when a
//! foreign call expects the caller to provide a pre-sized output record.
//! Storage is a `Box<[usize]>` so slots are pointer-aligned under either
//! [`SlotPacking`].

#![allow(unsafe_code)]

use std::ffi::{c_char, c_void};
use std::fmt;
use std::mem::size_of;
use std::ptr::NonNull;
use std::sync::Arc;

use reap_core::{
    Deallocator, FinalizerHandle, RecordError, RecordLayout, RecordLimits, SlotPacking,
};

use crate::raw;
use crate::record::Record;

const WORD: usize = size_of::<usize>();

/// Fallible, lazily zeroed allocation of `len` words.
fn zeroed_words(len: usize) -> Result<Box<[usize]>, RecordError> {
    if len == 0 {
        return Ok(Box::default());
    }
    let failed = RecordError::AllocationFailed {
        bytes: len.saturating_mul(WORD),
    };
    let layout = std::alloc::Layout::array::<usize>(len).map_err(|_| failed.clone())?;
    // SAFETY: `layout` has a non-zero size.
    let ptr = unsafe { std::alloc::alloc_zeroed(layout) }.cast::<usize>();
    if ptr.is_null() {
        return Err(failed);
    }
    // SAFETY: `ptr` is a fresh global allocation laid out as `[usize; len]`,
    // which is the layout `Box<[usize]>` frees with.
    Ok(unsafe { Box::from_raw(std::ptr::slice_from_raw_parts_mut(ptr, len)) })
}

/// A caller-owned record buffer with room for a fixed number of entries.
pub struct RecordBuf {
    words: Box<[usize]>,
    layout: RecordLayout,
}

impl RecordBuf {
    /// Allocate a zero-filled buffer for `capacity` entries with the
    /// default packing. The header is set to `capacity`; every slot is null.
    pub fn with_capacity(capacity: u32) -> Result<Self, RecordError> {
        Self::with_packing(capacity, SlotPacking::default())
    }

    /// Allocate a zero-filled buffer for `capacity` entries.
    pub fn with_packing(capacity: u32, packing: SlotPacking) -> Result<Self, RecordError> {
        let layout = RecordLayout::for_count(capacity, packing)?;
        let words = zeroed_words(layout.byte_len().div_ceil(WORD)).inspect_err(|e| {
            tracing::error!(capacity, error = %e, "record buffer allocation failed");
        })?;
        let mut buf = Self { words, layout };
        // SAFETY: the buffer is at least `entries_offset() >= 4` bytes long.
        unsafe { raw::write_count(buf.base(), capacity) };
        Ok(buf)
    }

    fn base(&mut self) -> NonNull<u8> {
        NonNull::from(&mut *self.words).cast::<u8>()
    }

    /// Number of slots the buffer was allocated with.
    pub fn capacity(&self) -> u32 {
        self.layout.count()
    }

    /// The layout the buffer was allocated with.
    pub fn layout(&self) -> &RecordLayout {
        &self.layout
    }

    /// Pointer to the header, for passing to a foreign call.
    pub fn as_ptr(&self) -> *const c_void {
        self.words.as_ptr().cast()
    }

    /// Mutable pointer to the header, for passing to a foreign call that
    /// fills the slots in place.
    pub fn as_mut_ptr(&mut self) -> *mut c_void {
        self.words.as_mut_ptr().cast()
    }

    /// Store a string pointer in slot `index`.
    ///
    /// # Safety
    ///
    /// A non-null `value` must point to a NUL-terminated string that
    /// outlives every [`Record`] later viewed from this buffer.
    pub unsafe fn set_entry(&mut self, index: u32, value: *const c_char) -> Result<(), RecordError> {
        let offset = self
            .layout
            .slot_offset(index)
            .ok_or(RecordError::IndexOutOfBounds {
                index,
                count: self.capacity(),
            })?;
        // SAFETY: `index < capacity`, so the slot is inside the allocation.
        unsafe { raw::write_slot(self.base(), offset, value) };
        Ok(())
    }

    /// View the buffer as a record.
    ///
    /// The header is read back because a foreign call may have lowered
    /// it; a header above the allocated capacity is rejected.
    pub fn view(&self) -> Result<Record<'_>, RecordError> {
        let limits = RecordLimits {
            max_entries: Some(self.capacity()),
            packing: self.layout.packing(),
        };
        // SAFETY: the buffer is live for the borrow, the header is checked
        // against the allocation, and slots are either null or were set
        // through `set_entry`/`as_mut_ptr` under their safety contracts.
        unsafe { Record::from_ptr(self.as_ptr(), &limits) }
    }

    /// Give up ownership, returning the raw header pointer.
    ///
    /// Reclaim with [`RecordBuf::from_raw`] using the same capacity and packing.
    pub fn into_raw(self) -> *mut c_void {
        Box::into_raw(self.words).cast()
    }

    /// Rebuild a buffer from [`RecordBuf::into_raw`].
    ///
    /// # Safety
    ///
    /// `ptr` must come from `into_raw` on a buffer allocated with exactly
    /// `capacity` and `packing`, and must not be reclaimed twice.
    pub unsafe fn from_raw(
        ptr: *mut c_void,
        capacity: u32,
        packing: SlotPacking,
    ) -> Result<Self, RecordError> {
        let layout = RecordLayout::for_count(capacity, packing)?;
        let len = layout.byte_len().div_ceil(WORD);
        // SAFETY: same pointer and length that `into_raw` leaked.
        let words =
            unsafe { Box::from_raw(std::ptr::slice_from_raw_parts_mut(ptr.cast::<usize>(), len)) };
        Ok(Self { words, layout })
    }

    /// Hand the buffer to the release protocol.
    ///
    /// The returned handle frees the allocation when a
    /// [`DeferredReleaser`](reap_core::DeferredReleaser) runs it.
    pub fn into_handle(self) -> FinalizerHandle {
        let len = self.words.len();
        let ptr = NonNull::from(Box::leak(self.words)).cast::<c_void>();
        let dealloc: Arc<dyn Deallocator> = Arc::new(move |ptr: NonNull<c_void>| {
            let words = std::ptr::slice_from_raw_parts_mut(ptr.as_ptr().cast::<usize>(), len);
            // SAFETY: `ptr` was leaked from a `Box<[usize]>` of `len` words
            // and the handle frees it exactly once.
            drop(unsafe { Box::from_raw(words) });
        });
        // SAFETY: sole handle for a live allocation, freed by the matching routine.
        unsafe { FinalizerHandle::new(ptr, dealloc) }
    }
}

impl fmt::Debug for RecordBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordBuf")
            .field("ptr", &self.as_ptr())
            .field("capacity", &self.capacity())
            .field("packing", &self.layout.packing())
            .finish()
    }
}
