//! Lazy iteration over a record's string slots.

#![allow(unsafe_code)]

use std::borrow::Cow;
use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::ptr::NonNull;

use reap_core::RecordLayout;

use crate::raw;

/// Iterator over the entries of a [`Record`](crate::Record), in slot order.
///
/// Each slot is read and decoded only when the iterator reaches it.
/// Yields `None` for a null slot (for example an unpopulated
/// [`RecordBuf`](crate::RecordBuf)).
#[derive(Clone)]
pub struct Entries<'a> {
    base: Option<NonNull<u8>>,
    layout: RecordLayout,
    front: u32,
    back: u32,
    _borrow: PhantomData<&'a [u8]>,
}

// SAFETY: an `Entries` only reads memory that `Record::from_ptr`'s caller
// promised stays valid and unmodified for 'a, so sharing or moving it
// across threads cannot observe a write.
unsafe impl Send for Entries<'_> {}
unsafe impl Sync for Entries<'_> {}

impl<'a> Entries<'a> {
    pub(crate) fn new(base: Option<NonNull<u8>>, layout: RecordLayout) -> Self {
        let back = if base.is_some() { layout.count() } else { 0 };
        Self {
            base,
            layout,
            front: 0,
            back,
            _borrow: PhantomData,
        }
    }

    fn decode_at(&self, index: u32) -> Option<Cow<'a, str>> {
        let base = self.base?;
        let offset = self.layout.slot_offset(index)?;
        // SAFETY: `index < count`, so the slot lies inside the buffer the
        // record was constructed over; string validity is the record's
        // construction contract.
        unsafe { raw::decode(raw::read_slot(base, offset)) }
    }
}

impl<'a> Iterator for Entries<'a> {
    type Item = Option<Cow<'a, str>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        let item = self.decode_at(self.front);
        self.front += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.back - self.front) as usize;
        (remaining, Some(remaining))
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        let remaining = (self.back - self.front) as usize;
        if n >= remaining {
            self.front = self.back;
            return None;
        }
        self.front += n as u32;
        self.next()
    }
}

impl DoubleEndedIterator for Entries<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        Some(self.decode_at(self.back))
    }
}

impl ExactSizeIterator for Entries<'_> {}

impl FusedIterator for Entries<'_> {}

impl fmt::Debug for Entries<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entries")
            .field("front", &self.front)
            .field("back", &self.back)
            .finish()
    }
}
