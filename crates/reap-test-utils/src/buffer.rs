//! Foreign-shaped record buffers for tests.

use std::ffi::{c_void, CString};
use std::mem::size_of;

use reap_core::{RecordLayout, SlotPacking, SLOT_WIDTH};

const WORD: usize = size_of::<usize>();

/// A record buffer laid out as the foreign library produces it, together
/// with the strings its slots point at.
///
/// The strings live as long as the `ForeignBuffer`, so any record viewed
/// over [`as_ptr`](ForeignBuffer::as_ptr) is valid while the buffer is.
pub struct ForeignBuffer {
    words: Vec<usize>,
    byte_len: usize,
    _strings: Vec<CString>,
}

impl ForeignBuffer {
    /// Packed buffer whose header equals the number of entries.
    pub fn new<S: AsRef<str>>(entries: &[S]) -> Self {
        Self::build(entries.len() as u32, entries, SlotPacking::Packed)
    }

    /// Buffer with the given slot packing.
    pub fn with_packing<S: AsRef<str>>(entries: &[S], packing: SlotPacking) -> Self {
        Self::build(entries.len() as u32, entries, packing)
    }

    /// Packed buffer whose header claims `count` entries while only
    /// `entries.len()` slots are allocated. Only for ceiling tests: never
    /// enumerate such a buffer without a ceiling below `entries.len()`.
    pub fn with_header<S: AsRef<str>>(count: u32, entries: &[S]) -> Self {
        Self::build(count, entries, SlotPacking::Packed)
    }

    fn build<S: AsRef<str>>(count: u32, entries: &[S], packing: SlotPacking) -> Self {
        let strings: Vec<CString> = entries
            .iter()
            .map(|s| CString::new(s.as_ref()).expect("test string contains NUL"))
            .collect();
        let layout = RecordLayout::for_count(strings.len() as u32, packing)
            .expect("test record layout overflow");

        let mut bytes = vec![0u8; layout.byte_len()];
        bytes[..4].copy_from_slice(&count.to_ne_bytes());
        for (i, s) in strings.iter().enumerate() {
            let offset = layout.slot_offset(i as u32).expect("slot in range");
            let addr = s.as_ptr() as usize;
            bytes[offset..offset + SLOT_WIDTH].copy_from_slice(&addr.to_ne_bytes()[..SLOT_WIDTH]);
        }

        let byte_len = bytes.len();
        bytes.resize(byte_len.div_ceil(WORD) * WORD, 0);
        let words = bytes
            .chunks_exact(WORD)
            .map(|chunk| usize::from_ne_bytes(chunk.try_into().expect("word-sized chunk")))
            .collect();

        Self {
            words,
            byte_len,
            _strings: strings,
        }
    }

    /// Pointer to the header.
    pub fn as_ptr(&self) -> *const c_void {
        self.words.as_ptr().cast()
    }

    /// The record's bytes, header through last slot.
    pub fn bytes(&self) -> Vec<u8> {
        self.words
            .iter()
            .flat_map(|w| w.to_ne_bytes())
            .take(self.byte_len)
            .collect()
    }
}
