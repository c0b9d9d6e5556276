//! Low-level reads and writes on record memory.
//!
//! Every access to foreign memory in this crate goes through the
//! functions below. Slots are read and written unaligned because the
//! packed layout puts slot 0 at offset 4.

#![allow(unsafe_code)]

use std::borrow::Cow;
use std::ffi::{c_char, CStr};
use std::ptr::NonNull;

/// Read the `count` header at offset 0.
///
/// # Safety
///
/// `base` must be readable for 4 bytes.
pub(crate) unsafe fn read_count(base: NonNull<u8>) -> u32 {
    // SAFETY: caller guarantees 4 readable bytes at `base`.
    unsafe { base.as_ptr().cast::<u32>().read_unaligned() }
}

/// Write the `count` header at offset 0.
///
/// # Safety
///
/// `base` must be writable for 4 bytes.
pub(crate) unsafe fn write_count(base: NonNull<u8>, count: u32) {
    // SAFETY: caller guarantees 4 writable bytes at `base`.
    unsafe { base.as_ptr().cast::<u32>().write_unaligned(count) }
}

/// Read the pointer stored in the slot at byte `offset`.
///
/// # Safety
///
/// `base + offset` must be readable for one pointer width.
pub(crate) unsafe fn read_slot(base: NonNull<u8>, offset: usize) -> *const c_char {
    // SAFETY: caller guarantees the slot lies inside the buffer.
    unsafe {
        base.as_ptr()
            .add(offset)
            .cast::<*const c_char>()
            .read_unaligned()
    }
}

/// Store `value` in the slot at byte `offset`.
///
/// # Safety
///
/// `base + offset` must be writable for one pointer width.
pub(crate) unsafe fn write_slot(base: NonNull<u8>, offset: usize, value: *const c_char) {
    // SAFETY: caller guarantees the slot lies inside the buffer.
    unsafe {
        base.as_ptr()
            .add(offset)
            .cast::<*const c_char>()
            .write_unaligned(value)
    }
}

/// Decode a slot's string. `None` for a null slot.
///
/// Invalid UTF-8 is replaced with U+FFFD rather than rejected.
///
/// # Safety
///
/// A non-null `ptr` must point to a NUL-terminated string that stays
/// valid and unmodified for `'a`.
pub(crate) unsafe fn decode<'a>(ptr: *const c_char) -> Option<Cow<'a, str>> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: non-null and NUL-terminated for 'a per caller contract.
    let text: &'a CStr = unsafe { CStr::from_ptr(ptr) };
    Some(text.to_string_lossy())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_round_trips_at_unaligned_base() {
        let mut bytes = [0u8; 9];
        let base = NonNull::new(bytes[1..].as_mut_ptr()).unwrap();
        unsafe {
            write_count(base, 0xDEAD_BEEF);
            assert_eq!(read_count(base), 0xDEAD_BEEF);
        }
        assert_eq!(&bytes[1..5], &0xDEAD_BEEFu32.to_ne_bytes());
    }

    #[test]
    fn slot_at_offset_four() {
        let text = c"carol";
        let mut bytes = [0u8; 4 + std::mem::size_of::<usize>()];
        let base = NonNull::new(bytes.as_mut_ptr()).unwrap();
        unsafe {
            write_slot(base, 4, text.as_ptr());
            assert_eq!(read_slot(base, 4), text.as_ptr());
            assert_eq!(decode(read_slot(base, 4)).as_deref(), Some("carol"));
        }
    }

    #[test]
    fn null_slot_decodes_to_none() {
        assert_eq!(unsafe { decode(std::ptr::null()) }, None);
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let bytes = b"ab\xffcd\0";
        let decoded = unsafe { decode(bytes.as_ptr().cast()) }.unwrap();
        assert_eq!(decoded, "ab\u{FFFD}cd");
    }
}
