//! Read-only record queries.

use std::ffi::c_void;

use reap_core::RecordLimits;
use reap_record::Record;

use crate::status::ReapStatus;

/// Write the number of entries in the subscribers record at `ptr` to
/// `count_out`.
///
/// A null `ptr` reads as an empty record (count 0). Returns
/// `CorruptRecord` if the header exceeds the default entry ceiling.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn reap_subscribers_count(ptr: *const c_void, count_out: *mut u32) -> i32 {
    ffi_guard!({
        if count_out.is_null() {
            return ReapStatus::InvalidArgument as i32;
        }
        // SAFETY: `ptr` is null or a live record from the foreign library.
        let record = match unsafe { Record::from_ptr(ptr, &RecordLimits::default()) } {
            Ok(r) => r,
            Err(e) => return ReapStatus::from(&e) as i32,
        };
        let count = record.entries().len() as u32;
        // SAFETY: count_out is non-null and writable per caller contract.
        unsafe { *count_out = count };
        ReapStatus::Ok as i32
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reap_test_utils::ForeignBuffer;

    #[test]
    fn counts_foreign_record() {
        let buffer = ForeignBuffer::new(&["alice", "bob", "carol"]);
        let mut count = 0u32;
        assert_eq!(reap_subscribers_count(buffer.as_ptr(), &mut count), 0);
        assert_eq!(count, 3);
    }

    #[test]
    fn null_record_counts_zero() {
        let mut count = 99u32;
        assert_eq!(reap_subscribers_count(std::ptr::null(), &mut count), 0);
        assert_eq!(count, 0);
    }

    #[test]
    fn null_out_pointer_rejected() {
        let buffer = ForeignBuffer::new(&["x"]);
        assert_eq!(
            reap_subscribers_count(buffer.as_ptr(), std::ptr::null_mut()),
            ReapStatus::InvalidArgument as i32
        );
    }

    #[test]
    fn oversized_header_is_corrupt() {
        let buffer = ForeignBuffer::with_header(u32::MAX, &["x"]);
        let mut count = 0u32;
        assert_eq!(
            reap_subscribers_count(buffer.as_ptr(), &mut count),
            ReapStatus::CorruptRecord as i32
        );
        assert_eq!(count, 0);
    }
}
