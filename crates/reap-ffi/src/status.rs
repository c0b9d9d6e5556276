//! C-compatible status codes.
//!
//! [`ReapStatus`] is a `repr(i32)` enum covering every error the FFI
//! surface can report. Conversions from [`ReaperError`] and
//! [`RecordError`] are provided.

use reap_core::RecordError;
use reap_reaper::ReaperError;

/// C-compatible status code returned by FFI functions.
///
/// `Ok` = 0, all errors are negative. Values are ABI-stable.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReapStatus {
    /// Success.
    Ok = 0,
    /// An argument is null or otherwise invalid.
    InvalidArgument = -1,
    /// `reap_install` was already called.
    AlreadyInstalled = -2,
    /// `reap_install` has not been called (or the reaper was shut down).
    NotInstalled = -3,
    /// A record's count header exceeds the entry ceiling.
    CorruptRecord = -4,
    /// The reaper thread is gone.
    Disconnected = -5,
    /// Reaper configuration was rejected.
    ConfigError = -6,
    /// The reaper thread could not be spawned.
    SpawnFailed = -7,
    /// A record buffer could not be allocated.
    AllocationFailed = -8,
    /// Internal error (e.g. the reaper thread panicked).
    InternalError = -20,
    /// A Rust panic was caught at the FFI boundary.
    Panicked = -128,
}

impl From<&ReaperError> for ReapStatus {
    fn from(e: &ReaperError) -> Self {
        match e {
            ReaperError::Config(_) => ReapStatus::ConfigError,
            ReaperError::Spawn { .. } => ReapStatus::SpawnFailed,
            ReaperError::Disconnected => ReapStatus::Disconnected,
            ReaperError::WorkerPanicked => ReapStatus::InternalError,
            ReaperError::AlreadyInstalled => ReapStatus::AlreadyInstalled,
            ReaperError::NotInstalled => ReapStatus::NotInstalled,
        }
    }
}

impl From<&RecordError> for ReapStatus {
    fn from(e: &RecordError) -> Self {
        match e {
            RecordError::CorruptRecord { .. } | RecordError::LayoutOverflow { .. } => {
                ReapStatus::CorruptRecord
            }
            RecordError::IndexOutOfBounds { .. } => ReapStatus::InvalidArgument,
            RecordError::AllocationFailed { .. } => ReapStatus::AllocationFailed,
        }
    }
}
