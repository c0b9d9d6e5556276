//! Record limits and configuration errors.
//!
//! [`RecordLimits`] is applied whenever a record is read from a buffer
//! this side of the boundary did not allocate. The `count` header is
//! untrusted input: it alone decides how many slots get read.

use std::error::Error;
use std::fmt;

use crate::error::RecordError;
use crate::layout::{RecordLayout, SlotPacking};

/// Default ceiling on the number of entries read from a foreign record.
pub const DEFAULT_MAX_ENTRIES: u32 = 1 << 20;

// ── RecordLimits ───────────────────────────────────────────────────

/// Limits and layout options for reading foreign records.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordLimits {
    /// Largest `count` accepted from a foreign header. `None` trusts the
    /// header unconditionally. Default: [`DEFAULT_MAX_ENTRIES`].
    pub max_entries: Option<u32>,
    /// Where slot 0 starts. Default: [`SlotPacking::Packed`].
    pub packing: SlotPacking,
}

impl Default for RecordLimits {
    fn default() -> Self {
        Self {
            max_entries: Some(DEFAULT_MAX_ENTRIES),
            packing: SlotPacking::default(),
        }
    }
}

impl RecordLimits {
    /// Limits that trust the foreign `count` header without a ceiling.
    pub fn trusted() -> Self {
        Self {
            max_entries: None,
            ..Self::default()
        }
    }

    /// Same limits with a different slot packing.
    pub fn with_packing(mut self, packing: SlotPacking) -> Self {
        self.packing = packing;
        self
    }

    /// Check a header `count` against these limits and compute its layout.
    pub fn layout_for(&self, count: u32) -> Result<RecordLayout, RecordError> {
        if let Some(max) = self.max_entries {
            if count > max {
                return Err(RecordError::CorruptRecord { count, max });
            }
        }
        RecordLayout::for_count(count, self.packing)
    }

    /// Validate the limits themselves.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_entries == Some(0) {
            return Err(ConfigError::ZeroEntryCeiling);
        }
        Ok(())
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while validating reap configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// `max_entries` is `Some(0)`: every non-empty record would be rejected.
    ZeroEntryCeiling,
    /// The reaper thread name is empty.
    EmptyThreadName,
    /// The reaper thread name contains a NUL byte.
    InvalidThreadName {
        /// The rejected name.
        name: String,
    },
    /// The requested reaper stack size is below the minimum.
    StackTooSmall {
        /// The configured size in bytes.
        configured: usize,
        /// The minimum accepted size in bytes.
        minimum: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroEntryCeiling => write!(f, "max_entries must be at least 1"),
            Self::EmptyThreadName => write!(f, "thread_name must not be empty"),
            Self::InvalidThreadName { name } => {
                write!(f, "thread_name {name:?} contains a NUL byte")
            }
            Self::StackTooSmall {
                configured,
                minimum,
            } => {
                write!(
                    f,
                    "stack_size {configured} bytes is below minimum of {minimum} bytes"
                )
            }
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_reject_oversized_count() {
        let limits = RecordLimits::default();
        assert_eq!(
            limits.layout_for(DEFAULT_MAX_ENTRIES + 1),
            Err(RecordError::CorruptRecord {
                count: DEFAULT_MAX_ENTRIES + 1,
                max: DEFAULT_MAX_ENTRIES,
            })
        );
        assert!(limits.layout_for(DEFAULT_MAX_ENTRIES).is_ok());
    }

    #[test]
    fn trusted_limits_accept_any_count() {
        let limits = RecordLimits::trusted();
        assert!(limits.max_entries.is_none());
        assert_eq!(limits.layout_for(5_000_000).unwrap().count(), 5_000_000);
    }

    #[test]
    fn with_packing_keeps_ceiling() {
        let limits = RecordLimits::default().with_packing(SlotPacking::Natural);
        assert_eq!(limits.packing, SlotPacking::Natural);
        assert_eq!(limits.max_entries, Some(DEFAULT_MAX_ENTRIES));
    }

    #[test]
    fn zero_ceiling_is_invalid() {
        let limits = RecordLimits {
            max_entries: Some(0),
            ..RecordLimits::default()
        };
        assert_eq!(limits.validate(), Err(ConfigError::ZeroEntryCeiling));
        assert!(RecordLimits::default().validate().is_ok());
        assert!(RecordLimits::trusted().validate().is_ok());
    }
}
