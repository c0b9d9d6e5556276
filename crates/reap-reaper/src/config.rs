//! Reaper thread configuration.

use reap_core::ConfigError;

/// Smallest stack accepted for the reaper thread, in bytes.
pub const MIN_STACK_SIZE: usize = 16 * 1024;

/// Configuration for [`Reaper::spawn`](crate::Reaper::spawn).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReaperConfig {
    /// Name of the worker thread. Default: `"reap-reaper"`.
    pub thread_name: String,
    /// Worker stack size in bytes. `None` uses the platform default.
    pub stack_size: Option<usize>,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            thread_name: "reap-reaper".to_string(),
            stack_size: None,
        }
    }
}

impl ReaperConfig {
    /// Check the configuration before any thread is spawned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thread_name.is_empty() {
            return Err(ConfigError::EmptyThreadName);
        }
        if self.thread_name.contains('\0') {
            return Err(ConfigError::InvalidThreadName {
                name: self.thread_name.clone(),
            });
        }
        if let Some(configured) = self.stack_size {
            if configured < MIN_STACK_SIZE {
                return Err(ConfigError::StackTooSmall {
                    configured,
                    minimum: MIN_STACK_SIZE,
                });
            }
        }
        Ok(())
    }
}
