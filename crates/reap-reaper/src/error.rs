//! Reaper error types.

use std::error::Error;
use std::fmt;

use reap_core::ConfigError;

/// Errors from starting, using, or stopping a reaper.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReaperError {
    /// The reaper configuration failed validation.
    Config(ConfigError),
    /// The worker thread could not be spawned.
    Spawn {
        /// OS error description.
        reason: String,
    },
    /// The worker thread is gone; no request can reach it.
    Disconnected,
    /// The worker thread panicked outside a deallocation call.
    WorkerPanicked,
    /// A global reaper is already installed.
    AlreadyInstalled,
    /// No global reaper is installed.
    NotInstalled,
}

impl fmt::Display for ReaperError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Spawn { reason } => write!(f, "reaper thread spawn failed: {reason}"),
            Self::Disconnected => write!(f, "reaper worker disconnected"),
            Self::WorkerPanicked => write!(f, "reaper worker panicked"),
            Self::AlreadyInstalled => write!(f, "global reaper already installed"),
            Self::NotInstalled => write!(f, "global reaper not installed"),
        }
    }
}

impl Error for ReaperError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for ReaperError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
