//! Process-wide reaper instance.
//!
//! Wrapper objects in a foreign runtime usually have no way to carry a
//! releaser around, so one [`Reaper`] can be installed for the whole
//! process and reached through [`GlobalReaper`]. The table lock is only
//! held for the duration of a channel send.

use std::sync::{PoisonError, RwLock};

use reap_core::{DeferredReleaser, FinalizerHandle};

use crate::config::ReaperConfig;
use crate::error::ReaperError;
use crate::reaper::Reaper;

static GLOBAL: RwLock<Option<Reaper>> = RwLock::new(None);

/// Spawn a reaper with `config` and install it process-wide.
pub fn install_global(config: ReaperConfig) -> Result<(), ReaperError> {
    let mut slot = GLOBAL.write().unwrap_or_else(PoisonError::into_inner);
    if slot.is_some() {
        return Err(ReaperError::AlreadyInstalled);
    }
    *slot = Some(Reaper::spawn(config)?);
    Ok(())
}

/// Whether a global reaper is installed.
pub fn is_global_installed() -> bool {
    GLOBAL
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .is_some()
}

/// Run `f` against the installed reaper.
pub fn with_global<T>(f: impl FnOnce(&Reaper) -> T) -> Result<T, ReaperError> {
    let slot = GLOBAL.read().unwrap_or_else(PoisonError::into_inner);
    slot.as_ref().map(f).ok_or(ReaperError::NotInstalled)
}

/// Uninstall the global reaper, draining and joining it.
///
/// The table lock is released before the drain, so concurrent releases
/// see "not installed" instead of waiting on it.
pub fn shutdown_global() -> Result<(), ReaperError> {
    let reaper = GLOBAL
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .take()
        .ok_or(ReaperError::NotInstalled)?;
    reaper.shutdown()
}

/// [`DeferredReleaser`] that forwards to the installed global reaper.
///
/// With no reaper installed the handle is dropped unfreed (leaked) and
/// a warning is logged: freeing it on the spot would defeat deferral.
#[derive(Clone, Copy, Debug, Default)]
pub struct GlobalReaper;

impl DeferredReleaser for GlobalReaper {
    fn mark(&self, handle: FinalizerHandle) {
        let slot = GLOBAL.read().unwrap_or_else(PoisonError::into_inner);
        match slot.as_ref() {
            Some(reaper) => reaper.mark(handle),
            None => {
                tracing::warn!(ptr = ?handle.as_ptr(), "no global reaper installed; leaking buffer");
                drop(handle);
            }
        }
    }
}
