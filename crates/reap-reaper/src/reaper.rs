//! Background-thread releaser.
//!
//! The reaper thread owns the receiving end of an unbounded crossbeam
//! channel. `mark` only enqueues, so it never blocks the caller and never
//! touches the foreign library. The thread frees handles one at a time in
//! the order they were marked, which serializes every deallocation call.
//! Closing the channel (shutdown or drop) lets the thread drain whatever
//! is still queued before it exits: a marked handle is always freed.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, SendError, Sender};

use reap_core::{DeferredReleaser, FinalizerHandle};

use crate::config::ReaperConfig;
use crate::error::ReaperError;

enum Request {
    Free(FinalizerHandle),
    /// Reply once every earlier request has been handled.
    Flush(Sender<()>),
}

#[derive(Default)]
struct ReaperStats {
    marked: AtomicU64,
    freed: AtomicU64,
    failed: AtomicU64,
}

/// A [`DeferredReleaser`] that frees handles on a dedicated thread.
pub struct Reaper {
    tx: Option<Sender<Request>>,
    worker: Option<JoinHandle<()>>,
    stats: Arc<ReaperStats>,
}

impl Reaper {
    /// Validate `config` and start the reaper thread.
    pub fn spawn(config: ReaperConfig) -> Result<Self, ReaperError> {
        config.validate()?;

        let (tx, rx) = crossbeam_channel::unbounded();
        let stats = Arc::new(ReaperStats::default());

        let mut builder = thread::Builder::new().name(config.thread_name.clone());
        if let Some(size) = config.stack_size {
            builder = builder.stack_size(size);
        }
        let worker_stats = Arc::clone(&stats);
        let worker = builder
            .spawn(move || reap_loop(rx, worker_stats))
            .map_err(|e| ReaperError::Spawn {
                reason: e.to_string(),
            })?;

        tracing::info!(thread = %config.thread_name, "reaper started");
        Ok(Self {
            tx: Some(tx),
            worker: Some(worker),
            stats,
        })
    }

    /// Block until every handle marked before this call has been freed.
    pub fn flush(&self) -> Result<(), ReaperError> {
        let tx = self.tx.as_ref().ok_or(ReaperError::Disconnected)?;
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        tx.send(Request::Flush(reply_tx))
            .map_err(|_| ReaperError::Disconnected)?;
        reply_rx.recv().map_err(|_| ReaperError::Disconnected)
    }

    /// Handles marked but not yet freed.
    pub fn pending(&self) -> u64 {
        let marked = self.stats.marked.load(Ordering::Acquire);
        let done = self.freed() + self.failed();
        marked.saturating_sub(done)
    }

    /// Handles freed successfully.
    pub fn freed(&self) -> u64 {
        self.stats.freed.load(Ordering::Acquire)
    }

    /// Handles whose deallocation call panicked.
    pub fn failed(&self) -> u64 {
        self.stats.failed.load(Ordering::Acquire)
    }

    /// Stop accepting handles, free everything still queued, and join
    /// the worker thread.
    pub fn shutdown(mut self) -> Result<(), ReaperError> {
        self.stop()
    }

    fn stop(&mut self) -> Result<(), ReaperError> {
        // Dropping the only sender disconnects the channel once drained.
        drop(self.tx.take());
        match self.worker.take() {
            Some(worker) => worker.join().map_err(|_| ReaperError::WorkerPanicked),
            None => Ok(()),
        }
    }
}

impl DeferredReleaser for Reaper {
    fn mark(&self, handle: FinalizerHandle) {
        let Some(tx) = self.tx.as_ref() else {
            tracing::error!(ptr = ?handle.as_ptr(), "reaper stopped; leaking buffer");
            drop(handle);
            return;
        };
        self.stats.marked.fetch_add(1, Ordering::AcqRel);
        if let Err(SendError(request)) = tx.send(Request::Free(handle)) {
            self.stats.marked.fetch_sub(1, Ordering::AcqRel);
            if let Request::Free(handle) = request {
                tracing::error!(ptr = ?handle.as_ptr(), "reaper worker gone; leaking buffer");
                drop(handle);
            }
            return;
        }
        tracing::trace!(pending = self.pending(), "marked handle for release");
    }
}

impl Drop for Reaper {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::error!(error = %e, "reaper did not stop cleanly");
        }
    }
}

impl std::fmt::Debug for Reaper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reaper")
            .field("pending", &self.pending())
            .field("freed", &self.freed())
            .field("failed", &self.failed())
            .finish()
    }
}

/// Worker loop. Runs until every sender is gone and the queue is empty.
fn reap_loop(rx: Receiver<Request>, stats: Arc<ReaperStats>) {
    for request in rx.iter() {
        match request {
            Request::Free(handle) => free_one(handle, &stats),
            Request::Flush(reply) => {
                let _ = reply.send(());
            }
        }
    }
    tracing::info!(
        freed = stats.freed.load(Ordering::Acquire),
        failed = stats.failed.load(Ordering::Acquire),
        "reaper stopped"
    );
}

/// Free one handle, containing a panicking deallocator.
fn free_one(handle: FinalizerHandle, stats: &ReaperStats) {
    let ptr = handle.as_ptr();
    match panic::catch_unwind(AssertUnwindSafe(|| handle.free())) {
        Ok(()) => {
            stats.freed.fetch_add(1, Ordering::AcqRel);
        }
        Err(_) => {
            stats.failed.fetch_add(1, Ordering::AcqRel);
            tracing::error!(?ptr, "deallocator panicked");
        }
    }
}

#[cfg(test)]
#[allow(unsafe_code)]
mod tests {
    use super::*;
    use reap_core::Deallocator;
    use reap_test_utils::{fake_ptr, MockDeallocator};
    use std::time::Duration;

    fn handle(addr: usize, dealloc: &Arc<MockDeallocator>) -> FinalizerHandle {
        let dealloc: Arc<dyn Deallocator> = dealloc.clone();
        unsafe { FinalizerHandle::new(fake_ptr(addr), dealloc) }
    }

    #[test]
    fn frees_marked_handles_in_order() {
        let mock = Arc::new(MockDeallocator::new());
        let reaper = Reaper::spawn(ReaperConfig::default()).unwrap();
        for addr in [0x10, 0x20, 0x30] {
            reaper.mark(handle(addr, &mock));
        }
        reaper.flush().unwrap();
        assert_eq!(mock.freed(), vec![0x10, 0x20, 0x30]);
        assert_eq!(reaper.freed(), 3);
        assert_eq!(reaper.pending(), 0);
    }

    #[test]
    fn shutdown_drains_queue() {
        let mock = Arc::new(MockDeallocator::new().with_delay(Duration::from_millis(2)));
        let reaper = Reaper::spawn(ReaperConfig::default()).unwrap();
        for addr in 1..=20usize {
            reaper.mark(handle(addr * 8, &mock));
        }
        reaper.shutdown().unwrap();
        assert_eq!(mock.free_count(), 20);
    }

    #[test]
    fn drop_drains_queue() {
        let mock = Arc::new(MockDeallocator::new());
        {
            let reaper = Reaper::spawn(ReaperConfig::default()).unwrap();
            reaper.mark(handle(0x40, &mock));
        }
        assert_eq!(mock.freed(), vec![0x40]);
    }

    #[test]
    fn panicking_deallocator_does_not_kill_worker() {
        let mock = Arc::new(MockDeallocator::new().panicking_on(0x50));
        let reaper = Reaper::spawn(ReaperConfig::default()).unwrap();
        reaper.mark(handle(0x50, &mock));
        reaper.mark(handle(0x60, &mock));
        reaper.flush().unwrap();
        assert_eq!(mock.freed(), vec![0x50, 0x60]);
        assert_eq!(reaper.failed(), 1);
        assert_eq!(reaper.freed(), 1);
    }

    #[test]
    fn invalid_config_does_not_spawn() {
        let config = ReaperConfig {
            thread_name: String::new(),
            ..ReaperConfig::default()
        };
        assert!(matches!(
            Reaper::spawn(config),
            Err(ReaperError::Config(reap_core::ConfigError::EmptyThreadName))
        ));
    }

    #[test]
    fn worker_thread_carries_configured_name() {
        let names = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen = Arc::clone(&names);
        let dealloc: Arc<dyn Deallocator> = Arc::new(move |_ptr: std::ptr::NonNull<std::ffi::c_void>| {
            let name = thread::current().name().map(str::to_owned);
            seen.lock().unwrap().push(name);
        });
        let reaper = Reaper::spawn(ReaperConfig {
            thread_name: "custom-reaper".into(),
            ..ReaperConfig::default()
        })
        .unwrap();
        reaper.mark(unsafe { FinalizerHandle::new(fake_ptr(0x70), dealloc) });
        reaper.flush().unwrap();
        assert_eq!(*names.lock().unwrap(), vec![Some("custom-reaper".to_string())]);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_addrs() -> impl Strategy<Value = Vec<usize>> {
            prop::collection::hash_set(1usize..100_000, 0..64)
                .prop_map(|set| set.into_iter().map(|a| a * 8).collect())
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(32))]

            #[test]
            fn every_mark_freed_once_in_order(addrs in arb_addrs()) {
                let mock = Arc::new(MockDeallocator::new());
                let reaper = Reaper::spawn(ReaperConfig::default()).unwrap();
                for &addr in &addrs {
                    reaper.mark(handle(addr, &mock));
                }
                reaper.flush().unwrap();
                prop_assert_eq!(mock.freed(), addrs.clone());
                prop_assert_eq!(reaper.freed(), addrs.len() as u64);
                for &addr in &addrs {
                    prop_assert_eq!(mock.times_freed(addr), 1);
                }
                reaper.shutdown().unwrap();
                prop_assert_eq!(mock.free_count(), addrs.len());
            }
        }
    }
}
