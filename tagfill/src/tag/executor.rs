//! Bounded execution of tag resolutions.
//!
//! A guarded resolution runs on a worker thread while the caller waits with a
//! timeout.  At most `max_workers` jobs hold a slot at once; the rest queue
//! for one.  On expiry the caller stops waiting, flips the job's
//! [`CancelToken`] and gives the slot back.  The resolution notices between
//! segments and before filling parameters, and nothing it produces afterwards
//! is read.  A job that ignores its token keeps its thread but no longer
//! counts against the pool, so a stuck handler cannot starve later fills.
//!
//! Re-entrancy is tracked per thread: [`resolution_depth`] is non-zero while
//! a resolution is running on the current thread, and nested resolutions at
//! non-zero depth always run inline.

use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, OnceLock};
use std::time::Duration;

use tokio::runtime::{Builder, Runtime};
use tokio::sync::Semaphore;

use super::error::TagError;

/// Default size of the guarded-resolution pool.
pub const DEFAULT_WORKERS: usize = 4;

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
    static TOKEN: RefCell<Option<CancelToken>> = const { RefCell::new(None) };
}

// ── Re-entrancy ───────────────────────────────────────────────────────────────

/// How many resolutions are active on this thread.
pub fn resolution_depth() -> usize {
    DEPTH.with(Cell::get)
}

/// The cancel token of the guarded job running on this thread, if any.
pub fn current_token() -> Option<CancelToken> {
    TOKEN.with(|t| t.borrow().clone())
}

/// Holds the thread's resolution depth raised by one.
#[derive(Debug)]
pub struct DepthGuard(());

impl DepthGuard {
    pub fn enter() -> Self {
        DEPTH.with(|d| d.set(d.get() + 1));
        DepthGuard(())
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}

/// Installed on a worker thread for the duration of one guarded job.
struct WorkerScope {
    previous: Option<CancelToken>,
    _depth: DepthGuard,
}

impl WorkerScope {
    fn enter(token: CancelToken) -> Self {
        let previous = TOKEN.with(|t| t.borrow_mut().replace(token));
        WorkerScope { previous, _depth: DepthGuard::enter() }
    }
}

impl Drop for WorkerScope {
    fn drop(&mut self) {
        let previous = self.previous.take();
        TOKEN.with(|t| *t.borrow_mut() = previous);
    }
}

// ── CancelToken ───────────────────────────────────────────────────────────────

/// Shared flag set when a guarded job's time is up.
#[derive(Debug, Clone)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    budget: Duration,
}

impl CancelToken {
    pub fn new(budget: Duration) -> Self {
        Self { cancelled: Arc::new(AtomicBool::new(false)), budget }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// The time limit the job was given.
    pub fn budget(&self) -> Duration {
        self.budget
    }
}

// ── BoundedExecutor ───────────────────────────────────────────────────────────

/// A shared pool of `max_workers` slots for guarded resolutions.
///
/// Slots are semaphore permits; the threads come from the blocking pool of a
/// small tokio runtime, built on first use.
pub struct BoundedExecutor {
    max_workers: usize,
    slots: Arc<Semaphore>,
    runtime: OnceLock<Result<Runtime, String>>,
}

impl std::fmt::Debug for BoundedExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedExecutor")
            .field("max_workers", &self.max_workers)
            .field("free_slots", &self.slots.available_permits())
            .field("started", &self.runtime.get().is_some())
            .finish()
    }
}

impl Default for BoundedExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}

impl BoundedExecutor {
    pub fn new(max_workers: usize) -> Self {
        let max_workers = max_workers.max(1);
        Self { max_workers, slots: Arc::new(Semaphore::new(max_workers)), runtime: OnceLock::new() }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    fn runtime(&self) -> Result<&Runtime, TagError> {
        self.runtime
            .get_or_init(|| {
                Builder::new_multi_thread()
                    .worker_threads(1)
                    .thread_name("tagfill-worker")
                    .build()
                    .map_err(|e| e.to_string())
            })
            .as_ref()
            .map_err(|e| TagError::WorkerFault(format!("cannot start worker pool: {e}")))
    }

    /// Run `job` on a worker and wait at most `limit` for its result.
    ///
    /// The wait includes any time spent queued for a free slot.  A panic
    /// inside the job becomes [`TagError::WorkerFault`]; running out of time
    /// cancels the job's token and gives [`TagError::Timeout`].  A job whose
    /// token is already cancelled when it reaches a worker never starts.
    pub fn run<R, F>(&self, limit: Duration, job: F) -> Result<R, TagError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let runtime = self.runtime()?;
        let token = CancelToken::new(limit);
        let worker_token = token.clone();
        let (tx, rx) = mpsc::sync_channel(1);

        if self.slots.available_permits() == 0 {
            tracing::warn!(max_workers = self.max_workers, "tag worker pool saturated, waiting for a free slot");
        }
        let slots = Arc::clone(&self.slots);
        let task = runtime.spawn(async move {
            let Ok(_slot) = slots.acquire_owned().await else {
                return;
            };
            let worker = tokio::task::spawn_blocking(move || {
                if worker_token.is_cancelled() {
                    return None;
                }
                let _scope = WorkerScope::enter(worker_token);
                Some(panic::catch_unwind(AssertUnwindSafe(job)))
            });
            if let Ok(Some(result)) = worker.await {
                // The caller may have given up already.
                let _ = tx.send(result);
            }
        });

        match rx.recv_timeout(limit) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(payload)) => Err(TagError::WorkerFault(panic_message(payload.as_ref()))),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                token.cancel();
                // Dropping the waiting task returns its slot; the blocking
                // thread itself runs on until the job gives up.
                task.abort();
                tracing::debug!(?limit, "guarded resolution timed out");
                Err(TagError::Timeout { after: limit })
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(TagError::WorkerFault("worker exited without a result".into()))
            }
        }
    }
}

impl Drop for BoundedExecutor {
    fn drop(&mut self) {
        if let Some(Ok(runtime)) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with a non-string payload".to_owned()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
