//! Bounded store calls.
//!
//! Every store call is dispatched to a dedicated worker pool and the caller
//! waits at most the configured timeout. A call that already started when its
//! caller gave up keeps running on the pool; its result is dropped with the
//! channel and never reaches the caller's response. A call still queued when
//! its caller gave up never runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use crate::error::StoreError;

/// Worker pool plus per-call timeout shared by the services.
pub struct Deadline {
    pool: rayon::ThreadPool,
    timeout: Duration,
}

impl Deadline {
    /// Start `workers` store threads with the given per-call timeout.
    pub fn new(workers: usize, timeout: Duration) -> Result<Self, StoreError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("likerank-store-{i}"))
            .panic_handler(|_| tracing::error!("store call panicked"))
            .build()
            .map_err(|e| StoreError::Unavailable {
                message: format!("failed to start store workers: {e}"),
            })?;
        Ok(Self { pool, timeout })
    }

    /// The per-call timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `call` on the pool, waiting at most the timeout for its result.
    ///
    /// Expiry yields `StoreError::Timeout` (converted into `E`). A call that
    /// panics yields `StoreError::Unavailable`.
    ///
    /// The worker and the expiring caller race on one flag: whichever sets it
    /// first decides whether the call runs at all. So a timed-out call has
    /// either already started or is skipped when a worker reaches it.
    pub fn run<T, E, F>(&self, op: &'static str, call: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
        F: FnOnce() -> Result<T, E> + Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel(1);
        let taken = Arc::new(AtomicBool::new(false));
        let worker_taken = Arc::clone(&taken);
        self.pool.spawn(move || {
            if worker_taken.swap(true, Ordering::AcqRel) {
                tracing::debug!(op, "skipping store call abandoned while queued");
                return;
            }
            // The receiver is gone if the caller already timed out.
            let _ = tx.send(call());
        });

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                let after_ms = self.timeout.as_millis() as u64;
                let started = taken.swap(true, Ordering::AcqRel);
                tracing::warn!(op, after_ms, started, "store call timed out");
                Err(StoreError::Timeout { op, after_ms }.into())
            }
            Err(RecvTimeoutError::Disconnected) => Err(StoreError::Unavailable {
                message: format!("store call `{op}` ended without a result"),
            }
            .into()),
        }
    }
}

impl std::fmt::Debug for Deadline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deadline")
            .field("workers", &self.pool.current_num_threads())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deadline(ms: u64) -> Deadline {
        Deadline::new(2, Duration::from_millis(ms)).unwrap()
    }

    #[test]
    fn returns_call_result() {
        let d = deadline(1_000);
        let v: Result<u64, StoreError> = d.run("answer", || Ok(42));
        assert_eq!(v.unwrap(), 42);
    }

    #[test]
    fn propagates_call_error() {
        let d = deadline(1_000);
        let v: Result<u64, StoreError> = d.run("fail", || {
            Err(StoreError::Unavailable {
                message: "down".into(),
            })
        });
        assert!(matches!(v, Err(StoreError::Unavailable { .. })));
    }

    #[test]
    fn slow_call_times_out_but_finishes() {
        let d = deadline(20);
        let finished = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&finished);
        let v: Result<(), StoreError> = d.run("slow", move || {
            std::thread::sleep(Duration::from_millis(150));
            flag.store(true, Ordering::SeqCst);
            Ok(())
        });
        assert!(matches!(v, Err(StoreError::Timeout { op: "slow", .. })));
        assert!(!finished.load(Ordering::SeqCst));

        std::thread::sleep(Duration::from_millis(400));
        assert!(finished.load(Ordering::SeqCst));
    }

    #[test]
    fn queued_call_is_skipped_after_timeout() {
        let d = Deadline::new(1, Duration::from_millis(30)).unwrap();

        // Occupy the only worker well past the timeout.
        let busy: Result<(), StoreError> = d.run("busy", || {
            std::thread::sleep(Duration::from_millis(200));
            Ok(())
        });
        assert!(matches!(busy, Err(StoreError::Timeout { op: "busy", .. })));

        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        let queued: Result<(), StoreError> = d.run("queued", move || {
            flag.store(true, Ordering::SeqCst);
            Ok(())
        });
        assert!(matches!(queued, Err(StoreError::Timeout { op: "queued", .. })));

        std::thread::sleep(Duration::from_millis(400));
        assert!(!ran.load(Ordering::SeqCst));

        // The pool still serves later calls.
        let v: Result<u64, StoreError> = d.run("after", || Ok(7));
        assert_eq!(v.unwrap(), 7);
    }

    #[test]
    fn panicking_call_is_unavailable() {
        let d = deadline(1_000);
        let v: Result<(), StoreError> = d.run("boom", || panic!("store bug"));
        assert!(matches!(v, Err(StoreError::Unavailable { .. })));
    }
}
