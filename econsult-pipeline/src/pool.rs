//! Bounded worker pool for blocking analyzer calls
//!
//! A semaphore caps how many jobs run at once; excess jobs wait for a permit.
//! The per-task timeout covers that wait plus the run itself. A job that
//! outlives its timeout keeps its thread and permit until it returns, since
//! blocking code cannot be interrupted; its result is discarded.

use econsult_core::{EconsultResult, ProviderError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Counters for pool activity.
#[derive(Debug, Default)]
pub struct PoolStats {
    pub submitted: AtomicU64,
    pub completed: AtomicU64,
    pub timed_out: AtomicU64,
    pub failed: AtomicU64,
}

/// Point-in-time copy of [`PoolStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct PoolStatsSnapshot {
    pub submitted: u64,
    pub completed: u64,
    pub timed_out: u64,
    pub failed: u64,
}

impl PoolStats {
    pub fn snapshot(&self) -> PoolStatsSnapshot {
        PoolStatsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Fixed-size pool running closures on tokio's blocking threads.
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    size: usize,
    task_timeout: Duration,
    stats: PoolStats,
}

impl WorkerPool {
    /// Pool with `size` concurrent slots (at least one).
    pub fn new(size: usize, task_timeout: Duration) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
            task_timeout,
            stats: PoolStats::default(),
        }
    }

    /// Run `job` on a pool thread and wait for its result.
    ///
    /// # Errors
    /// - `ProviderError::Timeout` when no result arrives within the task timeout
    /// - `ProviderError::TaskFailed` when the job panics or the pool is closed
    /// - whatever error `job` itself returns
    pub async fn run<T, F>(&self, task: &'static str, job: F) -> EconsultResult<T>
    where
        F: FnOnce() -> EconsultResult<T> + Send + 'static,
        T: Send + 'static,
    {
        self.stats.submitted.fetch_add(1, Ordering::Relaxed);
        let permits = Arc::clone(&self.permits);

        let work = async move {
            let permit = permits
                .acquire_owned()
                .await
                .map_err(|e| ProviderError::TaskFailed {
                    task: task.to_string(),
                    reason: format!("worker pool closed: {}", e),
                })?;

            tokio::task::spawn_blocking(move || {
                let _permit = permit;
                job()
            })
            .await
            .map_err(|e| ProviderError::TaskFailed {
                task: task.to_string(),
                reason: if e.is_panic() {
                    "analyzer panicked".to_string()
                } else {
                    "analyzer task cancelled".to_string()
                },
            })?
        };

        match tokio::time::timeout(self.task_timeout, work).await {
            Ok(Ok(value)) => {
                self.stats.completed.fetch_add(1, Ordering::Relaxed);
                Ok(value)
            }
            Ok(Err(e)) => {
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
            Err(_) => {
                self.stats.timed_out.fetch_add(1, Ordering::Relaxed);
                Err(ProviderError::Timeout {
                    task: task.to_string(),
                    timeout_ms: self.task_timeout.as_millis() as u64,
                }
                .into())
            }
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Slots not currently held by a running job.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    pub fn task_timeout(&self) -> Duration {
        self.task_timeout
    }

    pub fn stats(&self) -> PoolStatsSnapshot {
        self.stats.snapshot()
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("size", &self.size)
            .field("available", &self.available())
            .field("task_timeout", &self.task_timeout)
            .finish()
    }
}
