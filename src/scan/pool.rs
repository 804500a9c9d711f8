//! Bounded worker pool for scan jobs
//!
//! Category walks and descriptor parses are blocking filesystem work. They run
//! through `spawn_blocking` on a dedicated multi-thread runtime, with a
//! semaphore capping how many execute at once. A shared [`CancelToken`] stops
//! jobs that have not started yet.

use crate::error::ScanError;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::debug;

/// Caller-side cancellation flag shared with the worker pool
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Worker count matching available hardware concurrency.
pub fn default_pool_size() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Cloneable handle used by async scan code to submit blocking jobs
#[derive(Debug, Clone)]
pub struct PoolHandle {
    permits: Arc<Semaphore>,
    cancel: CancelToken,
}

impl PoolHandle {
    pub fn new(size: usize, cancel: CancelToken) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(size.max(1))),
            cancel,
        }
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Run `job` on a blocking thread once a permit is free.
    ///
    /// Returns `Cancelled` if cancellation was requested before the job started.
    pub async fn run<F, T>(&self, job: F) -> Result<T, ScanError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let _permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ScanError::Runtime("worker pool closed".to_string()))?;
        if self.cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }
        tokio::task::spawn_blocking(job)
            .await
            .map_err(|e| ScanError::Runtime(format!("scan job failed: {}", e)))
    }
}

/// Owned runtime plus the handle used to submit jobs to it
pub struct WorkerPool {
    runtime: tokio::runtime::Runtime,
    handle: PoolHandle,
    size: usize,
}

impl WorkerPool {
    /// Build a pool with `size` workers.
    ///
    /// Fails when called from inside another async runtime, where blocking on
    /// the pool would stall that runtime.
    pub fn new(size: usize, cancel: CancelToken) -> Result<Self, ScanError> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(ScanError::Runtime(
                "cannot start a blocking scan from within an async runtime; use scan_async"
                    .to_string(),
            ));
        }
        let size = size.max(1);
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(size)
            .max_blocking_threads(size)
            .thread_name("ocsnap-scan")
            .build()
            .map_err(|e| ScanError::Runtime(format!("failed to start worker pool: {}", e)))?;
        debug!(workers = size, "Started scan worker pool");
        Ok(Self {
            runtime,
            handle: PoolHandle::new(size, cancel),
            size,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn handle(&self) -> PoolHandle {
        self.handle.clone()
    }

    /// Drive `future` to completion on the pool.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}
