//! Worker pools for blocking native work.

use tokio::runtime::{Builder, Handle, Runtime};
use tracing::debug;

use crate::error::{BridgeError, BridgeResult};

/// A unit of work submitted to an executor.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs closures on worker threads.
///
/// Fire-and-forget: there is no result channel and no ordering guarantee
/// between submissions. The closure reports its own outcome.
pub trait TaskExecutor: Send + Sync {
    /// Submit `task` for execution on some worker thread.
    fn execute(&self, task: Task);
}

/// Fixed-size pool of blocking worker threads.
///
/// Backed by a tokio runtime used only for `spawn_blocking`; its blocking
/// thread cap is the pool size, so at most `size` tasks run at once and the
/// rest queue.
pub struct ThreadPool {
    runtime: Option<Runtime>,
    handle: Handle,
    size: usize,
    name: String,
}

impl ThreadPool {
    /// Pool size used when the caller asks for zero threads.
    pub const DEFAULT_SIZE: usize = 3;

    /// Start a pool of `size` workers named `<name>-worker`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Runtime`] if the runtime cannot be built.
    pub fn new(size: usize, name: impl Into<String>) -> BridgeResult<Self> {
        let name = name.into();
        let size = if size == 0 { Self::DEFAULT_SIZE } else { size };
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(size)
            .thread_name(format!("{name}-worker"))
            .build()
            .map_err(|e| BridgeError::Runtime(format!("failed to start worker pool: {e}")))?;
        let handle = runtime.handle().clone();
        debug!(pool = %name, size, "worker pool started");
        Ok(Self {
            runtime: Some(runtime),
            handle,
            size,
            name,
        })
    }

    /// Maximum number of concurrently running tasks.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Pool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl TaskExecutor for ThreadPool {
    fn execute(&self, task: Task) {
        drop(self.handle.spawn_blocking(task));
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            // Running tasks finish on their own threads; queued ones are dropped.
            runtime.shutdown_background();
            debug!(pool = %self.name, "worker pool stopped");
        }
    }
}

impl std::fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPool")
            .field("name", &self.name)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_zero_size_uses_default() {
        let pool = ThreadPool::new(0, "t").unwrap();
        assert_eq!(pool.size(), ThreadPool::DEFAULT_SIZE);
    }

    #[test]
    fn test_tasks_run_on_named_workers() {
        let pool = ThreadPool::new(2, "fs").unwrap();
        let (tx, rx) = mpsc::channel();
        pool.execute(Box::new(move || {
            let name = std::thread::current().name().map(str::to_owned);
            tx.send(name).unwrap();
        }));
        let name = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name.as_deref(), Some("fs-worker"));
    }

    #[test]
    fn test_panicking_task_does_not_poison_pool() {
        let pool = ThreadPool::new(1, "p").unwrap();
        pool.execute(Box::new(|| panic!("boom")));
        let (tx, rx) = mpsc::channel();
        pool.execute(Box::new(move || tx.send(42).unwrap()));
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 42);
    }
}
