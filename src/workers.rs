//! Worker pool creation
//!
//! Only creating the pool is part of bootstrap; what runs on it is up to
//! the caller.

use crate::error::{KilnError, KilnResult};
use futures_util::future::BoxFuture;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::debug;

/// Unit of work submitted to a pool
pub type Task = BoxFuture<'static, ()>;

/// Handle to a pool of workers
pub trait WorkerPool: Send + Sync {
    /// Number of workers in the pool
    fn size(&self) -> usize;

    /// Queue a task; it starts once a worker is free
    fn spawn(&self, task: Task) -> JoinHandle<KilnResult<()>>;
}

/// Creates the worker pool at the end of bootstrap
pub trait WorkerPoolFactory: Send + Sync {
    fn create(&self) -> KilnResult<Arc<dyn WorkerPool>>;
}

/// Pool that bounds concurrent tasks on the tokio runtime
pub struct TaskPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl TaskPool {
    pub fn new(size: NonZeroUsize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(size.get())),
            size: size.get(),
        }
    }
}

impl WorkerPool for TaskPool {
    fn size(&self) -> usize {
        self.size
    }

    fn spawn(&self, task: Task) -> JoinHandle<KilnResult<()>> {
        let permits = Arc::clone(&self.permits);
        tokio::spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|e| KilnError::WorkerPool(e.to_string()))?;
            task.await;
            Ok(())
        })
    }
}

/// Factory sizing the pool from a fixed count or available parallelism
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskPoolFactory {
    size: Option<NonZeroUsize>,
}

impl TaskPoolFactory {
    /// Use one worker per available CPU, leaving one for the main thread
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size(size: NonZeroUsize) -> Self {
        Self { size: Some(size) }
    }
}

impl WorkerPoolFactory for TaskPoolFactory {
    fn create(&self) -> KilnResult<Arc<dyn WorkerPool>> {
        let size = match self.size {
            Some(size) => size,
            None => {
                let cpus = std::thread::available_parallelism()
                    .map(NonZeroUsize::get)
                    .unwrap_or(1);
                NonZeroUsize::new(cpus.saturating_sub(1)).unwrap_or(NonZeroUsize::MIN)
            }
        };
        debug!("Creating worker pool with {} workers", size);
        Ok(Arc::new(TaskPool::new(size)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn factory_uses_fixed_size() {
        let factory = TaskPoolFactory::with_size(NonZeroUsize::new(3).unwrap());
        assert_eq!(factory.create().unwrap().size(), 3);
    }

    #[test]
    fn factory_defaults_to_at_least_one() {
        assert!(TaskPoolFactory::new().create().unwrap().size() >= 1);
    }

    #[tokio::test]
    async fn pool_runs_tasks() {
        let pool = TaskPool::new(NonZeroUsize::new(1).unwrap());
        let (tx, rx) = tokio::sync::oneshot::channel();

        pool.spawn(Box::pin(async move {
            let _ = tx.send(21 * 2);
        }))
        .await
        .unwrap()
        .unwrap();

        assert_eq!(rx.await.unwrap(), 42);
    }

    #[tokio::test]
    async fn pool_bounds_concurrency() {
        let pool = TaskPool::new(NonZeroUsize::new(2).unwrap());
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let running = Arc::clone(&running);
                let peak = Arc::clone(&peak);
                pool.spawn(Box::pin(async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                    running.fetch_sub(1, Ordering::SeqCst);
                }))
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }
}
