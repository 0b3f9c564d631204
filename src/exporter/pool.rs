use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{AbortHandle, Id, JoinError, JoinSet};

/// Bounded worker pool shared by every phase of a run
///
/// Tasks are spawned onto a caller-owned [`JoinSet`], which acts as the
/// phase barrier; the pool only limits how many of them run at once.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
    /// Creates a pool running at most `size` tasks concurrently (at least one)
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of idle workers
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Spawns `task` into `tasks`; it starts once a worker is free
    ///
    /// The returned handle's [`AbortHandle::id`] identifies the task when it
    /// fails at the barrier.
    pub fn spawn<T, F>(&self, tasks: &mut JoinSet<T>, task: F) -> AbortHandle
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let semaphore = Arc::clone(&self.semaphore);
        tasks.spawn(async move {
            // The semaphore is never closed, so a permit always arrives
            let _permit = semaphore.acquire_owned().await.ok();
            task.await
        })
    }
}

/// Waits for every task in a phase, returning the results in completion order
///
/// A panicked task is logged and contributes no result.
pub async fn wait_all<T: 'static>(tasks: JoinSet<T>, phase: &str) -> Vec<T> {
    wait_all_with(tasks, phase, |_, _| {}).await
}

/// Like [`wait_all`], but also hands every failed task to `on_failure`
pub async fn wait_all_with<T, F>(mut tasks: JoinSet<T>, phase: &str, mut on_failure: F) -> Vec<T>
where
    T: 'static,
    F: FnMut(Id, JoinError),
{
    let mut results = Vec::with_capacity(tasks.len());

    while let Some(joined) = tasks.join_next_with_id().await {
        match joined {
            Ok((_, value)) => results.push(value),
            Err(e) => {
                tracing::error!("{} task failed: {}", phase, e);
                on_failure(e.id(), e);
            }
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_is_bounded() {
        let pool = WorkerPool::new(3);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let mut tasks = JoinSet::new();

        for n in 0..10u64 {
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            pool.spawn(&mut tasks, async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10 * (n % 3 + 1))).await;
                running.fetch_sub(1, Ordering::SeqCst);
                n
            });
        }

        let mut results = wait_all(tasks, "test").await;
        results.sort_unstable();

        assert_eq!(results, (0..10).collect::<Vec<_>>());
        assert_eq!(peak.load(Ordering::SeqCst), 3);
        assert_eq!(pool.available(), 3);
    }

    #[tokio::test]
    async fn test_panicked_task_is_dropped_from_results() {
        let pool = WorkerPool::new(2);
        let mut tasks = JoinSet::new();

        pool.spawn(&mut tasks, async { 1 });
        pool.spawn(&mut tasks, async {
            let items: Vec<i32> = Vec::new();
            items[0]
        });
        pool.spawn(&mut tasks, async { 3 });

        let mut results = wait_all(tasks, "test").await;
        results.sort_unstable();
        assert_eq!(results, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_failed_task_is_reported_by_id() {
        let pool = WorkerPool::new(2);
        let mut tasks = JoinSet::new();

        pool.spawn(&mut tasks, async { 1 });
        let failing = pool.spawn(&mut tasks, async {
            let items: Vec<i32> = Vec::new();
            items[0]
        });

        let mut failed = Vec::new();
        let results = wait_all_with(tasks, "test", |id, e| failed.push((id, e.is_panic()))).await;

        assert_eq!(results, vec![1]);
        assert_eq!(failed, vec![(failing.id(), true)]);
    }

    #[test]
    fn test_zero_size_pool_still_runs() {
        assert_eq!(WorkerPool::new(0).size(), 1);
    }
}
