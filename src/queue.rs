//! Concurrency-limited task queue.
//!
//! A [`TaskQueue`] runs boxed futures on the tokio runtime with at most
//! `concurrency` of them in flight; the rest wait in FIFO order. A task can
//! carry a pre-delay, which counts as in-flight time. After every task
//! finishes, the queue calls its settled hook so owners can check whether
//! all work has drained.
//!
//! # Example
//!
//! ```ignore
//! let queue = TaskQueue::serial("removal");
//! queue.set_on_settled(|| println!("task done"));
//! queue.add(async { /* destroy something */ });
//! queue.add_after(Duration::from_secs(120), async { /* later */ });
//! ```

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, warn};

type Task = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;
type SettledHook = Arc<dyn Fn() + Send + Sync + 'static>;

struct QueuedTask {
    pre_delay: Option<Duration>,
    task: Task,
}

#[derive(Default)]
struct QueueState {
    waiting: VecDeque<QueuedTask>,
    running: usize,
}

struct QueueInner {
    name: &'static str,
    /// `None` means unbounded
    concurrency: Option<usize>,
    state: Mutex<QueueState>,
    on_settled: Mutex<Option<SettledHook>>,
}

/// FIFO task queue with a concurrency limit
#[derive(Clone)]
pub struct TaskQueue {
    inner: Arc<QueueInner>,
}

impl TaskQueue {
    pub fn new(name: &'static str, concurrency: Option<usize>) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                name,
                concurrency: concurrency.map(|c| c.max(1)),
                state: Mutex::new(QueueState::default()),
                on_settled: Mutex::new(None),
            }),
        }
    }

    /// One task at a time
    pub fn serial(name: &'static str) -> Self {
        Self::new(name, Some(1))
    }

    /// Every task starts immediately
    pub fn unbounded(name: &'static str) -> Self {
        Self::new(name, None)
    }

    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Hook called after each task completes and the counters are updated
    pub fn set_on_settled<F>(&self, hook: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *lock(&self.inner.on_settled) = Some(Arc::new(hook));
    }

    /// Queue a task. Must be called from within a tokio runtime.
    pub fn add<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.push(None, Box::pin(task));
    }

    /// Queue a task that sleeps for `delay` once started, then runs
    pub fn add_after<F>(&self, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.push(Some(delay), Box::pin(task));
    }

    /// Tasks waiting for a slot
    pub fn size(&self) -> usize {
        lock(&self.inner.state).waiting.len()
    }

    /// Tasks in flight
    pub fn pending(&self) -> usize {
        lock(&self.inner.state).running
    }

    /// Nothing waiting and nothing in flight
    pub fn is_idle(&self) -> bool {
        let state = lock(&self.inner.state);
        state.waiting.is_empty() && state.running == 0
    }

    fn push(&self, pre_delay: Option<Duration>, task: Task) {
        {
            let mut state = lock(&self.inner.state);
            state.waiting.push_back(QueuedTask { pre_delay, task });
            debug!(
                queue = self.inner.name,
                waiting = state.waiting.len(),
                running = state.running,
                "task queued"
            );
        }
        self.pump();
    }

    /// Start waiting tasks while slots are free
    fn pump(&self) {
        loop {
            let next = {
                let mut state = lock(&self.inner.state);
                let at_capacity = self
                    .inner
                    .concurrency
                    .is_some_and(|limit| state.running >= limit);
                if at_capacity {
                    break;
                }
                match state.waiting.pop_front() {
                    Some(next) => {
                        state.running += 1;
                        next
                    }
                    None => break,
                }
            };
            self.spawn(next);
        }
    }

    fn spawn(&self, queued: QueuedTask) {
        let queue = self.clone();
        tokio::spawn(async move {
            let QueuedTask { pre_delay, task } = queued;
            if let Some(delay) = pre_delay {
                tokio::time::sleep(delay).await;
            }
            // Run on its own task so a panic still releases the slot
            if let Err(e) = tokio::spawn(task).await {
                warn!(queue = queue.inner.name, error = %e, "queued task failed");
            }
            queue.finish();
        });
    }

    fn finish(&self) {
        {
            let mut state = lock(&self.inner.state);
            state.running = state.running.saturating_sub(1);
        }
        self.pump();
        let hook = lock(&self.inner.on_settled).clone();
        if let Some(hook) = hook {
            hook();
        }
    }
}

impl std::fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.inner.state);
        f.debug_struct("TaskQueue")
            .field("name", &self.inner.name)
            .field("concurrency", &self.inner.concurrency)
            .field("waiting", &state.waiting.len())
            .field("running", &state.running)
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_serial_runs_in_order_one_at_a_time() {
        let queue = TaskQueue::serial("test");
        let log = Arc::new(Mutex::new(Vec::new()));
        let in_flight = Arc::new(AtomicUsize::new(0));

        for i in 0..3 {
            let log = log.clone();
            let in_flight = in_flight.clone();
            queue.add(async move {
                assert_eq!(in_flight.fetch_add(1, Ordering::SeqCst), 0);
                tokio::time::sleep(Duration::from_secs(1)).await;
                log.lock().unwrap().push(i);
                in_flight.fetch_sub(1, Ordering::SeqCst);
            });
        }
        assert_eq!(queue.size() + queue.pending(), 3);
        assert_eq!(queue.pending(), 1);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(*log.lock().unwrap(), vec![0, 1, 2]);
        assert!(queue.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_runs_delayed_tasks_concurrently() {
        let queue = TaskQueue::unbounded("delay");
        let done = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let done = done.clone();
            queue.add_after(Duration::from_secs(60), async move {
                done.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(queue.pending(), 3);
        assert_eq!(queue.size(), 0);

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert_eq!(done.load(Ordering::SeqCst), 0);
        assert!(!queue.is_idle());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(done.load(Ordering::SeqCst), 3);
        assert!(queue.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_settled_hook_runs_after_counters_update() {
        let queue = TaskQueue::serial("hook");
        let idle_seen = Arc::new(AtomicUsize::new(0));
        let observer = queue.clone();
        let seen = idle_seen.clone();
        queue.set_on_settled(move || {
            if observer.is_idle() {
                seen.fetch_add(1, Ordering::SeqCst);
            }
        });

        queue.add(async {});
        queue.add(async {});
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(idle_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_task_releases_slot() {
        let queue = TaskQueue::serial("panic");
        let ran = Arc::new(AtomicUsize::new(0));
        queue.add(async { panic!("boom") });
        let after = ran.clone();
        queue.add(async move {
            after.fetch_add(1, Ordering::SeqCst);
        });
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert!(queue.is_idle());
    }
}
