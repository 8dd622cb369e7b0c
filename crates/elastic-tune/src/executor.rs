//! Admission-controlled task execution on a dedicated rayon pool.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};

use crate::error::{ExecutorError, TaskError};

/// Counting semaphore bounding in-flight tasks.
#[derive(Debug)]
struct Semaphore {
    permits: Mutex<usize>,
    released: Condvar,
}

impl Semaphore {
    fn new(permits: usize) -> Self {
        Self {
            permits: Mutex::new(permits),
            released: Condvar::new(),
        }
    }

    /// Take a permit, waiting until `deadline` if one is given.
    /// Returns false if the deadline passed first.
    fn acquire(&self, deadline: Option<Instant>) -> bool {
        let mut permits = self.permits.lock();
        while *permits == 0 {
            match deadline {
                Some(deadline) => {
                    if self.released.wait_until(&mut permits, deadline).timed_out() && *permits == 0
                    {
                        return false;
                    }
                }
                None => self.released.wait(&mut permits),
            }
        }
        *permits -= 1;
        true
    }

    fn release(&self) {
        *self.permits.lock() += 1;
        self.released.notify_one();
    }

    fn available(&self) -> usize {
        *self.permits.lock()
    }
}

/// Returns its permit when dropped, whether the task finished, panicked or
/// was skipped.
struct PermitGuard(Arc<Semaphore>);

impl Drop for PermitGuard {
    fn drop(&mut self) {
        self.0.release();
    }
}

/// Cooperative cancellation flag shared between a task and its handle.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create an un-cancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the task to stop.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Return true once [`cancel`](CancelToken::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Handle to a submitted task's eventual outcome.
#[derive(Debug)]
pub struct TaskHandle<T> {
    outcome: Receiver<Result<T, TaskError>>,
    token: CancelToken,
}

impl<T> TaskHandle<T> {
    /// Block until the task finishes.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TaskError::Panicked`] | The task body panicked |
    /// | [`TaskError::Cancelled`] | The task was cancelled before it started |
    pub fn wait(self) -> Result<T, TaskError> {
        self.outcome.recv().unwrap_or(Err(TaskError::Cancelled))
    }

    /// Block until the task finishes or `deadline` passes. On timeout the
    /// task is cancelled; a running task stops only if it checks its token.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TaskError::Panicked`] | The task body panicked |
    /// | [`TaskError::Cancelled`] | The task was cancelled before it started |
    /// | [`TaskError::TimedOut`] | `deadline` passed first |
    pub fn wait_until(self, deadline: Instant) -> Result<T, TaskError> {
        let timeout = deadline.saturating_duration_since(Instant::now());
        match self.outcome.recv_timeout(timeout) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => {
                self.token.cancel();
                Err(TaskError::TimedOut)
            }
            Err(RecvTimeoutError::Disconnected) => Err(TaskError::Cancelled),
        }
    }

    /// Request cooperative cancellation.
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

/// Runs tasks on a private rayon pool with at most `max_concurrency` in flight.
///
/// [`submit`](BoundedExecutor::submit) blocks until a permit is free. Each
/// task body runs under `catch_unwind`, so a panic is reported through its
/// own handle and never disturbs sibling tasks.
pub struct BoundedExecutor {
    pool: rayon::ThreadPool,
    permits: Arc<Semaphore>,
    max_concurrency: usize,
}

impl BoundedExecutor {
    /// Create an executor with `threads` workers (0 lets rayon choose) and
    /// at most `max_concurrency` tasks admitted at once.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ExecutorError::ZeroConcurrency`] | `max_concurrency` is zero |
    /// | [`ExecutorError::PoolBuild`] | The rayon pool cannot be created |
    pub fn new(max_concurrency: usize, threads: usize) -> Result<Self, ExecutorError> {
        if max_concurrency == 0 {
            return Err(ExecutorError::ZeroConcurrency);
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("elastic-exec-{i}"))
            .build()?;
        Ok(Self {
            pool,
            permits: Arc::new(Semaphore::new(max_concurrency)),
            max_concurrency,
        })
    }

    /// Maximum number of tasks admitted at once.
    #[must_use]
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Permits not currently held by a task.
    #[must_use]
    pub fn available_permits(&self) -> usize {
        self.permits.available()
    }

    /// Submit `task`, blocking until a permit is available.
    pub fn submit<T, F>(&self, task: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce(&CancelToken) -> T + Send + 'static,
    {
        self.permits.acquire(None);
        self.spawn(task)
    }

    /// Submit `task` if a permit frees up before `deadline`, otherwise drop
    /// it unstarted and return `None`.
    pub fn try_submit_until<T, F>(&self, task: F, deadline: Instant) -> Option<TaskHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce(&CancelToken) -> T + Send + 'static,
    {
        self.permits
            .acquire(Some(deadline))
            .then(|| self.spawn(task))
    }

    /// Run every task, sharing one deadline `timeout` from now across the
    /// batch. Outcomes are returned in submission order.
    ///
    /// Tasks not admitted before the deadline never start and report
    /// [`TaskError::TimedOut`]. Tasks still running at the deadline are
    /// cancelled through their token and also report `TimedOut`.
    pub fn invoke_all<T, F>(&self, tasks: Vec<F>, timeout: Duration) -> Vec<Result<T, TaskError>>
    where
        T: Send + 'static,
        F: FnOnce(&CancelToken) -> T + Send + 'static,
    {
        let deadline = Instant::now().checked_add(timeout);
        let handles: Vec<Option<TaskHandle<T>>> = tasks
            .into_iter()
            .map(|task| match deadline {
                Some(deadline) => self.try_submit_until(task, deadline),
                None => Some(self.submit(task)),
            })
            .collect();

        let skipped = handles.iter().filter(|h| h.is_none()).count();
        if skipped > 0 {
            warn!(skipped, "batch deadline passed before every task was admitted");
        }

        handles
            .into_iter()
            .map(|handle| match (handle, deadline) {
                (None, _) => Err(TaskError::TimedOut),
                (Some(handle), Some(deadline)) => handle.wait_until(deadline),
                (Some(handle), None) => handle.wait(),
            })
            .collect()
    }

    /// Schedule `task` under an already-acquired permit.
    fn spawn<T, F>(&self, task: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce(&CancelToken) -> T + Send + 'static,
    {
        let guard = PermitGuard(Arc::clone(&self.permits));
        let token = CancelToken::new();
        let task_token = token.clone();
        let (sender, outcome) = mpsc::channel();

        self.pool.spawn(move || {
            let _guard = guard;
            if task_token.is_cancelled() {
                let _ = sender.send(Err(TaskError::Cancelled));
                return;
            }
            let result = catch_unwind(AssertUnwindSafe(|| task(&task_token))).map_err(|payload| {
                let message = panic_message(payload.as_ref());
                debug!(%message, "task panicked");
                TaskError::Panicked { message }
            });
            // The handle may already be gone after a timeout.
            let _ = sender.send(result);
        });

        TaskHandle { outcome, token }
    }
}

impl std::fmt::Debug for BoundedExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedExecutor")
            .field("threads", &self.pool.current_num_threads())
            .field("max_concurrency", &self.max_concurrency)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    type Task = Box<dyn FnOnce(&CancelToken) -> i32 + Send>;

    #[test]
    fn zero_concurrency_is_rejected() {
        assert!(matches!(
            BoundedExecutor::new(0, 1),
            Err(ExecutorError::ZeroConcurrency)
        ));
    }

    #[test]
    fn runs_tasks_and_returns_values() {
        let executor = BoundedExecutor::new(2, 2).unwrap();
        let handles: Vec<_> = (0..5).map(|i| executor.submit(move |_| i * 10)).collect();
        let values: Vec<_> = handles.into_iter().map(|h| h.wait().unwrap()).collect();
        assert_eq!(values, vec![0, 10, 20, 30, 40]);
    }

    #[test]
    fn never_exceeds_concurrency_bound() {
        let executor = BoundedExecutor::new(2, 4).unwrap();
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let running = Arc::clone(&running);
                let peak = Arc::clone(&peak);
                executor.submit(move |_| {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(5));
                    running.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();
        for handle in handles {
            handle.wait().unwrap();
        }
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn panic_is_isolated_and_permit_returned() {
        let executor = BoundedExecutor::new(1, 1).unwrap();
        let tasks: Vec<Task> = vec![
            Box::new(|_| 1),
            Box::new(|_| panic!("boom")),
            Box::new(|_| 3),
        ];
        let outcomes = executor.invoke_all(tasks, Duration::from_secs(10));
        assert_eq!(outcomes[0], Ok(1));
        assert_eq!(
            outcomes[1],
            Err(TaskError::Panicked {
                message: "boom".to_string()
            })
        );
        assert_eq!(outcomes[2], Ok(3));
        assert_eq!(executor.available_permits(), 1);
    }

    #[test]
    fn deadline_skips_unadmitted_and_cancels_running() {
        let executor = BoundedExecutor::new(1, 1).unwrap();
        let observed_cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&observed_cancel);
        let slow = move |token: &CancelToken| {
            while !token.is_cancelled() {
                thread::sleep(Duration::from_millis(1));
            }
            flag.store(true, Ordering::SeqCst);
            0
        };
        let tasks: Vec<Task> = vec![Box::new(slow), Box::new(|_| 2)];
        let outcomes = executor.invoke_all(tasks, Duration::from_millis(50));
        assert_eq!(outcomes, vec![Err(TaskError::TimedOut), Err(TaskError::TimedOut)]);

        // The cancelled task exits and hands its permit back.
        let after = executor.submit(|_| 7);
        assert_eq!(after.wait(), Ok(7));
        assert!(observed_cancel.load(Ordering::SeqCst));
    }
}
