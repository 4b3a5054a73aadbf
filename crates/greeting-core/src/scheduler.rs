//! Scheduled tasks with explicit cancellation handles.
//!
//! Two shapes of task are supported:
//!
//! - [`spawn_after`] runs a future once after a fixed delay.
//! - [`spawn_every`] waits for a start gate, fires immediately, then fires
//!   again on a fixed period. Ticks are scheduled relative to the start
//!   instant, not to when the previous run finished; ticks missed under load
//!   are replayed back to back.
//!
//! Both return a [`TaskHandle`]. Dropping a handle detaches the task, it
//! does not cancel it. Cancellation is cooperative: the task stops at its
//! next suspension point. Joining a handle reports whether the task ran to
//! the end or stopped on cancellation ([`TaskExit`]).

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Errors that can occur when scheduling or joining a task.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// A periodic task was given a zero period.
    #[error("task `{name}` has a zero period")]
    ZeroPeriod {
        /// Name of the rejected task.
        name: String,
    },

    /// The task panicked or was aborted by the runtime.
    #[error("task `{name}` failed: {source}")]
    Join {
        /// Name of the failed task.
        name: String,
        /// The underlying join error.
        #[source]
        source: tokio::task::JoinError,
    },
}

/// How a scheduled task stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskExit {
    /// The task body ran to the end.
    Completed,
    /// The task stopped because cancellation was requested.
    Cancelled,
}

/// Receiving side of a task's cancellation flag.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// Resolve once cancellation is requested.
    ///
    /// If the owning [`TaskHandle`] was dropped without cancelling, this
    /// never resolves: a detached task runs to completion.
    pub async fn cancelled(&mut self) {
        if self.rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Handle to a spawned scheduled task.
#[derive(Debug)]
pub struct TaskHandle {
    name: String,
    cancel: watch::Sender<bool>,
    join: JoinHandle<TaskExit>,
}

impl TaskHandle {
    fn spawn<B, F>(name: String, body: B) -> Self
    where
        B: FnOnce(CancelSignal) -> F,
        F: Future<Output = TaskExit> + Send + 'static,
    {
        let (cancel, rx) = watch::channel(false);
        let join = tokio::spawn(body(CancelSignal { rx }));
        Self { name, cancel, join }
    }

    /// Name given to the task at spawn time.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Whether the task has stopped running.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the task to finish on its own.
    ///
    /// Consuming the handle detaches the cancellation flag, so a periodic
    /// task joined this way only returns if it was already cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Join`] if the task panicked.
    pub async fn join(self) -> Result<TaskExit, SchedulerError> {
        let Self { name, cancel, join } = self;
        let result = join.await;
        drop(cancel);
        result.map_err(|source| SchedulerError::Join { name, source })
    }

    /// Cancel the task and wait for it to stop.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Join`] if the task panicked.
    pub async fn shutdown(self) -> Result<TaskExit, SchedulerError> {
        self.cancel();
        debug!(task = %self.name, "Task cancellation requested");
        self.join().await
    }
}

/// Run `task` once after `delay`, unless cancelled first.
///
/// Must be called from within a Tokio runtime.
pub fn spawn_after<Fut>(name: impl Into<String>, delay: Duration, task: Fut) -> TaskHandle
where
    Fut: Future<Output = ()> + Send + 'static,
{
    let name = name.into();
    let task_name = name.clone();
    TaskHandle::spawn(name, move |mut cancel| async move {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(task = %task_name, "Delayed task cancelled before firing");
                TaskExit::Cancelled
            }
            () = tokio::time::sleep(delay) => {
                task.await;
                TaskExit::Completed
            }
        }
    })
}

/// Run `task` once `gate` resolves, then every `period`, until cancelled.
///
/// The first run happens as soon as the gate opens. Each run's future is
/// awaited before the next tick is taken.
///
/// Must be called from within a Tokio runtime.
///
/// # Errors
///
/// Returns [`SchedulerError::ZeroPeriod`] if `period` is zero.
pub fn spawn_every<G, F, Fut>(
    name: impl Into<String>,
    period: Duration,
    gate: G,
    mut task: F,
) -> Result<TaskHandle, SchedulerError>
where
    G: Future<Output = ()> + Send + 'static,
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let name = name.into();
    if period.is_zero() {
        return Err(SchedulerError::ZeroPeriod { name });
    }
    let task_name = name.clone();

    Ok(TaskHandle::spawn(name, move |mut cancel| async move {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(task = %task_name, "Periodic task cancelled before start");
                return TaskExit::Cancelled;
            }
            () = gate => {}
        }

        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);
        debug!(
            task = %task_name,
            period_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX),
            "Periodic task started"
        );

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            let run = task();
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = run => {}
            }
        }

        debug!(task = %task_name, "Periodic task stopped");
        TaskExit::Cancelled
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::Notify;

    use super::*;

    fn counting_task(counter: Arc<AtomicUsize>) -> impl FnMut() -> std::future::Ready<()> {
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_task_fires_after_delay() {
        let fired = Arc::new(AtomicUsize::new(0));
        let flag = Arc::clone(&fired);
        let handle = spawn_after("sample-task", Duration::from_millis(300), async move {
            flag.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(299)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(handle.name(), "sample-task");
        assert_eq!(handle.join().await.unwrap(), TaskExit::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_delayed_task_never_fires() {
        let fired = Arc::new(AtomicUsize::new(0));
        let flag = Arc::clone(&fired);
        let handle = spawn_after("sample-task", Duration::from_millis(300), async move {
            flag.fetch_add(1, Ordering::SeqCst);
        });

        handle.cancel();
        assert!(handle.is_cancelled());
        assert_eq!(handle.shutdown().await.unwrap(), TaskExit::Cancelled);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_handle_does_not_cancel() {
        let fired = Arc::new(AtomicUsize::new(0));
        let flag = Arc::clone(&fired);
        drop(spawn_after("sample-task", Duration::from_millis(300), async move {
            flag.fetch_add(1, Ordering::SeqCst);
        }));

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_task_fires_immediately_then_each_period() {
        let counter = Arc::new(AtomicUsize::new(0));
        let period = Duration::from_millis(3_600_000);
        let handle = spawn_every(
            "sample-task",
            period,
            std::future::ready(()),
            counting_task(Arc::clone(&counter)),
        )
        .unwrap();

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        tokio::time::sleep(period).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);

        tokio::time::sleep(period.saturating_mul(3)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 5);

        handle.shutdown().await.unwrap();
        tokio::time::sleep(period.saturating_mul(2)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_task_waits_for_gate() {
        let counter = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Notify::new());
        let opened = Arc::clone(&gate);
        let handle = spawn_every(
            "sample-task",
            Duration::from_secs(60),
            async move { opened.notified().await },
            counting_task(Arc::clone(&counter)),
        )
        .unwrap();

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        gate.notify_one();
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_before_gate_stops_task() {
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = spawn_every(
            "sample-task",
            Duration::from_secs(60),
            std::future::pending::<()>(),
            counting_task(Arc::clone(&counter)),
        )
        .unwrap();

        assert_eq!(handle.shutdown().await.unwrap(), TaskExit::Cancelled);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn zero_period_is_rejected() {
        let counter = Arc::new(AtomicUsize::new(0));
        let result = spawn_every(
            "sample-task",
            Duration::ZERO,
            std::future::ready(()),
            counting_task(Arc::clone(&counter)),
        );
        assert!(matches!(result, Err(SchedulerError::ZeroPeriod { ref name }) if name == "sample-task"));
    }
}
