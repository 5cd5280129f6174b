//! Scripted task builders for pool and dispatcher tests.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use signalpost_core::TaskError;
use signalpost_dispatch::Task;
use tokio::sync::Notify;

/// Task whose every attempt succeeds immediately.
pub fn succeeding_task() -> Task {
    Task::new(|| async { Ok::<(), TaskError>(()) })
}

/// Task whose every attempt fails with the given message.
pub fn failing_task(message: &str) -> Task {
    let message = message.to_owned();
    Task::new(move || {
        let message = message.clone();
        async move { Err(TaskError::other(message)) }
    })
}

/// Task that bumps `counter` once per successful attempt.
pub fn counting_task(counter: Arc<AtomicUsize>) -> Task {
    Task::new(move || {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    })
}

/// Task that fails its first `failures` attempts, then succeeds.
pub fn flaky_task(failures: usize) -> Task {
    let remaining = Arc::new(AtomicUsize::new(failures));
    Task::new(move || {
        let remaining = Arc::clone(&remaining);
        async move {
            let failing = remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                Err(TaskError::other("scripted attempt failure"))
            } else {
                Ok(())
            }
        }
    })
}

/// Controls a task produced by [`gated_task`].
#[derive(Debug)]
pub struct TaskGate {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl TaskGate {
    /// Waits until a worker has picked up the task and entered its body.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Lets the task body finish. May be called before the task starts.
    pub fn release(&self) {
        self.release.notify_one();
    }
}

/// Task that signals when a worker starts it, then blocks until released.
///
/// Used to hold a worker busy at a known point, for back-pressure and
/// drain tests.
pub fn gated_task() -> (Task, TaskGate) {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let gate = TaskGate { entered: Arc::clone(&entered), release: Arc::clone(&release) };
    let task = Task::new(move || {
        let entered = Arc::clone(&entered);
        let release = Arc::clone(&release);
        async move {
            entered.notify_one();
            release.notified().await;
            Ok(())
        }
    });
    (task, gate)
}
