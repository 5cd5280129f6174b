//! The unit of work executed by the worker pool.

use std::{fmt, future::Future, pin::Pin};

use signalpost_core::{TaskError, TaskId};

type AttemptFuture = Pin<Box<dyn Future<Output = Result<(), TaskError>> + Send>>;
type AttemptFn = Box<dyn Fn() -> AttemptFuture + Send + Sync>;

/// An opaque, retryable operation with a unique identifier.
///
/// The action is a zero-argument async operation; the pool runs it once per
/// attempt and treats it as a black box. The id is assigned at creation,
/// never changes, and is the only correlation token surfaced through hooks
/// and logs.
pub struct Task {
    id: TaskId,
    action: AttemptFn,
}

impl Task {
    /// Wraps an async operation into a task with a fresh id.
    ///
    /// The closure is invoked once per attempt, so captured state is shared
    /// across retries of the same task.
    pub fn new<F, Fut>(action: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        Self { id: TaskId::new(), action: Box::new(move || Box::pin(action())) }
    }

    /// The task's immutable correlation id.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Runs one attempt of the action.
    pub(crate) fn attempt(&self) -> AttemptFuture {
        (self.action)()
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").field("id", &self.id).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::*;

    #[tokio::test]
    async fn action_runs_once_per_attempt() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in_task = Arc::clone(&calls);
        let task = Task::new(move || {
            let calls = Arc::clone(&calls_in_task);
            async move {
                calls.fetch_add(1, Ordering::AcqRel);
                Ok(())
            }
        });

        task.attempt().await.unwrap();
        task.attempt().await.unwrap();

        assert_eq!(calls.load(Ordering::Acquire), 2);
    }

    #[tokio::test]
    async fn id_is_stable_across_attempts() {
        let task = Task::new(|| async { Ok(()) });
        let id = task.id();

        task.attempt().await.unwrap();

        assert_eq!(task.id(), id);
    }
}
