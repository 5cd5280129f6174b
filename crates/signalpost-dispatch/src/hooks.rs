//! Lifecycle hooks fired by workers as tasks complete.

use signalpost_core::{TaskError, TaskId, WorkerId};

/// Observer for task completion events.
///
/// Hooks run inline on the worker that executed the attempt; a slow hook
/// throttles that worker, so implementations should hand heavy work off
/// elsewhere. The failure hook fires once per failed attempt (a task with
/// `max_retries = R` that never succeeds produces `R + 1` calls); the
/// success hook fires exactly once, on the attempt that succeeded.
pub trait TaskHooks: Send + Sync {
    /// Called after an attempt succeeds.
    fn on_success(&self, _task_id: TaskId, _worker_id: WorkerId) {}

    /// Called after each failed attempt, including the final one.
    fn on_failure(&self, _task_id: TaskId, _worker_id: WorkerId, _error: &TaskError) {}
}

/// Hook implementation that ignores all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl TaskHooks for NoopHooks {}
