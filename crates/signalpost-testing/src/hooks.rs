//! Completion hooks that record every invocation for later assertions.

use std::{
    sync::Mutex,
    time::Duration,
};

use signalpost_core::{TaskError, TaskId, WorkerId};
use signalpost_dispatch::TaskHooks;
use tokio::sync::Notify;

/// How long [`RecordingHooks`] waits before declaring a test stuck.
const WAIT_TIMEOUT: Duration = Duration::from_secs(10);

/// One hook invocation, in the order the pool fired it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookEvent {
    /// `on_success` fired for `task` on `worker`.
    Success {
        /// Task that succeeded.
        task: TaskId,
        /// Worker that ran the final attempt.
        worker: WorkerId,
    },
    /// `on_failure` fired for `task` on `worker`.
    Failure {
        /// Task whose attempt failed.
        task: TaskId,
        /// Worker that ran the attempt.
        worker: WorkerId,
        /// Rendered task error.
        message: String,
    },
}

/// [`TaskHooks`] implementation that appends every event to a list.
///
/// Tests assert on the recorded sequence or block on `wait_for_*` until
/// the pool has produced enough events.
#[derive(Debug, Default)]
pub struct RecordingHooks {
    events: Mutex<Vec<HookEvent>>,
    changed: Notify,
}

impl RecordingHooks {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every event recorded so far.
    pub fn events(&self) -> Vec<HookEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Number of recorded success events.
    pub fn success_count(&self) -> usize {
        self.count(|event| matches!(event, HookEvent::Success { .. }))
    }

    /// Number of recorded failure events.
    pub fn failure_count(&self) -> usize {
        self.count(|event| matches!(event, HookEvent::Failure { .. }))
    }

    /// Blocks until at least `n` success events exist.
    ///
    /// # Panics
    ///
    /// Panics when the count is not reached within ten seconds.
    pub async fn wait_for_successes(&self, n: usize) {
        self.wait_until(|events| {
            events.iter().filter(|e| matches!(e, HookEvent::Success { .. })).count() >= n
        })
        .await;
    }

    /// Blocks until at least `n` failure events exist.
    ///
    /// # Panics
    ///
    /// Panics when the count is not reached within ten seconds.
    pub async fn wait_for_failures(&self, n: usize) {
        self.wait_until(|events| {
            events.iter().filter(|e| matches!(e, HookEvent::Failure { .. })).count() >= n
        })
        .await;
    }

    fn count(&self, predicate: impl Fn(&HookEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|event| predicate(event)).count()
    }

    async fn wait_until(&self, predicate: impl Fn(&[HookEvent]) -> bool) {
        let wait = async {
            loop {
                let notified = self.changed.notified();
                tokio::pin!(notified);
                // Register before checking, so a notification arriving
                // between the check and the await is not lost.
                notified.as_mut().enable();
                if predicate(&self.events.lock().unwrap()) {
                    return;
                }
                notified.await;
            }
        };
        if tokio::time::timeout(WAIT_TIMEOUT, wait).await.is_err() {
            panic!("timed out waiting for hook events, recorded: {:?}", self.events());
        }
    }

    fn record(&self, event: HookEvent) {
        self.events.lock().unwrap().push(event);
        self.changed.notify_waiters();
    }
}

impl TaskHooks for RecordingHooks {
    fn on_success(&self, task_id: TaskId, worker_id: WorkerId) {
        self.record(HookEvent::Success { task: task_id, worker: worker_id });
    }

    fn on_failure(&self, task_id: TaskId, worker_id: WorkerId, error: &TaskError) {
        self.record(HookEvent::Failure {
            task: task_id,
            worker: worker_id,
            message: error.to_string(),
        });
    }
}
