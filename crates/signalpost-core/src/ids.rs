//! Strongly-typed identifiers for hook and log correlation.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Strongly-typed task identifier.
///
/// Wraps a UUID to prevent mixing with other ID types. A task ID is assigned
/// once when the unit of work is created and never changes; it is the only
/// correlation token hooks and logs receive for a task.
///
/// # Example
///
/// ```
/// use signalpost_core::TaskId;
/// let task_id = TaskId::new();
/// println!("executing task: {}", task_id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub Uuid);

impl TaskId {
    /// Creates a new random task ID.
    ///
    /// Uses UUID v4 for globally unique identifiers without coordination.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for TaskId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Pool-local worker identifier.
///
/// Workers are numbered `0..worker_count` at spawn time and keep their index
/// for the lifetime of the pool. The index is only meaningful within one
/// pool instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkerId(pub usize);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for WorkerId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_ids_are_unique() {
        let a = TaskId::new();
        let b = TaskId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn task_id_display_matches_inner_uuid() {
        let uuid = Uuid::new_v4();
        let id = TaskId::from(uuid);
        assert_eq!(id.to_string(), uuid.to_string());
    }

    #[test]
    fn worker_id_displays_index() {
        assert_eq!(WorkerId(3).to_string(), "3");
    }
}
