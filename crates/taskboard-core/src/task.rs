use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::id::TaskId;
use crate::priority::Priority;

/// A single to-do item, the only persisted entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Identifier, fixed at creation.
    pub id: TaskId,
    /// User-visible text; never blank.
    pub text: String,
    /// Urgency tag, fixed at creation.
    pub priority: Priority,
    /// Completion flag.
    #[serde(default)]
    pub completed: bool,
    /// Creation timestamp.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Task {
    /// Whether the task carries the given priority.
    #[must_use]
    pub fn has_priority(&self, priority: Priority) -> bool {
        self.priority == priority
    }
}
