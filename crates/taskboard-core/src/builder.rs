//! Construction of new task records.

use time::OffsetDateTime;

use crate::error::{ValidationError, normalize_text};
use crate::id::TaskId;
use crate::priority::Priority;
use crate::task::Task;

/// Source of "now" for freshly created tasks.
pub trait Clock {
    /// Current instant in UTC.
    fn now_utc(&self) -> OffsetDateTime;
}

/// Wall clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Clock frozen at a fixed instant (tests, imports).
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now_utc(&self) -> OffsetDateTime {
        self.0
    }
}

/// Builds validated [`Task`] values with fresh identifiers.
#[derive(Debug, Clone, Default)]
pub struct TaskBuilder<C = SystemClock> {
    clock: C,
}

impl TaskBuilder<SystemClock> {
    /// Builder using the system clock.
    #[must_use]
    pub const fn new() -> Self {
        Self { clock: SystemClock }
    }
}

impl<C: Clock> TaskBuilder<C> {
    /// Builder using a custom clock.
    pub const fn with_clock(clock: C) -> Self {
        Self { clock }
    }

    /// Create a new, incomplete task.
    ///
    /// # Errors
    /// Returns [`ValidationError::EmptyText`] for blank text.
    pub fn create_task(&self, text: &str, priority: Priority) -> Result<Task, ValidationError> {
        let text = normalize_text(text)?;
        Ok(Task {
            id: TaskId::new(),
            text,
            priority,
            completed: false,
            created_at: self.clock.now_utc(),
        })
    }
}
