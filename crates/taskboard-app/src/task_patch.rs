//! Partial task updates applied by the store.

use taskboard_core::{Task, ValidationError, normalize_text};

/// Partial update merged into an existing task.
///
/// Only the mutable fields are representable; `id`, `priority` and
/// `created_at` are fixed once a task exists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    text: Option<String>,
    completed: Option<bool>,
}

impl TaskPatch {
    /// Empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the task text.
    ///
    /// # Errors
    /// Returns [`ValidationError::EmptyText`] for blank text.
    pub fn with_text(mut self, text: &str) -> Result<Self, ValidationError> {
        self.text = Some(normalize_text(text)?);
        Ok(self)
    }

    /// Set the completion flag.
    #[must_use]
    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    /// New text, if any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// New completion flag, if any.
    #[must_use]
    pub const fn completed(&self) -> Option<bool> {
        self.completed
    }

    /// Returns true when applying the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.text.is_none() && self.completed.is_none()
    }

    pub(crate) fn apply(&self, task: &mut Task) {
        if let Some(text) = &self.text {
            task.text.clone_from(text);
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
    }
}
