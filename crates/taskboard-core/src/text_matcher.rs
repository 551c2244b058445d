use crate::task::Task;

/// Case-insensitive substring matcher for task text.
#[derive(Debug, Clone)]
pub struct TextMatcher {
    needle: String,
}

impl TextMatcher {
    /// Normalize a query string into a matcher. Returns `None` for blank inputs.
    #[must_use]
    pub fn new(query: &str) -> Option<Self> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self {
            needle: trimmed.to_lowercase(),
        })
    }

    /// Determine whether the task text contains the query.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        task.text.to_lowercase().contains(&self.needle)
    }
}
