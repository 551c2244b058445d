//! Error types shared by the task model and filters.

use thiserror::Error;

/// Rejected user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Task text was empty or whitespace only.
    #[error("task text must not be empty")]
    EmptyText,
}

/// Errors raised by the strict filter entry point.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// No built-in or registered strategy carries this name.
    #[error("unknown filter strategy: {name}")]
    UnknownStrategy {
        /// Name as requested by the caller.
        name: String,
    },
}

/// Trim `text` and reject blank input.
///
/// # Errors
/// Returns [`ValidationError::EmptyText`] when nothing remains after trimming.
pub fn normalize_text(text: &str) -> Result<String, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyText);
    }
    Ok(trimmed.to_owned())
}
