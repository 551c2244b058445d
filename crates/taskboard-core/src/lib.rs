//! Domain types for taskboard: tasks, priorities, construction and filtering.

/// Task construction.
pub mod builder;
/// Validation and filter errors.
pub mod error;
/// Named filter strategies.
pub mod filter;
/// Identifier types.
pub mod id;
/// Priority tags.
pub mod priority;
/// The task record.
pub mod task;
/// Free-text matching.
pub mod text_matcher;

pub use builder::{Clock, FixedClock, SystemClock, TaskBuilder};
pub use error::{FilterError, ValidationError, normalize_text};
pub use filter::{FilterSelector, Strategy, StrategyFn};
pub use id::{EmptyTaskId, TaskId};
pub use priority::{InvalidPriority, Priority};
pub use task::Task;
pub use text_matcher::TextMatcher;
