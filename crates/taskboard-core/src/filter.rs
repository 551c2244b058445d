//! Named strategies that narrow a task sequence.
//!
//! Built-in strategies are modelled as [`Strategy`] variants. Callers that need
//! more can register closures on a [`FilterSelector`] under any name; a
//! registered closure shadows a built-in of the same name.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::warn;

use crate::error::FilterError;
use crate::priority::Priority;
use crate::task::Task;
use crate::text_matcher::TextMatcher;

/// Runtime-registered strategy.
pub type StrategyFn = Arc<dyn Fn(&[Task], Option<&str>) -> Vec<Task> + Send + Sync>;

/// Built-in filter strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Identity.
    All,
    /// Keep tasks with exactly this priority.
    Priority(Priority),
    /// Keep completed tasks.
    Completed,
    /// Case-insensitive substring search over task text.
    Search,
}

impl Strategy {
    /// Every built-in strategy.
    pub const BUILTIN: [Self; 7] = [
        Self::All,
        Self::Priority(Priority::Low),
        Self::Priority(Priority::Medium),
        Self::Priority(Priority::High),
        Self::Priority(Priority::Urgent),
        Self::Completed,
        Self::Search,
    ];

    /// Canonical name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Priority(p) => p.as_str(),
            Self::Completed => "completed",
            Self::Search => "search",
        }
    }

    const fn legacy_name(self) -> &'static str {
        match self {
            Self::All => "todas",
            Self::Priority(p) => p.legacy_name(),
            Self::Completed => "completadas",
            Self::Search => "search",
        }
    }

    /// Resolve a canonical or legacy strategy name.
    ///
    /// Surrounding whitespace and ASCII case are ignored.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase();
        Self::BUILTIN
            .into_iter()
            .find(|s| s.name() == normalized || s.legacy_name() == normalized)
    }

    /// Apply the strategy, cloning the tasks that survive.
    #[must_use]
    pub fn apply(self, tasks: &[Task], query: Option<&str>) -> Vec<Task> {
        match self {
            Self::All => tasks.to_vec(),
            Self::Priority(priority) => retain(tasks, |task| task.has_priority(priority)),
            Self::Completed => retain(tasks, |task| task.completed),
            Self::Search => match query.and_then(TextMatcher::new) {
                Some(matcher) => retain(tasks, |task| matcher.matches(task)),
                None => tasks.to_vec(),
            },
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| FilterError::UnknownStrategy { name: s.to_owned() })
    }
}

fn retain(tasks: &[Task], keep: impl Fn(&Task) -> bool) -> Vec<Task> {
    tasks.iter().filter(|task| keep(task)).cloned().collect()
}

/// Registry of named strategies selectable at call time.
#[derive(Clone, Default)]
pub struct FilterSelector {
    custom: BTreeMap<String, StrategyFn>,
}

enum Resolved<'a> {
    Custom(&'a StrategyFn),
    Builtin(Strategy),
}

impl FilterSelector {
    /// Selector with only the built-in strategies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or overwrite a named strategy.
    pub fn add_strategy<F>(&mut self, name: impl Into<String>, strategy: F)
    where
        F: Fn(&[Task], Option<&str>) -> Vec<Task> + Send + Sync + 'static,
    {
        self.custom.insert(name.into(), Arc::new(strategy));
    }

    /// Whether `name` resolves to any strategy.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// Canonical built-in names followed by registered names, without duplicates.
    #[must_use]
    pub fn strategy_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Strategy::BUILTIN.iter().map(|s| s.name().to_owned()).collect();
        for name in self.custom.keys() {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }

    /// Apply the named strategy; unknown names pass `tasks` through unchanged.
    #[must_use]
    pub fn filter(&self, name: &str, tasks: &[Task], query: Option<&str>) -> Vec<Task> {
        self.try_filter(name, tasks, query).unwrap_or_else(|err| {
            warn!(strategy = name, %err, "Unknown filter strategy, returning tasks unfiltered");
            tasks.to_vec()
        })
    }

    /// Apply the named strategy, rejecting unknown names.
    ///
    /// # Errors
    /// Returns [`FilterError::UnknownStrategy`] when `name` is not registered.
    pub fn try_filter(
        &self,
        name: &str,
        tasks: &[Task],
        query: Option<&str>,
    ) -> Result<Vec<Task>, FilterError> {
        match self.resolve(name) {
            Some(Resolved::Custom(strategy)) => Ok(strategy(tasks, query)),
            Some(Resolved::Builtin(strategy)) => Ok(strategy.apply(tasks, query)),
            None => Err(FilterError::UnknownStrategy { name: name.to_owned() }),
        }
    }

    /// Category pass followed by a search pass (skipped for blank queries).
    #[must_use]
    pub fn narrow(&self, category: &str, query: Option<&str>, tasks: &[Task]) -> Vec<Task> {
        let narrowed = self.filter(category, tasks, None);
        Self::search_pass(narrowed, query)
    }

    /// Strict variant of [`narrow`](Self::narrow).
    ///
    /// # Errors
    /// Returns [`FilterError::UnknownStrategy`] when `category` is not registered.
    pub fn try_narrow(
        &self,
        category: &str,
        query: Option<&str>,
        tasks: &[Task],
    ) -> Result<Vec<Task>, FilterError> {
        let narrowed = self.try_filter(category, tasks, None)?;
        Ok(Self::search_pass(narrowed, query))
    }

    fn search_pass(tasks: Vec<Task>, query: Option<&str>) -> Vec<Task> {
        match query.and_then(TextMatcher::new) {
            Some(matcher) => tasks.into_iter().filter(|task| matcher.matches(task)).collect(),
            None => tasks,
        }
    }

    fn resolve(&self, name: &str) -> Option<Resolved<'_>> {
        self.custom
            .get(name)
            .map(Resolved::Custom)
            .or_else(|| Strategy::from_name(name).map(Resolved::Builtin))
    }
}

impl fmt::Debug for FilterSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterSelector")
            .field("custom", &self.custom.keys().collect::<Vec<_>>())
            .finish()
    }
}
