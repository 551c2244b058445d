//! Task service façade shared by front ends.
//!
//! Couples a [`TaskStore`] with a [`NotificationBus`] so that every change to
//! the in-memory list is followed by a [`TASKS_UPDATED`] event, and with a
//! [`FilterSelector`] for producing the narrowed view.

use std::fmt;

use taskboard_core::{FilterError, FilterSelector, Priority, Task, TaskBuilder, TaskId, ValidationError};
use taskboard_events::{NotificationBus, PublishReport, TASKS_UPDATED};
use taskboard_store::BlobStore;
use thiserror::Error;
use tracing::debug;

use crate::task_patch::TaskPatch;
use crate::task_store::{LoadOutcome, TaskStore, TaskStoreError};

/// Payload published with [`TASKS_UPDATED`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskChange {
    /// A task was appended.
    Added(TaskId),
    /// A task's text changed.
    Updated(TaskId),
    /// A task's completion flag flipped.
    Toggled(TaskId),
    /// A task was removed.
    Deleted(TaskId),
    /// The list was replaced from storage; carries its length.
    Loaded(usize),
}

impl fmt::Display for TaskChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added(id) => write!(f, "added {id}"),
            Self::Updated(id) => write!(f, "updated {id}"),
            Self::Toggled(id) => write!(f, "toggled {id}"),
            Self::Deleted(id) => write!(f, "deleted {id}"),
            Self::Loaded(count) => write!(f, "loaded {count} tasks"),
        }
    }
}

/// Errors returned by [`TaskService`].
#[derive(Debug, Error)]
pub enum ServiceError {
    /// User input was rejected before reaching the store.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Storage failed; in-memory changes were kept.
    #[error(transparent)]
    Store(#[from] TaskStoreError),
    /// Strict filtering was requested with an unknown strategy.
    #[error(transparent)]
    Filter(#[from] FilterError),
}

impl ServiceError {
    /// True when the list in memory changed but could not be saved.
    #[must_use]
    pub const fn is_unsaved_change(&self) -> bool {
        matches!(
            self,
            Self::Store(TaskStoreError::Backend(_) | TaskStoreError::Serialize(_) | TaskStoreError::Join(_))
        )
    }
}

/// Result alias for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// High-level task operations with change notification.
pub struct TaskService<B> {
    store: TaskStore<B>,
    bus: NotificationBus<TaskChange>,
    builder: TaskBuilder,
    selector: FilterSelector,
    strict_filters: bool,
}

impl<B> fmt::Debug for TaskService<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskService")
            .field("bus", &self.bus)
            .field("selector", &self.selector)
            .field("strict_filters", &self.strict_filters)
            .finish_non_exhaustive()
    }
}

impl<B: BlobStore> TaskService<B> {
    /// Construct a service from an explicitly created store and bus.
    pub fn new(store: TaskStore<B>, bus: NotificationBus<TaskChange>) -> Self {
        Self {
            store,
            bus,
            builder: TaskBuilder::new(),
            selector: FilterSelector::new(),
            strict_filters: false,
        }
    }

    /// Reject unknown filter names instead of passing tasks through.
    #[must_use]
    pub const fn with_strict_filters(mut self, strict: bool) -> Self {
        self.strict_filters = strict;
        self
    }

    /// Borrow the underlying store.
    pub const fn store(&self) -> &TaskStore<B> {
        &self.store
    }

    /// Borrow the notification bus.
    pub const fn bus(&self) -> &NotificationBus<TaskChange> {
        &self.bus
    }

    /// Borrow the filter selector.
    pub const fn selector(&self) -> &FilterSelector {
        &self.selector
    }

    /// Mutable access for registering strategies at runtime.
    pub const fn selector_mut(&mut self) -> &mut FilterSelector {
        &mut self.selector
    }

    /// Load the stored list; publishes when the list was replaced.
    ///
    /// # Errors
    /// Returns an error when the blob cannot be read or parsed.
    pub fn load(&mut self) -> ServiceResult<LoadOutcome> {
        let outcome = self.store.load()?;
        if let LoadOutcome::Loaded(count) = outcome {
            self.notify(TaskChange::Loaded(count));
        }
        Ok(outcome)
    }

    /// Validate input, build a task and append it.
    ///
    /// # Errors
    /// Returns a validation error for blank text, or a store error when the
    /// task could not be saved (it is still listed, but nothing is published).
    pub fn create(&mut self, text: &str, priority: Priority) -> ServiceResult<Task> {
        let task = self.builder.create_task(text, priority)?;
        let task = self.store.add(task)?;
        self.notify(TaskChange::Added(task.id.clone()));
        Ok(task)
    }

    /// Replace the text of an existing task. `Ok(None)` when the id is unknown.
    ///
    /// # Errors
    /// Returns a validation error for blank text or a store error on save failure.
    pub fn edit(&mut self, id: &TaskId, text: &str) -> ServiceResult<Option<Task>> {
        let patch = TaskPatch::new().with_text(text)?;
        let result = self.store.update(id, &patch);
        self.after_lookup(result, TaskChange::Updated(id.clone()))
    }

    /// Flip completion. `Ok(None)` when the id is unknown.
    ///
    /// # Errors
    /// Returns a store error on save failure.
    pub fn toggle(&mut self, id: &TaskId) -> ServiceResult<Option<Task>> {
        let result = self.store.toggle_complete(id);
        self.after_lookup(result, TaskChange::Toggled(id.clone()))
    }

    /// Remove a task. `Ok(None)` when the id is unknown.
    ///
    /// # Errors
    /// Returns a store error on save failure.
    pub fn delete(&mut self, id: &TaskId) -> ServiceResult<Option<Task>> {
        let result = self.store.delete(id);
        self.after_lookup(result, TaskChange::Deleted(id.clone()))
    }

    /// Current list narrowed by a category strategy, then by a text search.
    ///
    /// # Errors
    /// Returns [`ServiceError::Filter`] for unknown categories in strict mode.
    pub fn view(&self, category: &str, query: Option<&str>) -> ServiceResult<Vec<Task>> {
        let tasks = self.store.list();
        if self.strict_filters {
            Ok(self.selector.try_narrow(category, query, &tasks)?)
        } else {
            Ok(self.selector.narrow(category, query, &tasks))
        }
    }

    // Only a persisted mutation is published; unknown ids and save failures are not.
    fn after_lookup(
        &self,
        result: Result<Option<Task>, TaskStoreError>,
        change: TaskChange,
    ) -> ServiceResult<Option<Task>> {
        let task = result?;
        if task.is_some() {
            self.notify(change);
        }
        Ok(task)
    }

    fn notify(&self, change: TaskChange) -> PublishReport {
        let report = self.bus.publish(TASKS_UPDATED, &change);
        debug!(%change, delivered = report.delivered, failed = report.failures.len(), "Notified subscribers");
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};
    use taskboard_store::{BlobStoreError, MemoryBlobStore};

    /// Reads nothing and refuses every write.
    struct ReadOnlyBlobStore;

    impl BlobStore for ReadOnlyBlobStore {
        fn get(&self, _key: &str) -> taskboard_store::Result<Option<String>> {
            Ok(None)
        }

        fn set(&self, key: &str, _value: &str) -> taskboard_store::Result<()> {
            Err(BlobStoreError::Io {
                key: key.to_owned(),
                source: io::Error::from(io::ErrorKind::PermissionDenied),
            })
        }
    }

    fn service() -> TaskService<Arc<MemoryBlobStore>> {
        TaskService::new(
            TaskStore::new(Arc::new(MemoryBlobStore::new())),
            NotificationBus::new(),
        )
    }

    fn recorder<B: BlobStore>(service: &TaskService<B>) -> Arc<Mutex<Vec<TaskChange>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        service
            .bus()
            .subscribe(TASKS_UPDATED, move |change: &TaskChange| {
                sink.lock()
                    .map_err(|_| anyhow::anyhow!("poisoned"))?
                    .push(change.clone());
                Ok(())
            })
            .detach();
        seen
    }

    fn changes(seen: &Arc<Mutex<Vec<TaskChange>>>) -> Vec<TaskChange> {
        seen.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }

    fn ok<T, E: std::fmt::Display>(result: Result<T, E>, context: &str) -> T {
        result.unwrap_or_else(|err| panic!("{context}: {err}"))
    }

    #[test]
    fn mutations_publish_tasks_updated() {
        let mut service = service();
        let seen = recorder(&service);

        let task = ok(service.create("Buy milk", Priority::Low), "create");
        ok(service.edit(&task.id, "Buy oat milk"), "edit");
        ok(service.toggle(&task.id), "toggle");
        ok(service.delete(&task.id), "delete");

        assert_eq!(
            changes(&seen),
            vec![
                TaskChange::Added(task.id.clone()),
                TaskChange::Updated(task.id.clone()),
                TaskChange::Toggled(task.id.clone()),
                TaskChange::Deleted(task.id),
            ]
        );
    }

    #[test]
    fn not_found_and_validation_publish_nothing() {
        let mut service = service();
        let seen = recorder(&service);
        let ghost: TaskId = ok("ghost".parse(), "id");

        assert_eq!(ok(service.toggle(&ghost), "toggle"), None);
        assert_eq!(ok(service.delete(&ghost), "delete"), None);
        assert!(matches!(service.create("   ", Priority::High), Err(ServiceError::Validation(_))));
        assert!(matches!(service.edit(&ghost, ""), Err(ServiceError::Validation(_))));
        assert!(changes(&seen).is_empty());
        assert!(service.store().is_empty());
    }

    #[test]
    fn failed_saves_keep_the_change_but_publish_nothing() {
        let mut service = TaskService::new(TaskStore::new(ReadOnlyBlobStore), NotificationBus::new());
        let seen = recorder(&service);

        let Err(err) = service.create("x", Priority::Low) else {
            panic!("create must report the failed save");
        };
        assert!(err.is_unsaved_change());
        let listed = service.store().list();
        assert_eq!(listed.len(), 1);
        let id = listed[0].id.clone();

        let Err(err) = service.toggle(&id) else {
            panic!("toggle must report the failed save");
        };
        assert!(err.is_unsaved_change());
        assert_eq!(service.store().get(&id).map(|t| t.completed), Some(true));

        assert!(service.edit(&id, "y").is_err());
        assert!(service.delete(&id).is_err());
        assert!(service.store().is_empty());

        assert!(changes(&seen).is_empty());
    }

    #[test]
    fn view_narrows_by_category_then_search() {
        let mut service = service();
        ok(service.create("Buy milk", Priority::Low), "create");
        ok(service.create("Fix login bug", Priority::Urgent), "create");
        ok(service.create("Fix typo", Priority::Low), "create");

        let view = ok(service.view("low", Some("FIX")), "view");
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].text, "Fix typo");
    }

    #[test]
    fn unknown_category_passes_through_unless_strict() {
        let mut service = service();
        ok(service.create("a", Priority::Low), "create");

        assert_eq!(ok(service.view("lwo", None), "lenient view").len(), 1);

        let service = service.with_strict_filters(true);
        assert!(matches!(
            service.view("lwo", None),
            Err(ServiceError::Filter(FilterError::UnknownStrategy { .. }))
        ));
    }

    #[test]
    fn registered_strategies_are_used_by_view() {
        let mut service = service();
        ok(service.create("a", Priority::Low), "create");
        let done = ok(service.create("b", Priority::Low), "create");
        ok(service.toggle(&done.id), "toggle");

        service.selector_mut().add_strategy("pending", |tasks: &[Task], _| {
            tasks.iter().filter(|t| !t.completed).cloned().collect()
        });
        let pending = ok(service.view("pending", None), "view");
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].text, "a");
    }
}
