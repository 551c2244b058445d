//! Canonical in-memory task list persisted to a blob store.

use taskboard_core::{Task, TaskId};
use taskboard_store::{BlobStore, BlobStoreError};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::task_patch::TaskPatch;

/// Blob key used when none is configured.
pub const DEFAULT_STORAGE_KEY: &str = "tasks";

/// Persistence failures surfaced by [`TaskStore`].
#[derive(Debug, Error)]
pub enum TaskStoreError {
    /// The blob store could not be read or written.
    #[error("blob store error: {0}")]
    Backend(#[from] BlobStoreError),

    /// The stored blob is not a valid task list.
    #[error("stored task list under {key:?} is malformed: {source}")]
    Corrupt {
        /// Blob key that was read.
        key: String,
        /// Parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// The task list could not be serialized.
    #[error("failed to serialize task list: {0}")]
    Serialize(#[source] serde_json::Error),

    /// A background persistence job did not complete.
    #[error("background task failed: {0}")]
    Join(String),
}

/// Result of [`TaskStore::load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The stored list replaced the in-memory list; carries its length.
    Loaded(usize),
    /// Nothing was stored; the in-memory list was left as is.
    Missing,
}

/// Owner of the canonical ordered task list.
///
/// Every mutation rewrites the whole list under a single blob key. When that
/// write fails the in-memory change is kept and the error is returned, so
/// callers can tell the user that changes are not being saved.
#[derive(Debug)]
pub struct TaskStore<B> {
    blob: B,
    key: String,
    tasks: Vec<Task>,
}

impl<B: BlobStore> TaskStore<B> {
    /// Empty store persisting under [`DEFAULT_STORAGE_KEY`].
    pub fn new(blob: B) -> Self {
        Self::with_key(blob, DEFAULT_STORAGE_KEY)
    }

    /// Empty store persisting under `key`.
    pub fn with_key(blob: B, key: impl Into<String>) -> Self {
        Self {
            blob,
            key: key.into(),
            tasks: Vec::new(),
        }
    }

    /// Blob key this store writes to.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Borrow the backing blob store.
    pub const fn blob(&self) -> &B {
        &self.blob
    }

    /// Number of tasks held.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the store holds no tasks.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Append a task and persist. Identifiers are trusted, not checked for duplicates.
    ///
    /// # Errors
    /// Returns an error when persisting fails; the task stays in memory.
    pub fn add(&mut self, task: Task) -> Result<Task, TaskStoreError> {
        debug!(task = %task.id, priority = %task.priority, "Adding task");
        self.tasks.push(task.clone());
        self.persist()?;
        Ok(task)
    }

    /// Copy of the current list in store order.
    pub fn list(&self) -> Vec<Task> {
        self.tasks.clone()
    }

    /// Copy of a single task.
    pub fn get(&self, id: &TaskId) -> Option<Task> {
        self.position(id).map(|idx| self.tasks[idx].clone())
    }

    /// Merge `patch` into the task with `id`. `Ok(None)` when no such task exists.
    ///
    /// # Errors
    /// Returns an error when persisting fails; the change stays in memory.
    pub fn update(&mut self, id: &TaskId, patch: &TaskPatch) -> Result<Option<Task>, TaskStoreError> {
        let Some(idx) = self.position(id) else {
            debug!(task = %id, "Update skipped, task not found");
            return Ok(None);
        };
        patch.apply(&mut self.tasks[idx]);
        debug!(task = %id, ?patch, "Updated task");
        self.persist()?;
        Ok(Some(self.tasks[idx].clone()))
    }

    /// Remove the task with `id`. `Ok(None)` when no such task exists.
    ///
    /// # Errors
    /// Returns an error when persisting fails; the task stays removed in memory.
    pub fn delete(&mut self, id: &TaskId) -> Result<Option<Task>, TaskStoreError> {
        let Some(idx) = self.position(id) else {
            debug!(task = %id, "Delete skipped, task not found");
            return Ok(None);
        };
        let removed = self.tasks.remove(idx);
        debug!(task = %id, "Deleted task");
        self.persist()?;
        Ok(Some(removed))
    }

    /// Flip the completion flag of the task with `id`. `Ok(None)` when no such task exists.
    ///
    /// # Errors
    /// Returns an error when persisting fails; the change stays in memory.
    pub fn toggle_complete(&mut self, id: &TaskId) -> Result<Option<Task>, TaskStoreError> {
        let Some(idx) = self.position(id) else {
            debug!(task = %id, "Toggle skipped, task not found");
            return Ok(None);
        };
        let task = &mut self.tasks[idx];
        task.completed = !task.completed;
        debug!(task = %id, completed = task.completed, "Toggled task");
        self.persist()?;
        Ok(Some(self.tasks[idx].clone()))
    }

    /// Replace the in-memory list with the stored one.
    ///
    /// An absent (or blank) blob leaves the in-memory list untouched, as does any
    /// error.
    ///
    /// # Errors
    /// Returns [`TaskStoreError::Backend`] when the blob cannot be read and
    /// [`TaskStoreError::Corrupt`] when it cannot be parsed.
    pub fn load(&mut self) -> Result<LoadOutcome, TaskStoreError> {
        let Some(raw) = self.blob.get(&self.key)? else {
            info!(key = %self.key, "No stored task list");
            return Ok(LoadOutcome::Missing);
        };
        if raw.trim().is_empty() {
            info!(key = %self.key, "Stored task list is blank");
            return Ok(LoadOutcome::Missing);
        }

        let tasks: Vec<Task> = serde_json::from_str(&raw).map_err(|source| {
            warn!(key = %self.key, %source, "Stored task list is malformed");
            TaskStoreError::Corrupt {
                key: self.key.clone(),
                source,
            }
        })?;
        self.tasks = tasks;
        info!(key = %self.key, count = self.tasks.len(), "Loaded task list");
        Ok(LoadOutcome::Loaded(self.tasks.len()))
    }

    /// Write the full list to the blob store.
    ///
    /// # Errors
    /// Returns an error when serialization or the blob write fails.
    pub fn save(&self) -> Result<(), TaskStoreError> {
        self.persist()
    }

    fn persist(&self) -> Result<(), TaskStoreError> {
        let body = serde_json::to_string(&self.tasks).map_err(TaskStoreError::Serialize)?;
        self.blob.set(&self.key, &body).map_err(|err| {
            warn!(key = %self.key, %err, "Failed to persist task list, changes are not saved");
            TaskStoreError::from(err)
        })?;
        debug!(key = %self.key, count = self.tasks.len(), "Persisted task list");
        Ok(())
    }

    fn position(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| &task.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use taskboard_core::{Priority, TaskBuilder};
    use taskboard_store::MemoryBlobStore;

    fn build(text: &str, priority: Priority) -> Task {
        TaskBuilder::new()
            .create_task(text, priority)
            .unwrap_or_else(|err| panic!("valid task: {err}"))
    }

    fn ok<T, E: std::fmt::Display>(result: Result<T, E>, context: &str) -> T {
        result.unwrap_or_else(|err| panic!("{context}: {err}"))
    }

    fn memory_store() -> TaskStore<Arc<MemoryBlobStore>> {
        TaskStore::new(Arc::new(MemoryBlobStore::new()))
    }

    /// Blob store whose writes can be switched off.
    #[derive(Default)]
    struct Switchable {
        inner: MemoryBlobStore,
        broken: AtomicBool,
    }

    impl BlobStore for Switchable {
        fn get(&self, key: &str) -> taskboard_store::Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> taskboard_store::Result<()> {
            if self.broken.load(Ordering::SeqCst) {
                return Err(BlobStoreError::Io {
                    key: key.to_owned(),
                    source: io::Error::other("disk full"),
                });
            }
            self.inner.set(key, value)
        }
    }

    #[test]
    fn add_then_list_contains_task_once() {
        let mut store = memory_store();
        let task = build("Buy milk", Priority::Low);
        let stored = ok(store.add(task.clone()), "add");
        assert_eq!(stored, task);

        let listed = store.list();
        assert_eq!(listed.iter().filter(|t| t.id == task.id).count(), 1);
        assert_eq!(store.get(&task.id), Some(task));
    }

    #[test]
    fn every_mutation_rewrites_the_blob() {
        let mut store = memory_store();
        let task = ok(store.add(build("a", Priority::Low)), "add");
        let blob = |store: &TaskStore<Arc<MemoryBlobStore>>| {
            ok(store.blob().get(DEFAULT_STORAGE_KEY), "get").unwrap_or_default()
        };
        assert!(blob(&store).contains("\"completed\":false"));

        ok(store.toggle_complete(&task.id), "toggle");
        assert!(blob(&store).contains("\"completed\":true"));

        ok(store.delete(&task.id), "delete");
        assert_eq!(blob(&store), "[]");
    }

    #[test]
    fn delete_removes_task_and_reports_missing_ids() {
        let mut store = memory_store();
        let a = ok(store.add(build("a", Priority::Low)), "add a");
        let b = ok(store.add(build("b", Priority::High)), "add b");

        assert_eq!(ok(store.delete(&a.id), "delete"), Some(a.clone()));
        assert_eq!(store.list(), vec![b.clone()]);

        let before = store.list();
        assert_eq!(ok(store.delete(&a.id), "delete again"), None);
        assert_eq!(store.list(), before);
    }

    #[test]
    fn update_changes_only_text() {
        let mut store = memory_store();
        let task = ok(store.add(build("old", Priority::Urgent)), "add");
        let patch = ok(TaskPatch::new().with_text("x"), "patch");

        let updated = ok(store.update(&task.id, &patch), "update")
            .unwrap_or_else(|| panic!("task must exist"));
        assert_eq!(updated.text, "x");
        assert_eq!(updated.id, task.id);
        assert_eq!(updated.priority, task.priority);
        assert_eq!(updated.completed, task.completed);
        assert_eq!(updated.created_at, task.created_at);
    }

    #[test]
    fn update_and_toggle_on_missing_ids_return_none() {
        let mut store = memory_store();
        let ghost: TaskId = ok("ghost".parse(), "id");
        assert_eq!(ok(store.update(&ghost, &TaskPatch::new()), "update"), None);
        assert_eq!(ok(store.toggle_complete(&ghost), "toggle"), None);
        // Nothing was persisted for no-op lookups.
        assert_eq!(ok(store.blob().get(DEFAULT_STORAGE_KEY), "get"), None);
    }

    #[test]
    fn toggle_twice_restores_original_state() {
        let mut store = memory_store();
        let task = ok(store.add(build("flip", Priority::Medium)), "add");
        let once = ok(store.toggle_complete(&task.id), "toggle").unwrap_or_else(|| panic!("exists"));
        assert!(once.completed);
        let twice = ok(store.toggle_complete(&task.id), "toggle").unwrap_or_else(|| panic!("exists"));
        assert_eq!(twice, task);
    }

    #[test]
    fn returned_tasks_are_copies() {
        let mut store = memory_store();
        let task = ok(store.add(build("safe", Priority::Low)), "add");
        let mut listed = store.list();
        listed[0].text = "tampered".into();
        assert_eq!(store.get(&task.id).map(|t| t.text), Some("safe".to_owned()));
    }

    #[test]
    fn persistence_round_trip_into_fresh_store() {
        let blob = Arc::new(MemoryBlobStore::new());
        let mut store = TaskStore::new(Arc::clone(&blob));
        ok(store.add(build("one", Priority::Low)), "add");
        let two = ok(store.add(build("two", Priority::Urgent)), "add");
        ok(store.toggle_complete(&two.id), "toggle");
        ok(store.save(), "save");

        let mut fresh = TaskStore::new(blob);
        assert!(fresh.is_empty());
        assert_eq!(ok(fresh.load(), "load"), LoadOutcome::Loaded(2));
        assert_eq!(fresh.list(), store.list());
    }

    #[test]
    fn load_without_blob_keeps_memory() {
        let mut store = memory_store();
        let task = build("keep me", Priority::Low);
        store.tasks.push(task.clone());
        assert_eq!(ok(store.load(), "load"), LoadOutcome::Missing);
        assert_eq!(store.list(), vec![task]);
    }

    #[test]
    fn blank_blob_counts_as_missing() {
        let mut store = TaskStore::new(MemoryBlobStore::with_blob(DEFAULT_STORAGE_KEY, "  "));
        assert_eq!(ok(store.load(), "load"), LoadOutcome::Missing);
    }

    #[test]
    fn corrupt_blob_is_reported_and_memory_is_untouched() {
        let mut store = TaskStore::new(MemoryBlobStore::with_blob(DEFAULT_STORAGE_KEY, "{not json"));
        let task = build("survivor", Priority::High);
        store.tasks.push(task.clone());

        let err = store.load().err().unwrap_or_else(|| panic!("load must fail"));
        assert!(matches!(err, TaskStoreError::Corrupt { ref key, .. } if key == DEFAULT_STORAGE_KEY));
        assert_eq!(store.list(), vec![task]);
    }

    #[test]
    fn failed_write_keeps_change_in_memory_and_reports_error() {
        let blob = Arc::new(Switchable::default());
        let mut store = TaskStore::new(Arc::clone(&blob));
        let task = ok(store.add(build("draft", Priority::Low)), "add");

        blob.broken.store(true, Ordering::SeqCst);
        let err = store.toggle_complete(&task.id).err().unwrap_or_else(|| panic!("must fail"));
        assert!(matches!(err, TaskStoreError::Backend(BlobStoreError::Io { .. })));
        assert_eq!(store.get(&task.id).map(|t| t.completed), Some(true));

        blob.broken.store(false, Ordering::SeqCst);
        ok(store.save(), "save after recovery");
        let mut fresh = TaskStore::new(blob);
        ok(fresh.load(), "load");
        assert_eq!(fresh.list(), store.list());
    }

    #[test]
    fn custom_key_is_used_for_persistence() {
        let blob = Arc::new(MemoryBlobStore::new());
        let mut store = TaskStore::with_key(Arc::clone(&blob), "work");
        ok(store.add(build("a", Priority::Low)), "add");
        assert_eq!(store.key(), "work");
        assert!(ok(blob.get("work"), "get").is_some());
        assert_eq!(ok(blob.get(DEFAULT_STORAGE_KEY), "get"), None);
    }
}
