//! Async wrapper for hosts where persistence has real I/O latency.

use std::sync::Arc;

use taskboard_core::{Task, TaskId};
use taskboard_store::BlobStore;
use tokio::sync::Mutex;

use crate::task_patch::TaskPatch;
use crate::task_store::{LoadOutcome, TaskStore, TaskStoreError};

/// Shared [`TaskStore`] whose persisting operations run on the blocking pool.
///
/// Operations are serialized through a `tokio::sync::Mutex`, so the
/// synchronous store's semantics carry over unchanged.
pub struct AsyncTaskStore<B> {
    inner: Arc<Mutex<TaskStore<B>>>,
}

impl<B> Clone for AsyncTaskStore<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B> AsyncTaskStore<B>
where
    B: BlobStore + Send + 'static,
{
    /// Wrap a synchronous store.
    pub fn new(store: TaskStore<B>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    async fn run<T, F>(&self, op: F) -> Result<T, TaskStoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut TaskStore<B>) -> Result<T, TaskStoreError> + Send + 'static,
    {
        let mut guard = Arc::clone(&self.inner).lock_owned().await;
        tokio::task::spawn_blocking(move || op(&mut *guard))
            .await
            .map_err(|e| TaskStoreError::Join(format!("Task join error: {e}")))?
    }

    /// See [`TaskStore::add`].
    ///
    /// # Errors
    /// Returns an error when persisting fails.
    pub async fn add(&self, task: Task) -> Result<Task, TaskStoreError> {
        self.run(move |store| store.add(task)).await
    }

    /// See [`TaskStore::list`].
    pub async fn list(&self) -> Vec<Task> {
        self.inner.lock().await.list()
    }

    /// See [`TaskStore::get`].
    pub async fn get(&self, id: &TaskId) -> Option<Task> {
        self.inner.lock().await.get(id)
    }

    /// See [`TaskStore::update`].
    ///
    /// # Errors
    /// Returns an error when persisting fails.
    pub async fn update(&self, id: TaskId, patch: TaskPatch) -> Result<Option<Task>, TaskStoreError> {
        self.run(move |store| store.update(&id, &patch)).await
    }

    /// See [`TaskStore::delete`].
    ///
    /// # Errors
    /// Returns an error when persisting fails.
    pub async fn delete(&self, id: TaskId) -> Result<Option<Task>, TaskStoreError> {
        self.run(move |store| store.delete(&id)).await
    }

    /// See [`TaskStore::toggle_complete`].
    ///
    /// # Errors
    /// Returns an error when persisting fails.
    pub async fn toggle_complete(&self, id: TaskId) -> Result<Option<Task>, TaskStoreError> {
        self.run(move |store| store.toggle_complete(&id)).await
    }

    /// See [`TaskStore::load`].
    ///
    /// # Errors
    /// Returns an error when the blob cannot be read or parsed.
    pub async fn load(&self) -> Result<LoadOutcome, TaskStoreError> {
        self.run(TaskStore::load).await
    }

    /// See [`TaskStore::save`].
    ///
    /// # Errors
    /// Returns an error when serialization or the blob write fails.
    pub async fn save(&self) -> Result<(), TaskStoreError> {
        self.run(|store| store.save()).await
    }
}
