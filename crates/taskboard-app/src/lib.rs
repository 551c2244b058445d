//! Application layer logic for taskboard.
//!
//! This crate provides the task store, configuration, and the service façade
//! that front ends drive.

pub mod async_store;
pub mod config;
pub mod service;
pub mod task_patch;
pub mod task_store;

// Re-exports for convenience
pub use async_store::AsyncTaskStore;
pub use config::{FilterConfig, ProjectConfig, RetryConfig, StorageConfig};
pub use service::{ServiceError, ServiceResult, TaskChange, TaskService};
pub use task_patch::TaskPatch;
pub use task_store::{DEFAULT_STORAGE_KEY, LoadOutcome, TaskStore, TaskStoreError};
