//! Key-value blob storage backing the task list.
//!
//! A blob store maps string keys to string values. The task list is written
//! as a single JSON document under one fixed key.

mod error;
mod file;
mod memory;
mod retry;

use std::sync::Arc;

pub use error::{BlobStoreError, Result};
pub use file::FileBlobStore;
pub use memory::MemoryBlobStore;
pub use retry::{RetryPolicy, RetryingBlobStore};

/// Minimal persistence contract: `get` and `set` of string blobs.
pub trait BlobStore {
    /// Read the blob stored under `key`, or `None` when nothing was written yet.
    ///
    /// # Errors
    /// Returns a backend error when the blob cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the blob stored under `key`.
    ///
    /// # Errors
    /// Returns a backend error when the blob cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

impl<B: BlobStore + ?Sized> BlobStore for &B {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

impl<B: BlobStore + ?Sized> BlobStore for Arc<B> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

impl<B: BlobStore + ?Sized> BlobStore for Box<B> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

/// Validate a key for backends that map keys onto file names.
///
/// # Errors
/// Returns [`BlobStoreError::InvalidKey`] unless the key is non-empty ASCII
/// alphanumerics, `-` or `_`.
pub fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if valid {
        Ok(())
    } else {
        Err(BlobStoreError::InvalidKey(key.to_owned()))
    }
}
