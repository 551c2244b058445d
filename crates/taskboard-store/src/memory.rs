use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;

use crate::{BlobStore, BlobStoreError, Result};

/// Process-local blob store; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, String>>,
}

impl MemoryBlobStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with a single blob.
    #[must_use]
    pub fn with_blob(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut blobs = HashMap::new();
        blobs.insert(key.into(), value.into());
        Self {
            blobs: RwLock::new(blobs),
        }
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let blobs = self.blobs.read().map_err(|_| BlobStoreError::Poisoned)?;
        Ok(blobs.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut blobs = self.blobs.write().map_err(|_| BlobStoreError::Poisoned)?;
        blobs.insert(key.to_owned(), value.to_owned());
        debug!(key, bytes = value.len(), "Stored blob in memory");
        Ok(())
    }
}
