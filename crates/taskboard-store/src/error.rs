//! Error types for blob store operations.

use std::io;

use thiserror::Error;

/// Errors that can occur while reading or writing blobs.
#[derive(Error, Debug)]
pub enum BlobStoreError {
    /// Key contains characters that cannot be mapped onto the backend.
    #[error("Invalid blob key: {0:?}")]
    InvalidKey(String),

    /// I/O operation failed.
    #[error("I/O error on blob {key}: {source}")]
    Io {
        /// Key being accessed.
        key: String,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },

    /// A lock guarding in-memory state was poisoned by a panicking writer.
    #[error("Blob store lock poisoned")]
    Poisoned,
}

impl BlobStoreError {
    /// Whether retrying the same operation may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Io { source, .. } => matches!(
                source.kind(),
                io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
            ),
            Self::InvalidKey(_) | Self::Poisoned => false,
        }
    }
}

/// Result alias for blob store operations.
pub type Result<T> = std::result::Result<T, BlobStoreError>;
