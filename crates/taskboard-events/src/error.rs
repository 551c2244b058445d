//! Error types for event delivery

/// Why a single subscriber did not handle an event
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// Callback returned an error
    #[error("subscriber failed: {0:#}")]
    Failed(anyhow::Error),

    /// Callback panicked
    #[error("subscriber panicked: {0}")]
    Panicked(String),
}
