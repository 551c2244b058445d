use std::thread;
use std::time::Duration;

use tracing::warn;

use crate::{BlobStore, Result};

/// Bounded exponential backoff for transient blob store failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one; `1` disables retrying.
    pub attempts: u32,
    /// Delay before the second attempt; doubled for each further attempt.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(20),
        }
    }
}

impl RetryPolicy {
    /// Policy performing a single attempt.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    /// Delay to wait after the given failed attempt (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1 << shift)
    }
}

/// Wraps a blob store and retries transient failures.
#[derive(Debug, Clone)]
pub struct RetryingBlobStore<B> {
    inner: B,
    policy: RetryPolicy,
}

impl<B> RetryingBlobStore<B> {
    /// Wrap `inner` with the given policy.
    pub const fn new(inner: B, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// Borrow the wrapped store.
    pub const fn inner(&self) -> &B {
        &self.inner
    }

    fn run<T>(&self, op: &'static str, key: &str, mut f: impl FnMut() -> Result<T>) -> Result<T> {
        let attempts = self.policy.attempts.max(1);
        let mut attempt = 1;
        loop {
            match f() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < attempts => {
                    let delay = self.policy.delay_after(attempt);
                    warn!(op, key, attempt, ?delay, %err, "Transient blob store failure, retrying");
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl<B: BlobStore> BlobStore for RetryingBlobStore<B> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.run("get", key, || self.inner.get(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.run("set", key, || self.inner.set(key, value))
    }
}
