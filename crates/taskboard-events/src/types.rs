//! Event names and delivery reports

use std::fmt;

use crate::DeliveryError;

/// Event published after any successful task mutation or reload.
pub const TASKS_UPDATED: &str = "tasksUpdated";

/// Identifier of a single registration on a bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub(crate) u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// A subscriber that did not handle the event.
#[derive(Debug)]
pub struct DeliveryFailure {
    /// Registration that failed.
    pub subscription: SubscriptionId,
    /// What went wrong.
    pub error: DeliveryError,
}

/// Outcome of a single `publish` call.
#[derive(Debug, Default)]
pub struct PublishReport {
    /// Subscribers that returned successfully.
    pub delivered: usize,
    /// Subscribers that failed; later subscribers still ran.
    pub failures: Vec<DeliveryFailure>,
}

impl PublishReport {
    /// Total number of subscribers invoked.
    #[must_use]
    pub fn invoked(&self) -> usize {
        self.delivered + self.failures.len()
    }

    /// True when every invoked subscriber succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
