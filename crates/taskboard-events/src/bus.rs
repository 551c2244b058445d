//! Publish/subscribe registry

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::{debug, warn};

use crate::{DeliveryError, DeliveryFailure, PublishReport, SubscriptionId};

/// Shared subscriber callback.
///
/// Keep a clone of the `Arc` to unsubscribe by identity later.
pub type Callback<P> = Arc<dyn Fn(&P) -> anyhow::Result<()> + Send + Sync>;

struct Entry<P> {
    id: SubscriptionId,
    callback: Callback<P>,
}

impl<P> Clone for Entry<P> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            callback: Arc::clone(&self.callback),
        }
    }
}

struct Registry<P> {
    next_id: u64,
    events: HashMap<String, Vec<Entry<P>>>,
}

impl<P> Default for Registry<P> {
    fn default() -> Self {
        Self {
            next_id: 0,
            events: HashMap::new(),
        }
    }
}

impl<P> Registry<P> {
    fn remove_where(&mut self, event: &str, mut pred: impl FnMut(&Entry<P>) -> bool) -> usize {
        let Some(entries) = self.events.get_mut(event) else {
            return 0;
        };
        let before = entries.len();
        entries.retain(|entry| !pred(entry));
        let removed = before - entries.len();
        if entries.is_empty() {
            self.events.remove(event);
        }
        removed
    }
}

/// Named-event publish/subscribe bus.
///
/// Cloning yields another handle to the same registry. A callback that
/// captures a bus handle keeps the registry alive for as long as that
/// callback stays registered, so keep its [`Subscription`] rather than
/// detaching it.
pub struct NotificationBus<P> {
    registry: Arc<Mutex<Registry<P>>>,
}

impl<P> Clone for NotificationBus<P> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<P> Default for NotificationBus<P> {
    fn default() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry::default())),
        }
    }
}

impl<P> fmt::Debug for NotificationBus<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = lock(&self.registry);
        let mut counts: Vec<(&String, usize)> =
            registry.events.iter().map(|(name, entries)| (name, entries.len())).collect();
        counts.sort();
        f.debug_struct("NotificationBus").field("events", &counts).finish()
    }
}

// Callbacks never run while the lock is held, so a poisoned lock still guards
// a consistent registry.
fn lock<P>(registry: &Mutex<Registry<P>>) -> MutexGuard<'_, Registry<P>> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<P> NotificationBus<P> {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a closure under `event`.
    pub fn subscribe<F>(&self, event: impl Into<String>, callback: F) -> Subscription<P>
    where
        F: Fn(&P) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.subscribe_shared(event, &(Arc::new(callback) as Callback<P>))
    }

    /// Register an already shared callback under `event`.
    ///
    /// The same callback may be registered several times; each registration is
    /// invoked on publish.
    pub fn subscribe_shared(&self, event: impl Into<String>, callback: &Callback<P>) -> Subscription<P> {
        let event = event.into();
        let mut registry = lock(&self.registry);
        registry.next_id += 1;
        let id = SubscriptionId(registry.next_id);
        registry.events.entry(event.clone()).or_default().push(Entry {
            id,
            callback: Arc::clone(callback),
        });
        drop(registry);

        debug!(%event, %id, "Subscribed");
        Subscription {
            registry: Some(Arc::downgrade(&self.registry)),
            event,
            id,
        }
    }

    /// Remove every registration of `callback` under `event`, returning how many were removed.
    pub fn unsubscribe(&self, event: &str, callback: &Callback<P>) -> usize {
        let removed =
            lock(&self.registry).remove_where(event, |entry| Arc::ptr_eq(&entry.callback, callback));
        debug!(event, removed, "Unsubscribed callback");
        removed
    }

    /// Number of registrations currently held for `event`.
    #[must_use]
    pub fn subscriber_count(&self, event: &str) -> usize {
        lock(&self.registry).events.get(event).map_or(0, Vec::len)
    }

    /// Invoke every callback registered for `event`, in registration order.
    ///
    /// The subscriber list is captured before the first callback runs, so
    /// callbacks may subscribe or unsubscribe without affecting this delivery.
    /// A failing or panicking callback is logged and skipped.
    pub fn publish(&self, event: &str, payload: &P) -> PublishReport {
        let entries: Vec<Entry<P>> = lock(&self.registry)
            .events
            .get(event)
            .cloned()
            .unwrap_or_default();

        let mut report = PublishReport::default();
        for entry in entries {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| (entry.callback)(payload)));
            let error = match outcome {
                Ok(Ok(())) => {
                    report.delivered += 1;
                    continue;
                }
                Ok(Err(err)) => DeliveryError::Failed(err),
                Err(panic) => DeliveryError::Panicked(panic_message(panic.as_ref())),
            };
            warn!(event, subscription = %entry.id, %error, "Subscriber failed");
            report.failures.push(DeliveryFailure {
                subscription: entry.id,
                error,
            });
        }

        debug!(event, delivered = report.delivered, failed = report.failures.len(), "Published");
        report
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned())
}

/// Handle to one registration; dropping it unregisters the callback.
#[must_use = "dropping a Subscription immediately unregisters it"]
pub struct Subscription<P> {
    registry: Option<Weak<Mutex<Registry<P>>>>,
    event: String,
    id: SubscriptionId,
}

impl<P> Subscription<P> {
    /// Identifier of this registration.
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Event this registration listens to.
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Keep the registration alive for the lifetime of the bus.
    pub fn detach(mut self) {
        self.registry = None;
    }

    /// Unregister now. Equivalent to dropping the handle.
    pub fn cancel(self) {
        drop(self);
    }
}

impl<P> Drop for Subscription<P> {
    fn drop(&mut self) {
        let Some(registry) = self.registry.take().and_then(|weak| weak.upgrade()) else {
            return;
        };
        let id = self.id;
        let removed = lock(&registry).remove_where(&self.event, |entry| entry.id == id);
        if removed > 0 {
            debug!(event = %self.event, %id, "Subscription released");
        }
    }
}

impl<P> fmt::Debug for Subscription<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("event", &self.event)
            .field("id", &self.id)
            .field("attached", &self.registry.is_some())
            .finish()
    }
}
