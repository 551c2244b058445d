//! Notification bus for taskboard
//!
//! This crate decouples task mutations from whatever refreshes the view:
//! mutators publish a named event, views subscribe to it.

mod bus;
mod error;
mod types;

pub use bus::{Callback, NotificationBus, Subscription};
pub use error::DeliveryError;
pub use types::{DeliveryFailure, PublishReport, SubscriptionId, TASKS_UPDATED};
