//! # op-notifications
//!
//! In-app notifications for OpenProject RS.
//!
//! Creating a work package notifies its watchers, assignee and responsible
//! user. Delivery runs in a spawned task so the request never waits on it.

pub mod notification;
pub mod service;

pub use notification::{Notification, NotificationReason};
pub use service::{
    MemoryNotificationStore, NotificationError, NotificationService, NotificationStore,
};
