//! Notification Service
//!
//! Creates and stores notifications for work package events.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use op_core::traits::Id;
use op_models::WorkPackage;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::notification::{recipients, Notification};

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Storage error: {0}")]
    StorageError(String),
    #[error("Work package has not been saved")]
    Unsaved,
}

pub type NotificationResult<T> = Result<T, NotificationError>;

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn create(&self, notification: &mut Notification) -> NotificationResult<Id>;

    async fn for_user(&self, user_id: Id, unread_only: bool) -> NotificationResult<Vec<Notification>>;
}

/// In-memory notification store for development/testing.
///
/// Keeps at most `limit` notifications; the oldest are dropped first.
pub struct MemoryNotificationStore {
    notifications: RwLock<VecDeque<Notification>>,
    next_id: AtomicI64,
    limit: usize,
}

impl Default for MemoryNotificationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryNotificationStore {
    pub const DEFAULT_LIMIT: usize = 10_000;

    pub fn new() -> Self {
        Self::with_limit(Self::DEFAULT_LIMIT)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            notifications: RwLock::new(VecDeque::new()),
            next_id: AtomicI64::new(1),
            limit: limit.max(1),
        }
    }

    pub async fn len(&self) -> usize {
        self.notifications.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn create(&self, notification: &mut Notification) -> NotificationResult<Id> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        notification.id = Some(id);

        let mut notifications = self.notifications.write().await;
        if notifications.len() >= self.limit {
            notifications.pop_front();
        }
        notifications.push_back(notification.clone());
        Ok(id)
    }

    async fn for_user(&self, user_id: Id, unread_only: bool) -> NotificationResult<Vec<Notification>> {
        let notifications = self.notifications.read().await;
        Ok(notifications
            .iter()
            .filter(|n| n.recipient_id == user_id)
            .filter(|n| !unread_only || n.is_unread())
            .cloned()
            .collect())
    }
}

/// Notification service
#[derive(Clone)]
pub struct NotificationService {
    store: Arc<dyn NotificationStore>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryNotificationStore::new()))
    }

    /// Store one notification per recipient of a freshly created work package
    pub async fn deliver_created(&self, wp: &WorkPackage) -> NotificationResult<usize> {
        let resource_id = wp.id.ok_or(NotificationError::Unsaved)?;
        let now = Utc::now();
        let mut delivered = 0;

        for (recipient_id, reason) in recipients(wp) {
            let mut notification = Notification {
                id: None,
                recipient_id,
                actor_id: wp.author_id,
                reason,
                resource_id,
                project_id: wp.project_id,
                subject: wp.subject.clone(),
                read_at: None,
                created_at: now,
            };
            self.store.create(&mut notification).await?;
            debug!(recipient_id, ?reason, resource_id, "Notification stored");
            delivered += 1;
        }

        info!(work_package_id = resource_id, delivered, "Creation notifications delivered");
        Ok(delivered)
    }

    /// Fire-and-forget variant of `deliver_created`
    pub fn work_package_created(&self, wp: WorkPackage) -> JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            if let Err(e) = service.deliver_created(&wp).await {
                warn!(error = %e, "Creation notifications failed");
            }
        })
    }

    pub async fn for_user(&self, user_id: Id, unread_only: bool) -> NotificationResult<Vec<Notification>> {
        self.store.for_user(user_id, unread_only).await
    }
}
