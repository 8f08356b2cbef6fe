//! PostgreSQL notification store
//!
//! ```sql
//! CREATE TABLE notifications (
//!     id BIGSERIAL PRIMARY KEY,
//!     recipient_id BIGINT NOT NULL, actor_id BIGINT,
//!     reason TEXT NOT NULL,              -- 'assigned' | 'responsible' | 'watched'
//!     resource_id BIGINT NOT NULL, project_id BIGINT NOT NULL,
//!     subject TEXT NOT NULL, read_at TIMESTAMPTZ,
//!     created_at TIMESTAMPTZ NOT NULL
//! );
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use op_core::traits::Id;
use op_notifications::{Notification, NotificationError, NotificationReason, NotificationStore};
use sqlx::{FromRow, PgPool};

#[derive(Debug, Clone, FromRow)]
struct NotificationRow {
    id: i64,
    recipient_id: i64,
    actor_id: Option<i64>,
    reason: String,
    resource_id: i64,
    project_id: i64,
    subject: String,
    read_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = NotificationError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        let reason = NotificationReason::parse(&row.reason).ok_or_else(|| {
            NotificationError::StorageError(format!("notification {}: unknown reason {}", row.id, row.reason))
        })?;

        Ok(Notification {
            id: Some(row.id),
            recipient_id: row.recipient_id,
            actor_id: row.actor_id,
            reason,
            resource_id: row.resource_id,
            project_id: row.project_id,
            subject: row.subject,
            read_at: row.read_at,
            created_at: row.created_at,
        })
    }
}

fn storage_error(e: sqlx::Error) -> NotificationError {
    NotificationError::StorageError(e.to_string())
}

/// Notifications in the `notifications` table
pub struct PgNotificationStore {
    pool: PgPool,
}

impl PgNotificationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn create(&self, notification: &mut Notification) -> Result<Id, NotificationError> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO notifications (
                recipient_id, actor_id, reason, resource_id, project_id,
                subject, read_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(notification.recipient_id)
        .bind(notification.actor_id)
        .bind(notification.reason.as_str())
        .bind(notification.resource_id)
        .bind(notification.project_id)
        .bind(&notification.subject)
        .bind(notification.read_at)
        .bind(notification.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error)?;

        notification.id = Some(id);
        Ok(id)
    }

    async fn for_user(&self, user_id: Id, unread_only: bool) -> Result<Vec<Notification>, NotificationError> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, recipient_id, actor_id, reason, resource_id, project_id,
                   subject, read_at, created_at
            FROM notifications
            WHERE recipient_id = $1 AND (NOT $2 OR read_at IS NULL)
            ORDER BY created_at, id
            "#,
        )
        .bind(user_id)
        .bind(unread_only)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        rows.into_iter().map(Notification::try_from).collect()
    }
}
