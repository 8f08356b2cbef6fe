//! PostgreSQL attachment store
//!
//! ```sql
//! CREATE TABLE attachments (
//!     id BIGSERIAL PRIMARY KEY,
//!     container_id BIGINT, container_type TEXT,
//!     filename TEXT NOT NULL, disk_filename TEXT NOT NULL,
//!     filesize BIGINT NOT NULL DEFAULT 0, content_type TEXT,
//!     digest TEXT, author_id BIGINT NOT NULL, description TEXT,
//!     created_at TIMESTAMPTZ NOT NULL
//! );
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use op_attachments::{Attachment, AttachmentError, AttachmentResult, AttachmentStore};
use op_core::traits::Id;
use sqlx::{FromRow, PgPool};
use tracing::debug;

/// Attachments of work packages only
const CONTAINER_TYPE: &str = "WorkPackage";

#[derive(Debug, Clone, FromRow)]
struct AttachmentRow {
    id: i64,
    container_id: Option<i64>,
    filename: String,
    disk_filename: String,
    filesize: i64,
    content_type: Option<String>,
    digest: Option<String>,
    author_id: i64,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<AttachmentRow> for Attachment {
    fn from(row: AttachmentRow) -> Self {
        Attachment {
            id: Some(row.id),
            container_id: row.container_id.unwrap_or_default(),
            filename: row.filename,
            disk_filename: row.disk_filename,
            filesize: row.filesize,
            content_type: row
                .content_type
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            digest: row.digest.unwrap_or_default(),
            author_id: row.author_id,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

fn store_error(e: sqlx::Error) -> AttachmentError {
    AttachmentError::Store(e.to_string())
}

/// Attachment records in the `attachments` table
pub struct PgAttachmentStore {
    pool: PgPool,
}

impl PgAttachmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttachmentStore for PgAttachmentStore {
    async fn create(&self, attachment: &mut Attachment) -> AttachmentResult<Id> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO attachments (
                container_id, container_type, filename, disk_filename, filesize,
                content_type, digest, author_id, description, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(attachment.container_id)
        .bind(CONTAINER_TYPE)
        .bind(&attachment.filename)
        .bind(&attachment.disk_filename)
        .bind(attachment.filesize)
        .bind(&attachment.content_type)
        .bind(&attachment.digest)
        .bind(attachment.author_id)
        .bind(&attachment.description)
        .bind(attachment.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)?;

        debug!(id, container_id = attachment.container_id, "attachment record created");
        attachment.id = Some(id);
        Ok(id)
    }

    async fn for_container(&self, container_id: Id) -> AttachmentResult<Vec<Attachment>> {
        let rows = sqlx::query_as::<_, AttachmentRow>(
            r#"
            SELECT id, container_id, filename, disk_filename, filesize,
                   content_type, digest, author_id, description, created_at
            FROM attachments
            WHERE container_type = $1 AND container_id = $2
            ORDER BY created_at, id
            "#,
        )
        .bind(CONTAINER_TYPE)
        .bind(container_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(rows.into_iter().map(Attachment::from).collect())
    }
}
