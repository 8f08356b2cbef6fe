//! Attachment Service
//!
//! Stores uploaded files and creates their attachment records.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use op_core::traits::Id;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::model::{AttachOutcome, Attachment, UnsavedFile, UploadedFile};
use crate::storage::{generate_disk_filename, Storage, StorageError};

/// Service errors
#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),
    #[error("Invalid file: {0}")]
    InvalidFile(String),
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: i64, max: i64 },
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),
    #[error("Store error: {0}")]
    Store(String),
}

pub type AttachmentResult<T> = Result<T, AttachmentError>;

/// Attachment record persistence
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    async fn create(&self, attachment: &mut Attachment) -> AttachmentResult<Id>;

    async fn for_container(&self, container_id: Id) -> AttachmentResult<Vec<Attachment>>;
}

/// In-memory attachment store for testing
pub struct MemoryAttachmentStore {
    attachments: RwLock<Vec<Attachment>>,
    next_id: AtomicI64,
}

impl Default for MemoryAttachmentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAttachmentStore {
    pub fn new() -> Self {
        Self {
            attachments: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

#[async_trait]
impl AttachmentStore for MemoryAttachmentStore {
    async fn create(&self, attachment: &mut Attachment) -> AttachmentResult<Id> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        attachment.id = Some(id);
        self.attachments.write().await.push(attachment.clone());
        Ok(id)
    }

    async fn for_container(&self, container_id: Id) -> AttachmentResult<Vec<Attachment>> {
        let attachments = self.attachments.read().await;
        Ok(attachments
            .iter()
            .filter(|a| a.container_id == container_id)
            .cloned()
            .collect())
    }
}

/// Attachment service configuration
#[derive(Debug, Clone)]
pub struct AttachmentConfig {
    /// Maximum file size in bytes
    pub max_file_size: i64,
    pub blocked_mime_types: Vec<String>,
}

impl Default for AttachmentConfig {
    fn default() -> Self {
        Self {
            max_file_size: 5 * 1024 * 1024,
            blocked_mime_types: vec![
                "application/x-msdownload".to_string(),
                "application/x-executable".to_string(),
            ],
        }
    }
}

impl AttachmentConfig {
    pub fn with_max_file_size(mut self, max_file_size: i64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    fn is_allowed(&self, content_type: &str) -> bool {
        !self.blocked_mime_types.iter().any(|t| t == content_type)
    }
}

/// Attachment service
#[derive(Clone)]
pub struct AttachmentService {
    store: Arc<dyn AttachmentStore>,
    storage: Arc<dyn Storage>,
    config: AttachmentConfig,
}

impl AttachmentService {
    pub fn new(store: Arc<dyn AttachmentStore>, storage: Arc<dyn Storage>, config: AttachmentConfig) -> Self {
        Self {
            store,
            storage,
            config,
        }
    }

    /// In-memory store and storage, for tests and local runs
    pub fn in_memory(config: AttachmentConfig) -> Self {
        Self::new(
            Arc::new(MemoryAttachmentStore::new()),
            Arc::new(crate::storage::MemoryStorage::new()),
            config,
        )
    }

    /// Store one file and create its record under `container_id`
    #[instrument(skip(self, file), fields(filename = %file.filename))]
    pub async fn create(&self, container_id: Id, file: UploadedFile, author_id: Id) -> AttachmentResult<Attachment> {
        if file.filename.trim().is_empty() {
            return Err(AttachmentError::InvalidFile("filename is blank".to_string()));
        }

        let size = file.content.len() as i64;
        if size > self.config.max_file_size {
            return Err(AttachmentError::FileTooLarge {
                size,
                max: self.config.max_file_size,
            });
        }

        let content_type = file.content_type.clone().unwrap_or_else(|| {
            mime_guess::from_path(&file.filename)
                .first_or_octet_stream()
                .to_string()
        });
        if !self.config.is_allowed(&content_type) {
            return Err(AttachmentError::InvalidContentType(content_type));
        }

        let disk_filename = generate_disk_filename(&file.filename);
        let metadata = self.storage.put(&disk_filename, file.content).await?;

        let mut attachment = Attachment {
            id: None,
            container_id,
            filename: file.filename,
            disk_filename,
            filesize: metadata.size as i64,
            content_type,
            digest: metadata.digest,
            author_id,
            description: file.description,
            created_at: Utc::now(),
        };

        let id = self.store.create(&mut attachment).await?;
        info!(id = id, container_id = container_id, storage = self.storage.name(), "Attachment created");

        Ok(attachment)
    }

    /// Attach every file, collecting the ones that failed instead of aborting
    pub async fn attach_files(&self, container_id: Id, files: Vec<UploadedFile>, author_id: Id) -> AttachOutcome {
        let mut outcome = AttachOutcome::default();

        for file in files {
            let filename = file.filename.clone();
            match self.create(container_id, file, author_id).await {
                Ok(attachment) => outcome.attached.push(attachment),
                Err(e) => {
                    warn!(filename = %filename, error = %e, "Attachment could not be saved");
                    outcome.unsaved.push(UnsavedFile {
                        filename,
                        reason: e.to_string(),
                    });
                }
            }
        }

        outcome
    }

    pub async fn for_container(&self, container_id: Id) -> AttachmentResult<Vec<Attachment>> {
        self.store.for_container(container_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{calculate_digest, MemoryStorage};

    fn service(max_file_size: i64) -> (AttachmentService, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let service = AttachmentService::new(
            Arc::new(MemoryAttachmentStore::new()),
            storage.clone(),
            AttachmentConfig::default().with_max_file_size(max_file_size),
        );
        (service, storage)
    }

    #[tokio::test]
    async fn test_create_stores_file_and_record() {
        let (service, storage) = service(1024);

        let attachment = service
            .create(5, UploadedFile::new("notes.txt", "hello").with_description("Notes"), 2)
            .await
            .unwrap();

        assert_eq!(attachment.id, Some(1));
        assert_eq!(attachment.container_id, 5);
        assert_eq!(attachment.content_type, "text/plain");
        assert_eq!(attachment.filesize, 5);
        assert_eq!(attachment.digest, calculate_digest(b"hello"));
        assert_eq!(attachment.description.as_deref(), Some("Notes"));
        assert!(storage.exists(&attachment.disk_filename).await.unwrap());
    }

    #[tokio::test]
    async fn test_too_large_file_is_rejected() {
        let (service, _) = service(3);
        let result = service.create(5, UploadedFile::new("big.txt", "too big"), 2).await;
        assert!(matches!(result, Err(AttachmentError::FileTooLarge { size: 7, max: 3 })));
    }

    #[tokio::test]
    async fn test_blocked_content_type_is_rejected() {
        let (service, _) = service(1024);
        let file = UploadedFile::new("setup.exe", "MZ").with_content_type("application/x-msdownload");
        let result = service.create(5, file, 2).await;
        assert!(matches!(result, Err(AttachmentError::InvalidContentType(_))));
    }

    #[tokio::test]
    async fn test_attach_files_reports_unsaved() {
        let (service, _) = service(4);

        let outcome = service
            .attach_files(
                9,
                vec![
                    UploadedFile::new("ok.txt", "ok"),
                    UploadedFile::new("large.txt", "way too large"),
                    UploadedFile::new("", "x"),
                ],
                2,
            )
            .await;

        assert_eq!(outcome.attached.len(), 1);
        assert_eq!(outcome.unsaved.len(), 2);
        assert_eq!(outcome.unsaved[0].filename, "large.txt");
        assert_eq!(outcome.warning().as_deref(), Some("2 file(s) could not be saved."));

        let stored = service.for_container(9).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].filename, "ok.txt");
    }
}
