//! # op-attachments
//!
//! File attachment handling for OpenProject RS.
//!
//! ## Features
//!
//! - Storage abstraction (local filesystem, in-memory)
//! - Attachment metadata records per work package
//! - Batch attaching of uploaded files, reporting the ones that failed
//!
//! ## Example
//!
//! ```rust,ignore
//! use op_attachments::{AttachmentService, MemoryAttachmentStore, MemoryStorage, UploadedFile};
//! use std::sync::Arc;
//!
//! let service = AttachmentService::new(
//!     Arc::new(MemoryAttachmentStore::new()),
//!     Arc::new(MemoryStorage::new()),
//!     Default::default(),
//! );
//!
//! let outcome = service
//!     .attach_files(work_package_id, vec![UploadedFile::new("notes.txt", data)], user_id)
//!     .await;
//! if let Some(warning) = outcome.warning() {
//!     tracing::warn!("{warning}");
//! }
//! ```

pub mod model;
pub mod service;
pub mod storage;

pub use model::{AttachOutcome, Attachment, UnsavedFile, UploadedFile};
pub use service::{
    AttachmentConfig, AttachmentError, AttachmentResult, AttachmentService, AttachmentStore,
    MemoryAttachmentStore,
};
pub use storage::{
    calculate_digest, generate_disk_filename, FileMetadata, LocalStorage, MemoryStorage, Storage,
    StorageError, StorageResult,
};
