//! Attachment Model

use bytes::Bytes;
use chrono::{DateTime, Utc};
use op_core::traits::Id;
use serde::{Deserialize, Serialize};

/// Attachment record of a work package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: Option<Id>,
    /// Work package the file belongs to
    pub container_id: Id,
    /// Original filename
    pub filename: String,
    /// Key in the storage backend
    #[serde(skip_serializing)]
    pub disk_filename: String,
    pub filesize: i64,
    pub content_type: String,
    /// SHA256 digest
    pub digest: String,
    pub author_id: Id,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Attachment {
    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }

    /// Human-readable file size
    pub fn human_filesize(&self) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB"];

        let mut size = self.filesize as f64;
        let mut unit = 0;
        while size >= 1024.0 && unit < UNITS.len() - 1 {
            size /= 1024.0;
            unit += 1;
        }

        if unit == 0 {
            format!("{} B", self.filesize)
        } else {
            format!("{:.1} {}", size, UNITS[unit])
        }
    }
}

/// A file submitted along with a work package form
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub description: Option<String>,
    pub content: Bytes,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            content_type: None,
            description: None,
            content: content.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A file that could not be attached, and why
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnsavedFile {
    pub filename: String,
    pub reason: String,
}

/// Result of attaching a batch of files
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AttachOutcome {
    pub attached: Vec<Attachment>,
    pub unsaved: Vec<UnsavedFile>,
}

impl AttachOutcome {
    /// Flash warning for files that were dropped
    pub fn warning(&self) -> Option<String> {
        if self.unsaved.is_empty() {
            None
        } else {
            Some(format!("{} file(s) could not be saved.", self.unsaved.len()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attachment(filesize: i64, content_type: &str) -> Attachment {
        Attachment {
            id: None,
            container_id: 1,
            filename: "file".into(),
            disk_filename: "disk".into(),
            filesize,
            content_type: content_type.into(),
            digest: String::new(),
            author_id: 1,
            description: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_human_filesize() {
        let cases = [
            (0, "0 B"),
            (512, "512 B"),
            (1024, "1.0 KB"),
            (1536, "1.5 KB"),
            (1024 * 1024, "1.0 MB"),
            (1024 * 1024 * 1024, "1.0 GB"),
        ];

        for (size, expected) in cases {
            assert_eq!(attachment(size, "text/plain").human_filesize(), expected, "Size: {}", size);
        }
    }

    #[test]
    fn test_is_image() {
        assert!(attachment(1, "image/png").is_image());
        assert!(!attachment(1, "application/pdf").is_image());
    }

    #[test]
    fn test_warning_counts_unsaved_files() {
        let mut outcome = AttachOutcome::default();
        assert_eq!(outcome.warning(), None);

        outcome.unsaved.push(UnsavedFile {
            filename: "a.exe".into(),
            reason: "blocked".into(),
        });
        outcome.unsaved.push(UnsavedFile {
            filename: "b.iso".into(),
            reason: "too large".into(),
        });
        assert_eq!(outcome.warning().as_deref(), Some("2 file(s) could not be saved."));
    }
}
