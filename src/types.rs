//! Core domain types for uploads and upload sessions.
//!
//! These are the shapes callers work with. Their storage counterparts,
//! with the store's `<name>_c` field names, live in `records`.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

/// Lifecycle of an upload. Only moves forward: pending → uploading → completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    #[default]
    Pending,
    Uploading,
    Completed,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStatus::Pending => "pending",
            UploadStatus::Uploading => "uploading",
            UploadStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UploadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(UploadStatus::Pending),
            "uploading" => Ok(UploadStatus::Uploading),
            "completed" => Ok(UploadStatus::Completed),
            other => Err(format!("Unknown upload status: {}", other)),
        }
    }
}

/// An upload record as seen by callers
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Upload {
    #[serde(rename = "Id")]
    pub id: i64,
    pub name: String,
    /// Size in bytes
    pub size: u64,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub status: UploadStatus,
    /// 0-100
    pub progress: u8,
    pub uploaded_at: Option<DateTime<Utc>>,
    pub url: Option<String>,
}

/// Field set for create / update. Unset fields are left out of the write.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadDraft {
    pub name: Option<String>,
    pub size: Option<u64>,
    #[serde(rename = "type")]
    pub mime_type: Option<String>,
    pub status: Option<UploadStatus>,
    pub progress: Option<u8>,
    pub uploaded_at: Option<DateTime<Utc>>,
    pub url: Option<String>,
}

impl UploadDraft {
    /// Draft for a brand new file: name, size and type only
    pub fn new_file(name: impl Into<String>, size: u64, mime_type: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            size: Some(size),
            mime_type: Some(mime_type.into()),
            ..Default::default()
        }
    }
}

impl From<&Upload> for UploadDraft {
    fn from(upload: &Upload) -> Self {
        Self {
            name: Some(upload.name.clone()),
            size: Some(upload.size),
            mime_type: Some(upload.mime_type.clone()),
            status: Some(upload.status),
            progress: Some(upload.progress),
            uploaded_at: upload.uploaded_at,
            url: upload.url.clone(),
        }
    }
}

/// A group of uploads tracked together
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSession {
    #[serde(rename = "Id")]
    pub id: i64,
    /// Upload ids, in the order they were added
    pub files: Vec<i64>,
    pub total_size: u64,
    pub started_at: Option<DateTime<Utc>>,
    /// Set once, by `UploadService::complete_session`
    pub completed_at: Option<DateTime<Utc>>,
}

/// One upload going into a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionFile {
    pub id: i64,
    pub size: u64,
}

impl From<&Upload> for SessionFile {
    fn from(upload: &Upload) -> Self {
        Self {
            id: upload.id,
            size: upload.size,
        }
    }
}

/// A local file about to be uploaded, as checked by validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
}

impl FileCandidate {
    pub fn new(name: impl Into<String>, size: u64, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size,
            mime_type: mime_type.into(),
        }
    }
}
