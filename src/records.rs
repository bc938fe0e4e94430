//! Storage-side record shapes and the fixed field mapping.
//!
//! The store names every custom field `<name>_c`; `Id` is the only field
//! kept as-is. Records parse leniently: an unknown status falls back to
//! `pending` and an unparseable timestamp is treated as absent, both with a
//! warning. Counts accept any numeric form the store sends.

use crate::types::{Upload, UploadDraft, UploadSession, UploadStatus};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const UPLOAD_TABLE: &str = "upload_c";
pub const UPLOAD_SESSION_TABLE: &str = "upload_session_c";

/// Fields selected whenever upload records are read
pub const UPLOAD_FIELDS: [&str; 8] = [
    "Id",
    "name_c",
    "size_c",
    "type_c",
    "status_c",
    "progress_c",
    "uploaded_at_c",
    "url_c",
];

/// `upload_c` record as stored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadRecord {
    #[serde(rename = "Id", skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "name_c", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        rename = "size_c",
        default,
        deserialize_with = "lenient_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub size: Option<u64>,
    #[serde(rename = "type_c", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(rename = "status_c", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(
        rename = "progress_c",
        default,
        deserialize_with = "lenient_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub progress: Option<u64>,
    #[serde(rename = "uploaded_at_c", skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<String>,
    #[serde(rename = "url_c", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl UploadRecord {
    /// Storage record for a draft. `id` is set for updates only.
    pub fn from_draft(id: Option<i64>, draft: &UploadDraft) -> Self {
        Self {
            id,
            name: draft.name.clone(),
            size: draft.size,
            mime_type: draft.mime_type.clone(),
            status: draft.status.map(|s| s.as_str().to_string()),
            progress: draft.progress.map(u64::from),
            uploaded_at: draft.uploaded_at.as_ref().map(format_timestamp),
            url: draft.url.clone(),
        }
    }

    pub fn into_upload(self) -> Upload {
        let id = self.id.unwrap_or_default();
        let status = match self.status.as_deref() {
            None => UploadStatus::default(),
            Some(raw) => raw.parse().unwrap_or_else(|e: String| {
                tracing::warn!(id, error = %e, "Treating upload as pending");
                UploadStatus::default()
            }),
        };

        Upload {
            id,
            name: self.name.unwrap_or_default(),
            size: self.size.unwrap_or_default(),
            mime_type: self.mime_type.unwrap_or_default(),
            status,
            progress: self.progress.unwrap_or_default().min(100) as u8,
            uploaded_at: parse_timestamp(self.uploaded_at.as_deref()),
            url: self.url.filter(|u| !u.is_empty()),
        }
    }
}

/// Map a raw store record onto an `Upload`
pub fn upload_from_value(value: Value) -> Result<Upload, serde_json::Error> {
    let record: UploadRecord = serde_json::from_value(value)?;
    Ok(record.into_upload())
}

/// `upload_session_c` record as stored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadSessionRecord {
    #[serde(rename = "Id")]
    pub id: Option<i64>,
    #[serde(rename = "files_c")]
    pub files: Option<String>,
    #[serde(rename = "total_size_c", default, deserialize_with = "lenient_count")]
    pub total_size: Option<u64>,
    #[serde(rename = "started_at_c")]
    pub started_at: Option<String>,
    #[serde(rename = "completed_at_c")]
    pub completed_at: Option<String>,
}

impl UploadSessionRecord {
    pub fn into_session(self) -> UploadSession {
        UploadSession {
            id: self.id.unwrap_or_default(),
            files: self.files.as_deref().map(parse_file_ids).unwrap_or_default(),
            total_size: self.total_size.unwrap_or_default(),
            started_at: parse_timestamp(self.started_at.as_deref()),
            completed_at: parse_timestamp(self.completed_at.as_deref()),
        }
    }
}

/// Map a raw store record onto an `UploadSession`
pub fn session_from_value(value: Value) -> Result<UploadSession, serde_json::Error> {
    let record: UploadSessionRecord = serde_json::from_value(value)?;
    Ok(record.into_session())
}

/// Write payload for a new session. `completed_at_c` is sent as an explicit null.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewSessionRecord {
    pub files_c: String,
    pub total_size_c: u64,
    pub started_at_c: String,
    pub completed_at_c: Option<String>,
}

/// Write payload that stamps a session as completed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionCompletion {
    #[serde(rename = "Id")]
    pub id: i64,
    pub completed_at_c: String,
}

/// `[1, 2, 3]` → `"1,2,3"`
pub fn join_file_ids(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// `"1,2,3"` → `[1, 2, 3]`. Entries that are not integers are dropped.
pub fn parse_file_ids(raw: &str) -> Vec<i64> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .filter_map(|part| part.parse().ok())
        .collect()
}

/// ISO-8601 with milliseconds and a `Z` suffix
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Whole, non-negative count from an integer, float or numeric string.
/// Negatives clamp to 0, fractions truncate, anything else is absent.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(count_from_value))
}

fn count_from_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_i64().map(|i| i.max(0) as u64))
            .or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.max(0.0) as u64),
        Value::Null => None,
        other => {
            tracing::warn!(value = %other, "Ignoring non-numeric count");
            None
        }
    }
}

fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw.filter(|s| !s.is_empty())?;
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => Some(ts.with_timezone(&Utc)),
        Err(e) => {
            tracing::warn!(value = raw, error = %e, "Ignoring unparseable timestamp");
            None
        }
    }
}
