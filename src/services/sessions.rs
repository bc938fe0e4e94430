//! Upload sessions: grouping uploads with aggregate size and start/completion times.

use crate::api_contracts::{RecordParams, StoreResponse};
use crate::error::{Result, UploadError};
use crate::records::{
    format_timestamp, join_file_ids, session_from_value, NewSessionRecord, SessionCompletion,
    UPLOAD_SESSION_TABLE,
};
use crate::services::upload_service::message_or;
use crate::types::{SessionFile, UploadSession};
use crate::UploadService;
use chrono::Utc;
use serde_json::Value;

const CREATE_FAILED: &str = "Failed to create upload session";
const COMPLETE_FAILED: &str = "Failed to complete upload session";

impl UploadService {
    /// Create a session over `files`, started now and not yet completed
    pub async fn create_session(&self, files: &[SessionFile]) -> Result<UploadSession> {
        self.insert_session(files)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Error creating session"))
    }

    /// Stamp the session's completion time with now
    pub async fn complete_session(&self, id: i64) -> Result<UploadSession> {
        self.stamp_session_completed(id)
            .await
            .inspect_err(|e| tracing::error!(id, error = %e, "Error completing session"))
    }

    async fn insert_session(&self, files: &[SessionFile]) -> Result<UploadSession> {
        let ids: Vec<i64> = files.iter().map(|f| f.id).collect();
        let record = NewSessionRecord {
            files_c: join_file_ids(&ids),
            total_size_c: files.iter().map(|f| f.size).sum(),
            started_at_c: format_timestamp(&Utc::now()),
            completed_at_c: None,
        };

        let params = RecordParams::single(&record)?;
        let response = self
            .store
            .create_record(UPLOAD_SESSION_TABLE, &params)
            .await
            .map_err(|e| UploadError::Creation(e.to_string()))?;

        if !response.success {
            return Err(UploadError::Creation(message_or(response.message, CREATE_FAILED)));
        }

        match first_result(&response) {
            Some((true, Some(data), _)) => {
                let session = session_from_value(data)?;
                tracing::info!(id = session.id, files = session.files.len(), "Upload session started");
                Ok(session)
            }
            Some((_, _, message)) => Err(UploadError::Creation(message_or(message, CREATE_FAILED))),
            None => Err(UploadError::Creation(CREATE_FAILED.to_string())),
        }
    }

    async fn stamp_session_completed(&self, id: i64) -> Result<UploadSession> {
        let record = SessionCompletion {
            id,
            completed_at_c: format_timestamp(&Utc::now()),
        };

        let params = RecordParams::single(&record)?;
        let response = self
            .store
            .update_record(UPLOAD_SESSION_TABLE, &params)
            .await
            .map_err(|e| UploadError::Completion(e.to_string()))?;

        if !response.success {
            return Err(UploadError::Completion(message_or(response.message, COMPLETE_FAILED)));
        }

        match first_result(&response) {
            Some((true, Some(data), _)) => Ok(session_from_value(data)?),
            Some((_, _, message)) => {
                Err(UploadError::Completion(message_or(message, COMPLETE_FAILED)))
            }
            None => Err(UploadError::not_found(
                id,
                Some(format!("Upload session with ID {} not found", id)),
            )),
        }
    }
}

/// (success, non-null data, message) of the first per-record result
fn first_result(response: &StoreResponse<Value>) -> Option<(bool, Option<Value>, Option<String>)> {
    let first = response.results.as_ref()?.first()?;
    let data = first.data.clone().filter(|d| !d.is_null());
    Some((first.success, data, first.message.clone()))
}
