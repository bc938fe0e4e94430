//! Upload records service
//!
//! CRUD over `upload_c` records, the simulated progress-driven upload,
//! file validation and history. Session operations live in
//! `services::sessions`.
//!
//! Two failure policies: `get_all` and `get_history` log and return an
//! empty list; every other operation returns the error. A write whose store
//! call fails outright reports the write's own error kind
//! (`Creation`, `Update`, `Deletion`).

use crate::api_contracts::{
    DeleteParams, FilterOperator, RecordParams, RecordQuery, SortType, StoreResponse, WhereClause,
};
use crate::config::{ServiceTimings, StoreConfig};
use crate::error::{Result, UploadError};
use crate::http_store::HttpRecordStore;
use crate::record_store::RecordStore;
use crate::records::{upload_from_value, UploadRecord, UPLOAD_FIELDS, UPLOAD_TABLE};
use crate::types::{FileCandidate, Upload, UploadDraft, UploadStatus};
use crate::validation;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;

/// Most records a list call returns
const PAGE_LIMIT: u32 = 100;

/// Progress values written by `simulate_upload`, in order
const PROGRESS_STEPS: std::ops::RangeInclusive<u8> = 0..=100;
const PROGRESS_STEP: usize = 10;

/// Synchronous progress callback, invoked after each progress write
pub type ProgressFn = dyn Fn(u8) + Send + Sync;

/// Stateless façade over the record store. Cheap to clone.
#[derive(Clone)]
pub struct UploadService {
    pub(crate) store: Arc<dyn RecordStore>,
    pub(crate) timings: ServiceTimings,
}

impl UploadService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self::with_timings(store, ServiceTimings::default())
    }

    pub fn with_timings(store: Arc<dyn RecordStore>, timings: ServiceTimings) -> Self {
        Self { store, timings }
    }

    /// Service backed by the HTTP record store
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(Arc::new(HttpRecordStore::new(config)))
    }

    pub fn timings(&self) -> ServiceTimings {
        self.timings
    }

    /// Up to 100 uploads, newest id first. Failures are logged and yield `[]`.
    pub async fn get_all(&self) -> Vec<Upload> {
        let query = RecordQuery::select(&UPLOAD_FIELDS)
            .order_by("Id", SortType::Desc)
            .page(PAGE_LIMIT, 0);

        self.fetch_uploads_soft(&query, "Error fetching uploads").await
    }

    /// Up to 100 completed uploads, most recently uploaded first.
    /// Failures are logged and yield `[]`.
    pub async fn get_history(&self) -> Vec<Upload> {
        let query = RecordQuery::select(&UPLOAD_FIELDS)
            .filter(WhereClause::new(
                "status_c",
                FilterOperator::EqualTo,
                &[UploadStatus::Completed.as_str()],
            ))
            // Passed through untouched; the store decides what HasValue "" means
            .filter(WhereClause::new("uploaded_at_c", FilterOperator::HasValue, &[""]))
            .order_by("uploaded_at_c", SortType::Desc)
            .page(PAGE_LIMIT, 0);

        self.fetch_uploads_soft(&query, "Error fetching upload history").await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Upload> {
        self.fetch_upload(id)
            .await
            .inspect_err(|e| tracing::error!(id, error = %e, "Error fetching upload"))
    }

    /// Insert one upload. Status defaults to pending and progress to 0.
    pub async fn create(&self, draft: UploadDraft) -> Result<Upload> {
        self.create_upload(draft)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Error creating upload"))
    }

    /// Overwrite the set fields of one upload
    pub async fn update(&self, id: i64, draft: UploadDraft) -> Result<Upload> {
        self.update_upload(id, &draft)
            .await
            .inspect_err(|e| tracing::error!(id, error = %e, "Error updating upload"))
    }

    /// Returns whether any record was removed. Zero matches is `Ok(false)`.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        self.delete_upload(id)
            .await
            .inspect_err(|e| tracing::error!(id, error = %e, "Error deleting upload"))
    }

    /// Walk one upload through progress 0, 10, ..., 100 and then mark it completed.
    ///
    /// Each step pauses, writes `uploading` + the step's progress, then calls
    /// `on_progress`. A failed write stops the run; steps already written
    /// stay written.
    pub async fn simulate_upload(
        &self,
        id: i64,
        on_progress: Option<&ProgressFn>,
    ) -> Result<Upload> {
        self.run_simulated_upload(id, on_progress)
            .await
            .inspect_err(|e| tracing::error!(id, error = %e, "Error simulating upload"))
    }

    /// Size limit then type allow-list, after the validation pause
    pub async fn validate_file(&self, file: &FileCandidate) -> Result<()> {
        tokio::time::sleep(self.timings.validation_delay).await;
        validation::check_file(file)
    }

    async fn fetch_uploads_soft(&self, query: &RecordQuery, context: &str) -> Vec<Upload> {
        let response = match self.store.fetch_records(UPLOAD_TABLE, query).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, "{}", context);
                return Vec::new();
            }
        };

        if !response.success {
            tracing::error!(message = ?response.message, "{}", context);
            return Vec::new();
        }

        response
            .data
            .unwrap_or_default()
            .into_iter()
            .filter_map(|record| match upload_from_value(record) {
                Ok(upload) => Some(upload),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping malformed upload record");
                    None
                }
            })
            .collect()
    }

    async fn fetch_upload(&self, id: i64) -> Result<Upload> {
        let query = RecordQuery::select(&UPLOAD_FIELDS);
        let response = self.store.get_record_by_id(UPLOAD_TABLE, id, &query).await?;

        if !response.success {
            return Err(UploadError::not_found(id, response.message));
        }

        match response.data {
            Some(data) if !data.is_null() => Ok(upload_from_value(data)?),
            _ => Err(UploadError::not_found(id, None)),
        }
    }

    async fn create_upload(&self, mut draft: UploadDraft) -> Result<Upload> {
        draft.status.get_or_insert(UploadStatus::Pending);
        draft.progress.get_or_insert(0);

        let params = RecordParams::single(&UploadRecord::from_draft(None, &draft))?;
        let response = self
            .store
            .create_record(UPLOAD_TABLE, &params)
            .await
            .map_err(|e| UploadError::Creation(e.to_string()))?;

        let created = first_written_record(
            response,
            UploadError::Creation,
            "Failed to create upload record",
        )?;
        Ok(upload_from_value(created)?)
    }

    async fn update_upload(&self, id: i64, draft: &UploadDraft) -> Result<Upload> {
        let params = RecordParams::single(&UploadRecord::from_draft(Some(id), draft))?;
        let response = self
            .store
            .update_record(UPLOAD_TABLE, &params)
            .await
            .map_err(|e| UploadError::Update(e.to_string()))?;

        let updated = first_written_record(
            response,
            UploadError::Update,
            "Failed to update upload record",
        )?;
        Ok(upload_from_value(updated)?)
    }

    async fn delete_upload(&self, id: i64) -> Result<bool> {
        let params = DeleteParams {
            record_ids: vec![id],
        };
        let response = self
            .store
            .delete_record(UPLOAD_TABLE, &params)
            .await
            .map_err(|e| UploadError::Deletion(e.to_string()))?;

        if !response.success {
            return Err(UploadError::Deletion(message_or(
                response.message,
                "Failed to delete upload record",
            )));
        }

        if response.results.is_none() {
            return Ok(false);
        }

        let (successful, failed) = response.partition_results();
        if !failed.is_empty() {
            tracing::warn!(id, failed = failed.len(), "Some upload deletions failed");
            if let Some(message) = failed.iter().find_map(|r| r.message.clone().filter(|m| !m.is_empty())) {
                return Err(UploadError::Deletion(message));
            }
        }

        Ok(!successful.is_empty())
    }

    async fn run_simulated_upload(
        &self,
        id: i64,
        on_progress: Option<&ProgressFn>,
    ) -> Result<Upload> {
        let upload = self.fetch_upload(id).await.map_err(|e| match e {
            not_found @ UploadError::NotFound { .. } => not_found,
            other => UploadError::not_found(id, Some(other.to_string())),
        })?;

        let mut step = UploadDraft::from(&upload);
        step.status = Some(UploadStatus::Uploading);

        for progress in PROGRESS_STEPS.step_by(PROGRESS_STEP) {
            tokio::time::sleep(self.timings.progress_step_delay).await;

            step.progress = Some(progress);
            self.update_upload(id, &step).await?;
            tracing::debug!(id, progress, "Upload progress");

            if let Some(callback) = on_progress {
                callback(progress);
            }
        }

        let completed = UploadDraft {
            status: Some(UploadStatus::Completed),
            progress: Some(100),
            url: Some(format!("/uploads/{}", upload.name)),
            uploaded_at: Some(Utc::now()),
            ..UploadDraft::from(&upload)
        };

        let finished = self.update_upload(id, &completed).await?;
        tracing::info!(id, name = %finished.name, "Upload completed");
        Ok(finished)
    }
}

/// Data of the first successful per-record result of a create/update.
///
/// Store-level failure or a per-record failure with a message becomes
/// `fail(message)`; anything else without a written record becomes
/// `fail(default_message)`.
pub(crate) fn first_written_record(
    response: StoreResponse<Value>,
    fail: fn(String) -> UploadError,
    default_message: &str,
) -> Result<Value> {
    if !response.success {
        return Err(fail(message_or(response.message, default_message)));
    }

    let (successful, failed) = response.partition_results();
    if !failed.is_empty() {
        tracing::warn!(failed = failed.len(), "{}", default_message);
        if let Some(message) = failed.iter().find_map(|r| r.message.clone().filter(|m| !m.is_empty())) {
            return Err(fail(message));
        }
    }

    successful
        .first()
        .and_then(|r| r.data.clone())
        .filter(|data| !data.is_null())
        .ok_or_else(|| fail(default_message.to_string()))
}

pub(crate) fn message_or(message: Option<String>, default_message: &str) -> String {
    message
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| default_message.to_string())
}
