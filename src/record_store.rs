//! The record store seam.
//!
//! `UploadService` only ever talks to the store through this trait, so the
//! HTTP client can be swapped for an in-memory store in tests.

use crate::api_contracts::{DeleteParams, RecordParams, RecordQuery, StoreResponse};
use crate::error::StoreError;
use async_trait::async_trait;
use serde_json::Value;

/// Generic remote-record API: five calls over named tables.
///
/// `Err` means the call itself failed (network, HTTP status, bad body).
/// A store that answered but refused the operation returns
/// `Ok(StoreResponse { success: false, .. })`.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn fetch_records(
        &self,
        table: &str,
        query: &RecordQuery,
    ) -> Result<StoreResponse<Vec<Value>>, StoreError>;

    async fn get_record_by_id(
        &self,
        table: &str,
        id: i64,
        query: &RecordQuery,
    ) -> Result<StoreResponse<Value>, StoreError>;

    async fn create_record(
        &self,
        table: &str,
        params: &RecordParams,
    ) -> Result<StoreResponse<Value>, StoreError>;

    async fn update_record(
        &self,
        table: &str,
        params: &RecordParams,
    ) -> Result<StoreResponse<Value>, StoreError>;

    async fn delete_record(
        &self,
        table: &str,
        params: &DeleteParams,
    ) -> Result<StoreResponse<Value>, StoreError>;
}
