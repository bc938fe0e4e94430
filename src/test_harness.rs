//! Test harness for record store backed tests
//!
//! `MemoryRecordStore` is an in-memory `RecordStore` with just enough query
//! support (EqualTo / HasValue filters, single-key sort, paging) for the
//! service tests, plus call recording and failure injection.
//! `TestHarness` wraps a mockito server for exercising `HttpRecordStore`
//! over real HTTP.

use crate::api_contracts::{
    DeleteParams, FilterOperator, PagingInfo, RecordParams, RecordQuery, RecordResult, SortType,
    StoreResponse, WhereClause,
};
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::record_store::RecordStore;
use async_trait::async_trait;
use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::{json, Map, Value};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

/// One call made against `MemoryRecordStore`
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Fetch { table: String, query: RecordQuery },
    Get { table: String, id: i64 },
    Create { table: String, record: Value },
    Update { table: String, record: Value },
    Delete { table: String, ids: Vec<i64> },
}

#[derive(Default)]
enum Mode {
    #[default]
    Normal,
    /// Every call answers `success: false` with this message
    Failing(String),
    /// Every call fails at the transport level
    Unreachable,
}

#[derive(Default)]
struct MemoryState {
    tables: HashMap<String, BTreeMap<i64, Map<String, Value>>>,
    next_id: i64,
    calls: Vec<StoreCall>,
    mode: Mode,
    reject_writes: Option<String>,
    fail_updates_after: Option<(usize, String)>,
    updates_applied: usize,
    update_override: Option<StoreResponse<Value>>,
}

impl MemoryState {
    fn gate<T>(&self) -> Option<Result<StoreResponse<T>, StoreError>> {
        match &self.mode {
            Mode::Normal => None,
            Mode::Failing(message) => Some(Ok(StoreResponse::failure(message.clone()))),
            Mode::Unreachable => Some(Err(StoreError::Http {
                status: 503,
                body: "Service Unavailable".to_string(),
            })),
        }
    }

    fn insert(&mut self, table: &str, record: &Value) -> Map<String, Value> {
        self.next_id += 1;
        let id = self.next_id;
        let mut row = record.as_object().cloned().unwrap_or_default();
        row.insert("Id".to_string(), json!(id));
        self.tables
            .entry(table.to_string())
            .or_default()
            .insert(id, row.clone());
        row
    }

    fn rejected(&self) -> Option<RecordResult> {
        self.reject_writes.as_ref().map(|message| RecordResult {
            success: false,
            message: Some(message.clone()),
            data: None,
        })
    }
}

/// In-memory record store
#[derive(Default)]
pub struct MemoryRecordStore {
    state: Mutex<MemoryState>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that answers every call with `success: false`
    pub fn failing(message: &str) -> Self {
        let store = Self::new();
        store.state().mode = Mode::Failing(message.to_string());
        store
    }

    /// Store whose every call fails with a transport error
    pub fn unreachable() -> Self {
        let store = Self::new();
        store.state().mode = Mode::Unreachable;
        store
    }

    /// Creates and updates answer with a failed per-record result
    pub fn reject_writes(&self, message: &str) {
        self.state().reject_writes = Some(message.to_string());
    }

    /// Let `successful` updates through, then answer `success: false`
    pub fn fail_updates_after(&self, successful: usize, message: &str) {
        self.state().fail_updates_after = Some((successful, message.to_string()));
    }

    /// Answer every update with a canned response
    pub fn respond_to_updates_with(&self, response: StoreResponse<Value>) {
        self.state().update_override = Some(response);
    }

    /// Seed a record directly, returning its assigned id
    pub fn insert(&self, table: &str, record: Value) -> i64 {
        let row = self.state().insert(table, &record);
        row["Id"].as_i64().unwrap_or_default()
    }

    pub fn record(&self, table: &str, id: i64) -> Option<Value> {
        self.state()
            .tables
            .get(table)
            .and_then(|rows| rows.get(&id))
            .map(|row| Value::Object(row.clone()))
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.state().calls.clone()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn value_as_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn matches_clause(row: &Map<String, Value>, clause: &WhereClause) -> bool {
    let value = row.get(&clause.field_name);
    match clause.operator {
        FilterOperator::EqualTo => value
            .map(value_as_string)
            .is_some_and(|v| clause.values.contains(&v)),
        FilterOperator::HasValue => {
            matches!(value, Some(v) if !v.is_null() && v.as_str() != Some(""))
        }
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            x.as_f64().partial_cmp(&y.as_f64()).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn fetch_records(
        &self,
        table: &str,
        query: &RecordQuery,
    ) -> Result<StoreResponse<Vec<Value>>, StoreError> {
        let mut state = self.state();
        state.calls.push(StoreCall::Fetch {
            table: table.to_string(),
            query: query.clone(),
        });
        if let Some(gated) = state.gate() {
            return gated;
        }

        let filters = query.filters.as_deref().unwrap_or_default();
        let mut rows: Vec<&Map<String, Value>> = state
            .tables
            .get(table)
            .map(|rows| rows.values().collect())
            .unwrap_or_default();
        rows.retain(|row| filters.iter().all(|clause| matches_clause(row, clause)));

        if let Some(order) = query.order_by.as_ref().and_then(|o| o.first()) {
            rows.sort_by(|a, b| {
                let ordering = compare_values(a.get(&order.field_name), b.get(&order.field_name));
                match order.sort_type {
                    SortType::Asc => ordering,
                    SortType::Desc => ordering.reverse(),
                }
            });
        }

        let paging = query.paging_info.unwrap_or(PagingInfo {
            limit: u32::MAX,
            offset: 0,
        });
        let data = rows
            .into_iter()
            .skip(paging.offset as usize)
            .take(paging.limit as usize)
            .map(|row| Value::Object(row.clone()))
            .collect();

        Ok(StoreResponse::with_data(data))
    }

    async fn get_record_by_id(
        &self,
        table: &str,
        id: i64,
        _query: &RecordQuery,
    ) -> Result<StoreResponse<Value>, StoreError> {
        let mut state = self.state();
        state.calls.push(StoreCall::Get {
            table: table.to_string(),
            id,
        });
        if let Some(gated) = state.gate() {
            return gated;
        }

        let row = state.tables.get(table).and_then(|rows| rows.get(&id));
        Ok(StoreResponse {
            success: true,
            message: None,
            data: row.map(|row| Value::Object(row.clone())),
            results: None,
        })
    }

    async fn create_record(
        &self,
        table: &str,
        params: &RecordParams,
    ) -> Result<StoreResponse<Value>, StoreError> {
        let mut state = self.state();
        for record in &params.records {
            state.calls.push(StoreCall::Create {
                table: table.to_string(),
                record: record.clone(),
            });
        }
        if let Some(gated) = state.gate() {
            return gated;
        }

        let results = params
            .records
            .iter()
            .map(|record| match state.rejected() {
                Some(rejected) => rejected,
                None => RecordResult::ok(Value::Object(state.insert(table, record))),
            })
            .collect();

        Ok(StoreResponse::with_results(results))
    }

    async fn update_record(
        &self,
        table: &str,
        params: &RecordParams,
    ) -> Result<StoreResponse<Value>, StoreError> {
        let mut state = self.state();
        for record in &params.records {
            state.calls.push(StoreCall::Update {
                table: table.to_string(),
                record: record.clone(),
            });
        }
        if let Some(gated) = state.gate() {
            return gated;
        }
        if let Some(response) = &state.update_override {
            return Ok(response.clone());
        }
        if let Some((allowed, message)) = &state.fail_updates_after {
            if state.updates_applied >= *allowed {
                return Ok(StoreResponse::failure(message.clone()));
            }
        }

        let mut results = Vec::new();
        for record in &params.records {
            if let Some(rejected) = state.rejected() {
                results.push(rejected);
                continue;
            }

            let id = record["Id"].as_i64().unwrap_or_default();
            let row = state
                .tables
                .get_mut(table)
                .and_then(|rows| rows.get_mut(&id));
            match (row, record.as_object()) {
                (Some(row), Some(fields)) => {
                    for (key, value) in fields {
                        row.insert(key.clone(), value.clone());
                    }
                    results.push(RecordResult::ok(Value::Object(row.clone())));
                }
                _ => results.push(RecordResult::failed("Record not found")),
            }
        }
        state.updates_applied += 1;

        Ok(StoreResponse::with_results(results))
    }

    async fn delete_record(
        &self,
        table: &str,
        params: &DeleteParams,
    ) -> Result<StoreResponse<Value>, StoreError> {
        let mut state = self.state();
        state.calls.push(StoreCall::Delete {
            table: table.to_string(),
            ids: params.record_ids.clone(),
        });
        if let Some(gated) = state.gate() {
            return gated;
        }

        let results = params
            .record_ids
            .iter()
            .map(|id| {
                let removed = state
                    .tables
                    .get_mut(table)
                    .and_then(|rows| rows.remove(id));
                match removed {
                    Some(_) => RecordResult::ok(json!({ "Id": id })),
                    None => RecordResult {
                        success: false,
                        message: None,
                        data: None,
                    },
                }
            })
            .collect();

        Ok(StoreResponse::with_results(results))
    }
}

/// A test harness that sets up a mock record store server
pub struct TestHarness {
    pub server: ServerGuard,
}

impl TestHarness {
    pub const PROJECT_ID: &'static str = "test-project";
    pub const PUBLIC_KEY: &'static str = "test-public-key";

    /// Create a new test harness with a mock server
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        Self { server }
    }

    /// Get the mock server URL
    pub fn url(&self) -> String {
        self.server.url()
    }

    /// Config pointing at the mock server
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            base_url: self.url(),
            project_id: Self::PROJECT_ID.to_string(),
            public_key: Self::PUBLIC_KEY.to_string(),
            timeout_secs: 5,
        }
    }

    fn authorized(&mut self, method: &str, path: &str) -> mockito::Mock {
        self.server
            .mock(method, path)
            .match_header("authorization", format!("Bearer {}", Self::PUBLIC_KEY).as_str())
            .match_header("x-project-id", Self::PROJECT_ID)
            .with_header("content-type", "application/json")
    }

    /// Mock `POST /api/tables/{table}/records/query`
    pub async fn mock_fetch(&mut self, table: &str, body: Value) -> Mock {
        let path = format!("/api/tables/{}/records/query", table);
        self.authorized("POST", &path)
            .with_status(200)
            .with_body(body.to_string())
            .create_async()
            .await
    }

    /// Mock `POST /api/tables/{table}/records/{id}/query`
    pub async fn mock_get(&mut self, table: &str, id: i64, body: Value) -> Mock {
        let path = format!("/api/tables/{}/records/{}/query", table, id);
        self.authorized("POST", &path)
            .with_status(200)
            .with_body(body.to_string())
            .create_async()
            .await
    }

    /// Mock `POST /api/tables/{table}/records`, requiring the body to contain `expected`
    pub async fn mock_create(&mut self, table: &str, expected: Value, body: Value) -> Mock {
        let path = format!("/api/tables/{}/records", table);
        self.authorized("POST", &path)
            .match_body(Matcher::PartialJson(expected))
            .with_status(200)
            .with_body(body.to_string())
            .create_async()
            .await
    }

    /// Mock `PUT /api/tables/{table}/records`
    pub async fn mock_update(&mut self, table: &str, body: Value) -> Mock {
        let path = format!("/api/tables/{}/records", table);
        self.authorized("PUT", &path)
            .with_status(200)
            .with_body(body.to_string())
            .create_async()
            .await
    }

    /// Mock `DELETE /api/tables/{table}/records`
    pub async fn mock_delete(&mut self, table: &str, body: Value) -> Mock {
        let path = format!("/api/tables/{}/records", table);
        self.authorized("DELETE", &path)
            .with_status(200)
            .with_body(body.to_string())
            .create_async()
            .await
    }

    /// Mock any endpoint answering with a bare HTTP status
    pub async fn mock_status(&mut self, method: &str, path: &str, status: usize) -> Mock {
        self.server
            .mock(method, path)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(json!({ "error": "Request failed" }).to_string())
            .create_async()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UploadError;
    use crate::http_store::HttpRecordStore;
    use crate::records::{UPLOAD_SESSION_TABLE, UPLOAD_TABLE};
    use crate::types::{SessionFile, UploadDraft, UploadStatus};
    use crate::{ServiceTimings, UploadService};
    use std::sync::Arc;

    fn http_service(harness: &TestHarness) -> UploadService {
        UploadService::with_timings(
            Arc::new(HttpRecordStore::new(&harness.store_config())),
            ServiceTimings::immediate(),
        )
    }

    fn upload_json(id: i64, status: &str, progress: u8) -> Value {
        json!({
            "Id": id,
            "name_c": "scan.pdf",
            "size_c": 4096,
            "type_c": "application/pdf",
            "status_c": status,
            "progress_c": progress,
            "uploaded_at_c": null,
            "url_c": null
        })
    }

    #[tokio::test]
    async fn test_http_fetch_records_with_mock_server() {
        let mut harness = TestHarness::new().await;
        let mock = harness
            .server
            .mock("POST", "/api/tables/upload_c/records/query")
            .match_header("authorization", "Bearer test-public-key")
            .match_body(Matcher::PartialJson(json!({
                "orderBy": [{"fieldName": "Id", "sorttype": "DESC"}],
                "pagingInfo": {"limit": 100, "offset": 0}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"success": true, "data": [upload_json(2, "pending", 0)]}).to_string())
            .create_async()
            .await;

        let uploads = http_service(&harness).get_all().await;

        mock.assert_async().await;
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].id, 2);
        assert_eq!(uploads[0].name, "scan.pdf");
        assert_eq!(uploads[0].mime_type, "application/pdf");
    }

    #[tokio::test]
    async fn test_http_get_all_store_failure_is_empty() {
        let mut harness = TestHarness::new().await;
        let _mock = harness
            .mock_fetch(UPLOAD_TABLE, json!({"success": false, "message": "Invalid project"}))
            .await;

        assert!(http_service(&harness).get_all().await.is_empty());
    }

    #[tokio::test]
    async fn test_http_get_history_server_error_is_empty() {
        let mut harness = TestHarness::new().await;
        let _mock = harness
            .mock_status("POST", "/api/tables/upload_c/records/query", 500)
            .await;

        assert!(http_service(&harness).get_history().await.is_empty());
    }

    #[tokio::test]
    async fn test_http_get_by_id() {
        let mut harness = TestHarness::new().await;
        let _mock = harness
            .mock_get(UPLOAD_TABLE, 7, json!({"success": true, "data": upload_json(7, "uploading", 40)}))
            .await;

        let upload = http_service(&harness).get_by_id(7).await.unwrap();
        assert_eq!(upload.id, 7);
        assert_eq!(upload.status, UploadStatus::Uploading);
        assert_eq!(upload.progress, 40);
    }

    #[tokio::test]
    async fn test_http_get_by_id_null_data_is_not_found() {
        let mut harness = TestHarness::new().await;
        let _mock = harness
            .mock_get(UPLOAD_TABLE, 8, json!({"success": true, "data": null}))
            .await;

        let err = http_service(&harness).get_by_id(8).await.unwrap_err();
        assert!(matches!(err, UploadError::NotFound { id: 8, .. }));
    }

    #[tokio::test]
    async fn test_http_unauthorized_create_is_creation_error() {
        let mut harness = TestHarness::new().await;
        let _mock = harness
            .mock_status("POST", "/api/tables/upload_c/records", 401)
            .await;

        let err = http_service(&harness)
            .create(UploadDraft::new_file("a.png", 1, "image/png"))
            .await
            .unwrap_err();

        match err {
            UploadError::Creation(message) => assert!(message.starts_with("Store error 401")),
            other => panic!("Expected Creation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_http_unparseable_body_is_decode_error() {
        let mut harness = TestHarness::new().await;
        let _mock = harness
            .server
            .mock("POST", "/api/tables/upload_c/records/3/query")
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let store = HttpRecordStore::new(&harness.store_config());
        let result = store
            .get_record_by_id(UPLOAD_TABLE, 3, &RecordQuery::select(&["Id"]))
            .await;
        assert!(matches!(result, Err(StoreError::Decode(_))));
    }

    #[tokio::test]
    async fn test_http_create_sends_mapped_fields() {
        let mut harness = TestHarness::new().await;
        let mock = harness
            .mock_create(
                UPLOAD_TABLE,
                json!({"records": [{
                    "name_c": "scan.pdf",
                    "size_c": 4096,
                    "type_c": "application/pdf",
                    "status_c": "pending",
                    "progress_c": 0
                }]}),
                json!({"success": true, "results": [{"success": true, "data": upload_json(11, "pending", 0)}]}),
            )
            .await;

        let created = http_service(&harness)
            .create(UploadDraft::new_file("scan.pdf", 4096, "application/pdf"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(created.id, 11);
        assert_eq!(created.status, UploadStatus::Pending);
    }

    #[tokio::test]
    async fn test_http_delete() {
        let mut harness = TestHarness::new().await;
        let mock = harness
            .server
            .mock("DELETE", "/api/tables/upload_c/records")
            .match_body(Matcher::Json(json!({"RecordIds": [5]})))
            .with_status(200)
            .with_body(json!({"success": true, "results": [{"success": true}]}).to_string())
            .create_async()
            .await;

        assert!(http_service(&harness).delete(5).await.unwrap());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_simulate_upload_makes_twelve_writes() {
        let mut harness = TestHarness::new().await;
        let _get = harness
            .mock_get(UPLOAD_TABLE, 4, json!({"success": true, "data": upload_json(4, "pending", 0)}))
            .await;

        let mut completed = upload_json(4, "completed", 100);
        completed["url_c"] = json!("/uploads/scan.pdf");
        completed["uploaded_at_c"] = json!("2025-06-01T12:00:00.000Z");
        let update = harness
            .server
            .mock("PUT", "/api/tables/upload_c/records")
            .with_status(200)
            .with_body(json!({"success": true, "results": [{"success": true, "data": completed}]}).to_string())
            .expect(12)
            .create_async()
            .await;

        let finished = http_service(&harness).simulate_upload(4, None).await.unwrap();

        update.assert_async().await;
        assert_eq!(finished.status, UploadStatus::Completed);
        assert_eq!(finished.url.as_deref(), Some("/uploads/scan.pdf"));
    }

    #[tokio::test]
    async fn test_http_create_session() {
        let mut harness = TestHarness::new().await;
        let mock = harness
            .mock_create(
                UPLOAD_SESSION_TABLE,
                json!({"records": [{"files_c": "1,2", "total_size_c": 300, "completed_at_c": null}]}),
                json!({"success": true, "results": [{"success": true, "data": {
                    "Id": 1,
                    "files_c": "1,2",
                    "total_size_c": 300,
                    "started_at_c": "2025-06-01T12:00:00.000Z",
                    "completed_at_c": null
                }}]}),
            )
            .await;

        let session = http_service(&harness)
            .create_session(&[SessionFile { id: 1, size: 100 }, SessionFile { id: 2, size: 200 }])
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(session.files, vec![1, 2]);
        assert_eq!(session.total_size, 300);
    }

    #[tokio::test]
    async fn test_http_complete_session() {
        let mut harness = TestHarness::new().await;
        let _mock = harness
            .mock_update(
                UPLOAD_SESSION_TABLE,
                json!({"success": true, "results": [{"success": true, "data": {
                    "Id": 1,
                    "files_c": "1,2",
                    "total_size_c": 300,
                    "started_at_c": "2025-06-01T12:00:00.000Z",
                    "completed_at_c": "2025-06-01T12:05:00.000Z"
                }}]}),
            )
            .await;

        let session = http_service(&harness).complete_session(1).await.unwrap();
        assert!(session.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_memory_store_paging_and_filters() {
        let store = MemoryRecordStore::new();
        for status in ["completed", "pending", "completed", "completed"] {
            store.insert("t", json!({ "status_c": status }));
        }

        let query = RecordQuery::select(&["Id"])
            .filter(WhereClause::new("status_c", FilterOperator::EqualTo, &["completed"]))
            .order_by("Id", SortType::Asc)
            .page(2, 1);
        let response = store.fetch_records("t", &query).await.unwrap();

        let ids: Vec<i64> = response
            .data
            .unwrap()
            .iter()
            .map(|row| row["Id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![3, 4]);
    }
}
