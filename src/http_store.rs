use crate::api_contracts::{DeleteParams, RecordParams, RecordQuery, StoreResponse};
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::record_store::RecordStore;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// HTTP client for the remote record store
pub struct HttpRecordStore {
    base_url: String,
    project_id: String,
    public_key: String,
    client: reqwest::Client,
}

impl HttpRecordStore {
    /// Create a store client from resolved configuration
    pub fn new(config: &StoreConfig) -> Self {
        // Include version in User-Agent header for tracking
        let version = env!("CARGO_PKG_VERSION");
        let user_agent = format!("UploadRecords/{}", version);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&user_agent)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            public_key: config.public_key.clone(),
            client,
        }
    }

    /// `{base}/api/tables/{table}/records`
    fn records_url(&self, table: &str) -> String {
        format!("{}/api/tables/{}/records", self.base_url, table)
    }

    /// `{base}/api/tables/{table}/records/{id}/query`
    fn record_query_url(&self, table: &str, id: i64) -> String {
        format!("{}/{}/query", self.records_url(table), id)
    }

    /// Attach auth headers, send, and decode the store envelope
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<StoreResponse<T>, StoreError> {
        let response = request
            .header("X-Project-Id", &self.project_id)
            .bearer_auth(&self.public_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Http { status, body });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| StoreError::Decode(e.to_string()))
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn fetch_records(
        &self,
        table: &str,
        query: &RecordQuery,
    ) -> Result<StoreResponse<Vec<Value>>, StoreError> {
        let url = format!("{}/query", self.records_url(table));
        tracing::debug!(%url, "Fetching records");
        self.send(self.client.post(&url).json(query)).await
    }

    async fn get_record_by_id(
        &self,
        table: &str,
        id: i64,
        query: &RecordQuery,
    ) -> Result<StoreResponse<Value>, StoreError> {
        let url = self.record_query_url(table, id);
        tracing::debug!(%url, "Fetching record");
        self.send(self.client.post(&url).json(query)).await
    }

    async fn create_record(
        &self,
        table: &str,
        params: &RecordParams,
    ) -> Result<StoreResponse<Value>, StoreError> {
        let url = self.records_url(table);
        tracing::debug!(%url, count = params.records.len(), "Creating records");
        self.send(self.client.post(&url).json(params)).await
    }

    async fn update_record(
        &self,
        table: &str,
        params: &RecordParams,
    ) -> Result<StoreResponse<Value>, StoreError> {
        let url = self.records_url(table);
        tracing::debug!(%url, count = params.records.len(), "Updating records");
        self.send(self.client.put(&url).json(params)).await
    }

    async fn delete_record(
        &self,
        table: &str,
        params: &DeleteParams,
    ) -> Result<StoreResponse<Value>, StoreError> {
        let url = self.records_url(table);
        tracing::debug!(%url, ids = ?params.record_ids, "Deleting records");
        self.send(self.client.delete(&url).json(params)).await
    }
}
