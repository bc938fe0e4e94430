/**
 * API Contract Types for the record store
 *
 * These types define the exact structure of requests/responses exchanged
 * with the remote record store (query shape, mutation params and the
 * success/results envelope every call returns).
 *
 * Principles:
 * - Field names follow the store's JSON casing exactly (serde renames)
 * - Optional parts of the envelope are explicit Option<T>
 * - Record payloads stay as serde_json::Value here; mapping onto the
 *   upload domain happens in `records`
 */

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Queries
// =============================================================================

/// Query passed to fetch / get-by-id calls
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RecordQuery {
    pub fields: Vec<FieldSelector>,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<WhereClause>>,
    #[serde(rename = "orderBy", skip_serializing_if = "Option::is_none")]
    pub order_by: Option<Vec<OrderBy>>,
    #[serde(rename = "pagingInfo", skip_serializing_if = "Option::is_none")]
    pub paging_info: Option<PagingInfo>,
}

impl RecordQuery {
    /// Query selecting the given fields, no filter, sort or paging
    pub fn select(fields: &[&str]) -> Self {
        Self {
            fields: fields.iter().map(|name| FieldSelector::new(name)).collect(),
            ..Default::default()
        }
    }

    pub fn filter(mut self, clause: WhereClause) -> Self {
        self.filters.get_or_insert_with(Vec::new).push(clause);
        self
    }

    pub fn order_by(mut self, field_name: &str, sort: SortType) -> Self {
        self.order_by.get_or_insert_with(Vec::new).push(OrderBy {
            field_name: field_name.to_string(),
            sort_type: sort,
        });
        self
    }

    pub fn page(mut self, limit: u32, offset: u32) -> Self {
        self.paging_info = Some(PagingInfo { limit, offset });
        self
    }
}

/// `{"field": {"Name": "..."}}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldSelector {
    pub field: FieldName,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldName {
    #[serde(rename = "Name")]
    pub name: String,
}

impl FieldSelector {
    pub fn new(name: &str) -> Self {
        Self {
            field: FieldName {
                name: name.to_string(),
            },
        }
    }
}

/// Filter predicate: field, operator, values
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WhereClause {
    #[serde(rename = "FieldName")]
    pub field_name: String,
    #[serde(rename = "Operator")]
    pub operator: FilterOperator,
    #[serde(rename = "Values")]
    pub values: Vec<String>,
}

impl WhereClause {
    pub fn new(field_name: &str, operator: FilterOperator, values: &[&str]) -> Self {
        Self {
            field_name: field_name.to_string(),
            operator,
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }
}

/// Filter operators understood by the store.
/// `HasValue` semantics are owned by the store; it is passed through as-is.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FilterOperator {
    EqualTo,
    HasValue,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderBy {
    #[serde(rename = "fieldName")]
    pub field_name: String,
    #[serde(rename = "sorttype")]
    pub sort_type: SortType,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortType {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PagingInfo {
    pub limit: u32,
    pub offset: u32,
}

// =============================================================================
// Mutations
// =============================================================================

/// Params for create / update: `{"records": [...]}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordParams {
    pub records: Vec<Value>,
}

impl RecordParams {
    /// Params carrying a single serialized record
    pub fn single<T: Serialize>(record: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            records: vec![serde_json::to_value(record)?],
        })
    }
}

/// Params for delete: `{"RecordIds": [...]}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeleteParams {
    #[serde(rename = "RecordIds")]
    pub record_ids: Vec<i64>,
}

// =============================================================================
// Responses
// =============================================================================

/// Envelope returned by every store call.
///
/// Fetch/get calls fill `data`; mutations fill `results` with one entry per
/// submitted record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreResponse<T = Value> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<RecordResult>>,
}

impl<T> StoreResponse<T> {
    /// Successful response carrying `data`
    pub fn with_data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            results: None,
        }
    }

    /// Successful response carrying per-record results
    pub fn with_results(results: Vec<RecordResult>) -> Self {
        Self {
            success: true,
            message: None,
            data: None,
            results: Some(results),
        }
    }

    /// Failed response with a message
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
            results: None,
        }
    }

    /// Split per-record results into (successful, failed)
    pub fn partition_results(&self) -> (Vec<&RecordResult>, Vec<&RecordResult>) {
        self.results
            .as_deref()
            .unwrap_or_default()
            .iter()
            .partition(|r| r.success)
    }
}

/// Outcome for one record in a mutation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RecordResult {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
