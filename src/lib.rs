//! Upload records on top of a remote record store.
//!
//! `UploadService` is the entry point: CRUD over upload records, a simulated
//! progress-driven upload, file validation, history and upload sessions.
//! The store is reached through the `RecordStore` trait; `HttpRecordStore`
//! talks to the real API.

pub mod api_contracts;
pub mod config;
pub mod config_utils;
pub mod error;
pub mod http_store;
pub mod logging;
pub mod record_store;
pub mod records;
pub mod services;
pub mod types;
pub mod validation;

#[cfg(test)]
mod test_harness;

pub use config::{ServiceTimings, StoreConfig};
pub use error::{Result, StoreError, UploadError};
pub use http_store::HttpRecordStore;
pub use logging::{init_tracing, LogConfig, LogOutput};
pub use record_store::RecordStore;
pub use services::{ProgressFn, UploadService};
pub use types::{FileCandidate, SessionFile, Upload, UploadDraft, UploadSession, UploadStatus};
