//! Upload service
//!
//! `upload_service` holds the service type and the per-upload operations;
//! `sessions` adds the session operations to the same type.

pub mod sessions;
pub mod upload_service;

pub use upload_service::{ProgressFn, UploadService};
