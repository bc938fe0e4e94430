//! File checks run before an upload is created.

use crate::error::{Result, UploadError};
use crate::types::FileCandidate;

/// 10 MiB
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

pub const ALLOWED_MIME_TYPES: [&str; 10] = [
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
    "text/csv",
    "application/json",
];

pub fn is_allowed_type(mime_type: &str) -> bool {
    ALLOWED_MIME_TYPES.contains(&mime_type)
}

/// Size in MB rounded to two decimals, as reported in `SizeExceeded`
pub fn size_in_mb(size: u64) -> f64 {
    let mb = size as f64 / 1024.0 / 1024.0;
    (mb * 100.0).round() / 100.0
}

/// Size limit first, then the type allow-list.
pub fn check_file(file: &FileCandidate) -> Result<()> {
    if file.size > MAX_FILE_SIZE {
        return Err(UploadError::SizeExceeded {
            size_mb: size_in_mb(file.size),
        });
    }

    if !is_allowed_type(&file.mime_type) {
        return Err(UploadError::UnsupportedType {
            mime_type: file.mime_type.clone(),
        });
    }

    Ok(())
}
