//! Error types for the upload service and the record store it talks to.

/// Failure talking to the record store itself (as opposed to the store
/// answering with `success: false`).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Request could not be sent or the connection failed
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Store answered with a non-success HTTP status
    #[error("Store error {status}: {body}")]
    Http { status: u16, body: String },

    /// Store answered with a body we could not parse
    #[error("Failed to parse store response: {0}")]
    Decode(String),
}

/// Errors returned by `UploadService` operations.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("{message}")]
    NotFound { id: i64, message: String },

    #[error("{0}")]
    Creation(String),

    #[error("{0}")]
    Update(String),

    #[error("{0}")]
    Deletion(String),

    #[error("{0}")]
    Completion(String),

    /// File is larger than the upload limit; `size_mb` is already rounded to two decimals
    #[error("File size exceeds 10MB limit. Current size: {size_mb:.2}MB")]
    SizeExceeded { size_mb: f64 },

    #[error("File type \"{mime_type}\" is not allowed. Supported types: images, PDF, Word documents, text files.")]
    UnsupportedType { mime_type: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to serialize record: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl UploadError {
    /// `NotFound` with the store's message, falling back to the default wording.
    pub fn not_found(id: i64, message: Option<String>) -> Self {
        UploadError::NotFound {
            id,
            message: message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("Upload with ID {} not found", id)),
        }
    }
}

pub type Result<T> = std::result::Result<T, UploadError>;
