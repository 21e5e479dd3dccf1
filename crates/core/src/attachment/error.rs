//! Attachment error types.

use thiserror::Error;
use wayfare_shared::AppError;

/// Attachment validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttachmentError {
    /// Invalid MIME type.
    #[error("invalid MIME type: {0} (allowed: PDF, JPEG, PNG, WEBP)")]
    InvalidMimeType(String),

    /// File too large.
    #[error("file too large: {size} bytes exceeds maximum {max} bytes")]
    FileTooLarge {
        /// Actual file size.
        size: i64,
        /// Maximum allowed size.
        max: i64,
    },

    /// Empty file.
    #[error("file is empty")]
    EmptyFile,

    /// Filename empty or containing a path.
    #[error("invalid filename: {0:?}")]
    InvalidFilename(String),

    /// Storage URL empty.
    #[error("storage URL is required")]
    MissingStorageUrl,
}

impl From<AttachmentError> for AppError {
    fn from(e: AttachmentError) -> Self {
        Self::BadRequest(e.to_string())
    }
}
