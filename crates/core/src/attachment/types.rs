//! Attachment types and upload validation.

use serde::{Deserialize, Serialize};

use super::error::AttachmentError;

/// Default upper bound for one file: 10 MiB.
pub const DEFAULT_MAX_FILE_SIZE: i64 = 10 * 1024 * 1024;

/// Accepted file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    /// `application/pdf`
    Pdf,
    /// `image/jpeg`
    Jpeg,
    /// `image/png`
    Png,
    /// `image/webp`
    Webp,
}

impl AttachmentKind {
    /// Canonical MIME type.
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
        }
    }

    /// Parses a MIME type, ignoring case and parameters such as `; charset=`.
    #[must_use]
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "application/pdf" => Some(Self::Pdf),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/webp" => Some(Self::Webp),
            _ => None,
        }
    }
}

/// Metadata submitted for a new attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttachment {
    /// Original filename.
    pub filename: String,
    /// MIME type as sent by the client.
    pub mime_type: String,
    /// Size in bytes.
    pub file_size: i64,
    /// Where the file lives in external storage.
    pub storage_url: String,
}

/// Validates upload metadata against the size limit.
///
/// Returns the recognized kind; its canonical MIME type is what gets stored.
pub fn validate_upload(input: &NewAttachment, max_size: i64) -> Result<AttachmentKind, AttachmentError> {
    let filename = input.filename.trim();
    if filename.is_empty() || filename.contains(['/', '\\']) || filename.len() > 255 {
        return Err(AttachmentError::InvalidFilename(input.filename.clone()));
    }

    let kind = AttachmentKind::from_mime(&input.mime_type)
        .ok_or_else(|| AttachmentError::InvalidMimeType(input.mime_type.clone()))?;

    if input.file_size <= 0 {
        return Err(AttachmentError::EmptyFile);
    }
    if input.file_size > max_size {
        return Err(AttachmentError::FileTooLarge {
            size: input.file_size,
            max: max_size,
        });
    }
    if input.storage_url.trim().is_empty() {
        return Err(AttachmentError::MissingStorageUrl);
    }

    Ok(kind)
}
