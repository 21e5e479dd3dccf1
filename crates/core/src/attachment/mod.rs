//! Claim attachment metadata.
//!
//! File bytes live in external storage; this module validates the metadata
//! recorded for each upload:
//! - MIME type (PDF and common image formats)
//! - Size bounds
//! - Filename sanity

mod error;
mod types;

pub use error::AttachmentError;
pub use types::{AttachmentKind, DEFAULT_MAX_FILE_SIZE, NewAttachment, validate_upload};
