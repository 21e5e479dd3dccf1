//! Application-wide error types.
//!
//! Every layer converts its own error enum into [`AppError`] at the boundary,
//! and the API renders it as `{"error": CODE, "message": ...}`.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication failed or missing.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Access denied.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request is well-formed but not allowed in the current state
    /// (already processed, wrong status for transition, circular supervisor).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Input failed schema validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Conflict with existing state (duplicate email, concurrent modification).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Unique constraint violated at the database.
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    /// Foreign key constraint violated at the database.
    #[error("Foreign key violation: {0}")]
    ForeignKey(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::BadRequest(_) | Self::Validation(_) | Self::ForeignKey(_) => 400,
            Self::Conflict(_) | Self::DuplicateEntry(_) => 409,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::BadRequest(_) | Self::Validation(_) => "BAD_REQUEST",
            Self::Conflict(_) => "CONFLICT",
            Self::DuplicateEntry(_) => "DUPLICATE_ENTRY",
            Self::ForeignKey(_) => "FOREIGN_KEY_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Returns the message without the variant prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Unauthorized(m)
            | Self::Forbidden(m)
            | Self::NotFound(m)
            | Self::BadRequest(m)
            | Self::Validation(m)
            | Self::Conflict(m)
            | Self::DuplicateEntry(m)
            | Self::ForeignKey(m)
            | Self::Database(m)
            | Self::Internal(m) => m,
        }
    }

    /// True for errors caused by infrastructure rather than the caller.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}
