//! Approval chain errors.

use thiserror::Error;
use uuid::Uuid;
use wayfare_shared::AppError;

use crate::approval::types::{ApprovalLevel, ApprovalStatus, MIN_REASON_LEN};
use crate::document::DocumentStatus;

/// Errors that can occur while acting on an approval chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApprovalError {
    /// The row is not part of the chain.
    #[error("Approval {0} not found")]
    StepNotFound(Uuid),

    /// Only the assigned approver may act on a row.
    #[error("User {user_id} is not the assigned approver for this level")]
    NotAssignedApprover {
        /// The user who attempted the action.
        user_id: Uuid,
    },

    /// The row is no longer pending.
    #[error("Approval already processed (status {status})")]
    AlreadyProcessed {
        /// Current row status.
        status: ApprovalStatus,
    },

    /// A lower level has not approved yet.
    #[error("Level {level} must be approved first")]
    PriorLevelPending {
        /// The first lower level still waiting.
        level: ApprovalLevel,
    },

    /// The parent document is not in review.
    #[error("Document in status {status} is not awaiting approval")]
    ParentNotInReview {
        /// Parent document status.
        status: DocumentStatus,
    },

    /// Reason or comments shorter than the minimum.
    #[error("{field} must be at least {MIN_REASON_LEN} characters")]
    ReasonTooShort {
        /// Which input was too short.
        field: &'static str,
    },

    /// Stored row does not reference exactly one document.
    #[error("Invalid approval target: {0}")]
    InvalidTarget(String),

    /// The submitter has no active supervisor chain.
    #[error("No approver available: the submitter has no active supervisor")]
    NoApproverAvailable,

    /// Another request changed the chain first.
    #[error("Approval was modified concurrently, reload and retry")]
    ConcurrentModification,
}

impl ApprovalError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::StepNotFound(_) => 404,
            Self::NotAssignedApprover { .. } => 403,
            Self::ConcurrentModification => 409,
            Self::AlreadyProcessed { .. }
            | Self::PriorLevelPending { .. }
            | Self::ParentNotInReview { .. }
            | Self::ReasonTooShort { .. }
            | Self::InvalidTarget(_)
            | Self::NoApproverAvailable => 400,
        }
    }
}

impl From<ApprovalError> for AppError {
    fn from(e: ApprovalError) -> Self {
        let message = e.to_string();
        match e {
            ApprovalError::StepNotFound(_) => Self::NotFound(message),
            ApprovalError::NotAssignedApprover { .. } => Self::Forbidden(message),
            ApprovalError::ConcurrentModification => Self::Conflict(message),
            ApprovalError::AlreadyProcessed { .. }
            | ApprovalError::PriorLevelPending { .. }
            | ApprovalError::ParentNotInReview { .. }
            | ApprovalError::ReasonTooShort { .. }
            | ApprovalError::InvalidTarget(_)
            | ApprovalError::NoApproverAvailable => Self::BadRequest(message),
        }
    }
}
