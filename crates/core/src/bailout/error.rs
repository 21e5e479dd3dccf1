//! Bailout error types.

use thiserror::Error;
use wayfare_shared::AppError;

use crate::access::Role;
use crate::approval::MIN_REASON_LEN;
use crate::bailout::types::BailoutStatus;

/// Errors that can occur during bailout operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BailoutError {
    /// Attempted an invalid status transition.
    #[error("Invalid bailout transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: BailoutStatus,
        /// The attempted target status.
        to: BailoutStatus,
    },

    /// Only sales staff may request bailouts.
    #[error("Only sales employees can request bailouts")]
    RequesterNotSales,

    /// Only the requester may do this.
    #[error("Only the requester may modify this bailout")]
    NotRequester,

    /// The actor has the wrong role for this step.
    #[error("This step requires role {required}")]
    WrongApprover {
        /// Role required for the step.
        required: Role,
    },

    /// Requesters cannot approve their own bailout.
    #[error("Requester cannot approve their own bailout")]
    SelfApproval,

    /// The bailout is no longer a draft.
    #[error("Bailout in status {0} cannot be modified")]
    NotEditable(BailoutStatus),

    /// Amount must be greater than zero.
    #[error("Amount must be greater than zero")]
    NonPositiveAmount,

    /// Rejection reason too short.
    #[error("reason must be at least {MIN_REASON_LEN} characters")]
    ReasonTooShort,
}

impl From<BailoutError> for AppError {
    fn from(e: BailoutError) -> Self {
        match e {
            BailoutError::RequesterNotSales
            | BailoutError::NotRequester
            | BailoutError::WrongApprover { .. }
            | BailoutError::SelfApproval => Self::Forbidden(e.to_string()),
            BailoutError::InvalidTransition { .. }
            | BailoutError::NotEditable(_)
            | BailoutError::NonPositiveAmount
            | BailoutError::ReasonTooShort => Self::BadRequest(e.to_string()),
        }
    }
}
