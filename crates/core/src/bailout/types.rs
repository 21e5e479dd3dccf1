//! Bailout (sales cash advance) domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Bailout status.
///
/// The valid transitions are:
/// - Draft → Submitted (requester)
/// - Submitted → ApprovedChief (sales chief)
/// - ApprovedChief → ApprovedDirector (director)
/// - ApprovedDirector → Disbursed (finance)
/// - Submitted | ApprovedChief → Rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BailoutStatus {
    /// Being written by the requester.
    Draft,
    /// Waiting for the sales chief.
    Submitted,
    /// Waiting for the director.
    ApprovedChief,
    /// Waiting for finance to pay out.
    ApprovedDirector,
    /// Paid out. Terminal.
    Disbursed,
    /// Rejected by the chief or director. Terminal.
    Rejected,
}

impl BailoutStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Submitted => "SUBMITTED",
            Self::ApprovedChief => "APPROVED_CHIEF",
            Self::ApprovedDirector => "APPROVED_DIRECTOR",
            Self::Disbursed => "DISBURSED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Parses a status from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "DRAFT" => Some(Self::Draft),
            "SUBMITTED" => Some(Self::Submitted),
            "APPROVED_CHIEF" => Some(Self::ApprovedChief),
            "APPROVED_DIRECTOR" => Some(Self::ApprovedDirector),
            "DISBURSED" => Some(Self::Disbursed),
            "REJECTED" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns true if no further transition is possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Disbursed | Self::Rejected)
    }
}

impl fmt::Display for BailoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bailout transition with its audit data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BailoutAction {
    /// Requester submitted the draft.
    Submit {
        /// Status after the transition.
        new_status: BailoutStatus,
        /// When it happened.
        submitted_at: DateTime<Utc>,
    },
    /// Sales chief approved.
    ApproveChief {
        /// Status after the transition.
        new_status: BailoutStatus,
        /// The chief.
        approved_by: Uuid,
        /// When it happened.
        approved_at: DateTime<Utc>,
    },
    /// Director approved.
    ApproveDirector {
        /// Status after the transition.
        new_status: BailoutStatus,
        /// The director.
        approved_by: Uuid,
        /// When it happened.
        approved_at: DateTime<Utc>,
    },
    /// Chief or director rejected.
    Reject {
        /// Status after the transition.
        new_status: BailoutStatus,
        /// Who rejected.
        rejected_by: Uuid,
        /// Why.
        rejection_reason: String,
        /// When it happened.
        rejected_at: DateTime<Utc>,
    },
    /// Finance paid out.
    Disburse {
        /// Status after the transition.
        new_status: BailoutStatus,
        /// Finance user.
        disbursed_by: Uuid,
        /// When it happened.
        disbursed_at: DateTime<Utc>,
        /// Payment reference.
        reference: Option<String>,
    },
}

impl BailoutAction {
    /// Status after the transition.
    #[must_use]
    pub const fn new_status(&self) -> BailoutStatus {
        match self {
            Self::Submit { new_status, .. }
            | Self::ApproveChief { new_status, .. }
            | Self::ApproveDirector { new_status, .. }
            | Self::Reject { new_status, .. }
            | Self::Disburse { new_status, .. } => *new_status,
        }
    }
}
