//! Status model shared by travel requests and claims.
//!
//! Both documents move through the same states and are gated the same way:
//! only `DRAFT` and `REVISION` are editable, only by the submitter.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::access::AccessError;
use crate::approval::ApprovalLevel;

/// Lifecycle status of a travel request or claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    /// Being written, editable by the submitter.
    Draft,
    /// Submitted, no level approved yet.
    Submitted,
    /// Level 1 approved, more levels pending.
    #[serde(rename = "APPROVED_L1")]
    ApprovedL1,
    /// Level 2 approved, more levels pending.
    #[serde(rename = "APPROVED_L2")]
    ApprovedL2,
    /// Level 3 approved, more levels pending.
    #[serde(rename = "APPROVED_L3")]
    ApprovedL3,
    /// Level 4 approved, more levels pending.
    #[serde(rename = "APPROVED_L4")]
    ApprovedL4,
    /// Level 5 approved, more levels pending.
    #[serde(rename = "APPROVED_L5")]
    ApprovedL5,
    /// Every level approved.
    Approved,
    /// Rejected at some level. Terminal.
    Rejected,
    /// Sent back for revision, editable again.
    Revision,
    /// Claim reimbursed by finance. Terminal.
    Paid,
    /// Travel request closed after the trip. Terminal.
    Closed,
}

impl DocumentStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Submitted => "SUBMITTED",
            Self::ApprovedL1 => "APPROVED_L1",
            Self::ApprovedL2 => "APPROVED_L2",
            Self::ApprovedL3 => "APPROVED_L3",
            Self::ApprovedL4 => "APPROVED_L4",
            Self::ApprovedL5 => "APPROVED_L5",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Revision => "REVISION",
            Self::Paid => "PAID",
            Self::Closed => "CLOSED",
        }
    }

    /// Parses a status, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "DRAFT" => Some(Self::Draft),
            "SUBMITTED" => Some(Self::Submitted),
            "APPROVED_L1" => Some(Self::ApprovedL1),
            "APPROVED_L2" => Some(Self::ApprovedL2),
            "APPROVED_L3" => Some(Self::ApprovedL3),
            "APPROVED_L4" => Some(Self::ApprovedL4),
            "APPROVED_L5" => Some(Self::ApprovedL5),
            "APPROVED" => Some(Self::Approved),
            "REJECTED" => Some(Self::Rejected),
            "REVISION" => Some(Self::Revision),
            "PAID" => Some(Self::Paid),
            "CLOSED" => Some(Self::Closed),
            _ => None,
        }
    }

    /// The intermediate marker for an approved level.
    #[must_use]
    pub const fn approved_at(level: ApprovalLevel) -> Self {
        match level {
            ApprovalLevel::L1Supervisor => Self::ApprovedL1,
            ApprovalLevel::L2Manager => Self::ApprovedL2,
            ApprovalLevel::L3Director => Self::ApprovedL3,
            ApprovalLevel::L4SeniorDirector => Self::ApprovedL4,
            ApprovalLevel::L5Executive => Self::ApprovedL5,
        }
    }

    /// `DRAFT` and `REVISION` documents can be edited and deleted.
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        matches!(self, Self::Draft | Self::Revision)
    }

    /// The approval chain is running.
    #[must_use]
    pub const fn is_in_review(&self) -> bool {
        matches!(
            self,
            Self::Submitted
                | Self::ApprovedL1
                | Self::ApprovedL2
                | Self::ApprovedL3
                | Self::ApprovedL4
                | Self::ApprovedL5
        )
    }

    /// No further transition is possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Paid | Self::Closed)
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checks that `actor_id` may edit or delete a document owned by `submitter_id`.
///
/// Someone else's document is `NotOwner`; the submitter's own document in a
/// locked status is `NotEditable`.
pub fn ensure_editable(
    entity: &'static str,
    status: DocumentStatus,
    actor_id: Uuid,
    submitter_id: Uuid,
) -> Result<(), AccessError> {
    if actor_id != submitter_id {
        return Err(AccessError::NotOwner { entity });
    }
    if !status.is_editable() {
        return Err(AccessError::NotEditable {
            entity,
            status: status.to_string(),
        });
    }
    Ok(())
}

/// Checks that the submitter may send the document into review.
pub fn ensure_submittable(
    entity: &'static str,
    status: DocumentStatus,
    actor_id: Uuid,
    submitter_id: Uuid,
) -> Result<(), AccessError> {
    ensure_editable(entity, status, actor_id, submitter_id)
}

/// Formats a human-readable document number such as `TR-2026-00042`.
#[must_use]
pub fn document_number(prefix: &str, year: i32, sequence: u64) -> String {
    format!("{prefix}-{year}-{sequence:05}")
}
