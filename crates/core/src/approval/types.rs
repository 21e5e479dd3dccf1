//! Approval chain domain types.
//!
//! A travel request or claim owns one approval row per required level. Rows
//! are acted on strictly in level order; the parent document's status is
//! derived from the chain's progress.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::approval::error::ApprovalError;
use crate::document::DocumentStatus;

/// Minimum length of a rejection reason or revision comment, after trimming.
pub const MIN_REASON_LEN: usize = 10;

/// Maximum number of levels in one chain.
pub const MAX_LEVELS: usize = 5;

/// Organizational approval level, ordered lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ApprovalLevel {
    /// Direct supervisor.
    #[serde(rename = "L1_SUPERVISOR")]
    L1Supervisor,
    /// Manager.
    #[serde(rename = "L2_MANAGER")]
    L2Manager,
    /// Director.
    #[serde(rename = "L3_DIRECTOR")]
    L3Director,
    /// Senior director.
    #[serde(rename = "L4_SENIOR_DIRECTOR")]
    L4SeniorDirector,
    /// Executive.
    #[serde(rename = "L5_EXECUTIVE")]
    L5Executive,
}

impl ApprovalLevel {
    /// Every level, in chain order.
    pub const ALL: [Self; MAX_LEVELS] = [
        Self::L1Supervisor,
        Self::L2Manager,
        Self::L3Director,
        Self::L4SeniorDirector,
        Self::L5Executive,
    ];

    /// 1-based position in the chain.
    #[must_use]
    pub const fn ordinal(&self) -> u8 {
        match self {
            Self::L1Supervisor => 1,
            Self::L2Manager => 2,
            Self::L3Director => 3,
            Self::L4SeniorDirector => 4,
            Self::L5Executive => 5,
        }
    }

    /// Level at a 1-based position.
    #[must_use]
    pub const fn from_ordinal(ordinal: u8) -> Option<Self> {
        match ordinal {
            1 => Some(Self::L1Supervisor),
            2 => Some(Self::L2Manager),
            3 => Some(Self::L3Director),
            4 => Some(Self::L4SeniorDirector),
            5 => Some(Self::L5Executive),
            _ => None,
        }
    }

    /// Returns the string representation of the level.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::L1Supervisor => "L1_SUPERVISOR",
            Self::L2Manager => "L2_MANAGER",
            Self::L3Director => "L3_DIRECTOR",
            Self::L4SeniorDirector => "L4_SENIOR_DIRECTOR",
            Self::L5Executive => "L5_EXECUTIVE",
        }
    }

    /// Parses a level from its string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for ApprovalLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of one approval row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    /// Waiting for the approver.
    Pending,
    /// Approved by the approver.
    Approved,
    /// Rejected by the approver.
    Rejected,
    /// Approver asked for changes.
    RevisionRequested,
}

impl ApprovalStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::RevisionRequested => "REVISION_REQUESTED",
        }
    }

    /// Parses a status from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Some(Self::Pending),
            "APPROVED" => Some(Self::Approved),
            "REJECTED" => Some(Self::Rejected),
            "REVISION_REQUESTED" => Some(Self::RevisionRequested),
            _ => None,
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of document an approval chain belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetKind {
    /// A travel request.
    TravelRequest,
    /// An expense claim.
    Claim,
}

impl TargetKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TravelRequest => "TRAVEL_REQUEST",
            Self::Claim => "CLAIM",
        }
    }

    /// Parses a kind, accepting both `TRAVEL_REQUEST` and the URL form
    /// `travel-request`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "TRAVEL_REQUEST" => Some(Self::TravelRequest),
            "CLAIM" => Some(Self::Claim),
            _ => None,
        }
    }
}

/// The document an approval row belongs to. Exactly one of the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalTarget {
    /// A travel request.
    TravelRequest(Uuid),
    /// An expense claim.
    Claim(Uuid),
}

impl ApprovalTarget {
    /// Builds a target from the two nullable foreign keys of a stored row.
    ///
    /// # Errors
    ///
    /// Returns `ApprovalError::InvalidTarget` when both or neither are set.
    pub fn from_parts(
        travel_request_id: Option<Uuid>,
        claim_id: Option<Uuid>,
    ) -> Result<Self, ApprovalError> {
        match (travel_request_id, claim_id) {
            (Some(id), None) => Ok(Self::TravelRequest(id)),
            (None, Some(id)) => Ok(Self::Claim(id)),
            (Some(_), Some(_)) => Err(ApprovalError::InvalidTarget(
                "approval references both a travel request and a claim".to_string(),
            )),
            (None, None) => Err(ApprovalError::InvalidTarget(
                "approval references neither a travel request nor a claim".to_string(),
            )),
        }
    }

    /// Builds a target from a kind and id.
    #[must_use]
    pub const fn new(kind: TargetKind, id: Uuid) -> Self {
        match kind {
            TargetKind::TravelRequest => Self::TravelRequest(id),
            TargetKind::Claim => Self::Claim(id),
        }
    }

    /// Splits the target back into the two nullable foreign keys.
    #[must_use]
    pub const fn into_parts(self) -> (Option<Uuid>, Option<Uuid>) {
        match self {
            Self::TravelRequest(id) => (Some(id), None),
            Self::Claim(id) => (None, Some(id)),
        }
    }

    /// The referenced document id.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        match self {
            Self::TravelRequest(id) | Self::Claim(id) => *id,
        }
    }

    /// The referenced document kind.
    #[must_use]
    pub const fn kind(&self) -> TargetKind {
        match self {
            Self::TravelRequest(_) => TargetKind::TravelRequest,
            Self::Claim(_) => TargetKind::Claim,
        }
    }
}

/// One approval row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalStep {
    /// Row id.
    pub id: Uuid,
    /// Level of this row.
    pub level: ApprovalLevel,
    /// The user who must act on this row.
    pub approver_id: Uuid,
    /// Current status.
    pub status: ApprovalStatus,
    /// Approver comments (approval notes or revision request).
    pub comments: Option<String>,
    /// Reason given on rejection.
    pub rejection_reason: Option<String>,
    /// When the row was approved.
    pub approved_at: Option<DateTime<Utc>>,
    /// When the row was rejected.
    pub rejected_at: Option<DateTime<Utc>>,
}

impl ApprovalStep {
    /// A fresh pending row.
    #[must_use]
    pub const fn pending(id: Uuid, level: ApprovalLevel, approver_id: Uuid) -> Self {
        Self {
            id,
            level,
            approver_id,
            status: ApprovalStatus::Pending,
            comments: None,
            rejection_reason: None,
            approved_at: None,
            rejected_at: None,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.status = ApprovalStatus::Pending;
        self.comments = None;
        self.rejection_reason = None;
        self.approved_at = None;
        self.rejected_at = None;
    }
}

/// The kind of transition applied to a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalAction {
    /// A level was approved.
    Approve,
    /// A level rejected the document.
    Reject,
    /// A level asked for changes.
    RequestRevision,
}

/// Result of a successful chain transition, with everything the persistence
/// layer needs to write back and notify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutcome {
    /// What happened.
    pub action: ApprovalAction,
    /// The row the approver acted on.
    pub step_id: Uuid,
    /// Level of that row.
    pub level: ApprovalLevel,
    /// Parent status before the transition.
    pub previous_parent_status: DocumentStatus,
    /// Parent status after the transition.
    pub parent_status: DocumentStatus,
    /// Every row whose stored state changed, including the acting row.
    pub changed_steps: Vec<Uuid>,
    /// Approver of the next actionable row, if the chain is still running.
    pub next_approver: Option<Uuid>,
}

impl TransitionOutcome {
    /// True when this transition completed the chain.
    #[must_use]
    pub fn completed_chain(&self) -> bool {
        self.parent_status == DocumentStatus::Approved
    }
}

/// A planned row, produced when a document is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedStep {
    /// Level of the row.
    pub level: ApprovalLevel,
    /// Assigned approver.
    pub approver_id: Uuid,
}
