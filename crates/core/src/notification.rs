//! Notification templates.
//!
//! Transitions produce [`NotificationDraft`]s; the database layer stores them
//! with the transition and hands them to a `NotificationSender` after commit.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use wayfare_shared::OutboundMessage;

use crate::approval::{ApprovalLevel, TargetKind};
use crate::audit::EntityType;
use crate::bailout::BailoutStatus;

/// Why the user is notified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    /// A document waits for the recipient's approval.
    ApprovalRequired,
    /// The recipient's document was fully approved.
    Approved,
    /// The recipient's document was rejected.
    Rejected,
    /// The recipient's document was sent back.
    RevisionRequested,
    /// A bailout moved.
    BailoutUpdate,
    /// A claim was paid.
    Payment,
}

impl NotificationKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ApprovalRequired => "APPROVAL_REQUIRED",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::RevisionRequested => "REVISION_REQUESTED",
            Self::BailoutUpdate => "BAILOUT_UPDATE",
            Self::Payment => "PAYMENT",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of handing a notification to the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    /// Not attempted yet.
    Pending,
    /// Sender accepted it.
    Sent,
    /// Sender failed.
    Failed,
}

/// A notification ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDraft {
    /// Who gets it.
    pub recipient_id: Uuid,
    /// Why.
    pub kind: NotificationKind,
    /// Short title.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Kind of record it is about.
    pub entity_type: EntityType,
    /// Record id.
    pub entity_id: Uuid,
}

fn describe(kind: TargetKind) -> (&'static str, EntityType) {
    match kind {
        TargetKind::TravelRequest => ("Travel request", EntityType::TravelRequest),
        TargetKind::Claim => ("Claim", EntityType::Claim),
    }
}

impl NotificationDraft {
    /// Tells an approver that a document waits for them.
    #[must_use]
    pub fn approval_required(
        approver_id: Uuid,
        kind: TargetKind,
        document_id: Uuid,
        number: &str,
        level: ApprovalLevel,
    ) -> Self {
        let (label, entity_type) = describe(kind);
        Self {
            recipient_id: approver_id,
            kind: NotificationKind::ApprovalRequired,
            title: format!("{label} {number} needs your approval"),
            message: format!("{label} {number} is waiting for your decision at level {level}."),
            entity_type,
            entity_id: document_id,
        }
    }

    /// Tells the submitter the chain completed.
    #[must_use]
    pub fn approved(submitter_id: Uuid, kind: TargetKind, document_id: Uuid, number: &str) -> Self {
        let (label, entity_type) = describe(kind);
        Self {
            recipient_id: submitter_id,
            kind: NotificationKind::Approved,
            title: format!("{label} {number} approved"),
            message: format!("{label} {number} has been approved at every level."),
            entity_type,
            entity_id: document_id,
        }
    }

    /// Tells the submitter the document was rejected.
    #[must_use]
    pub fn rejected(
        submitter_id: Uuid,
        kind: TargetKind,
        document_id: Uuid,
        number: &str,
        reason: &str,
    ) -> Self {
        let (label, entity_type) = describe(kind);
        Self {
            recipient_id: submitter_id,
            kind: NotificationKind::Rejected,
            title: format!("{label} {number} rejected"),
            message: format!("{label} {number} was rejected: {reason}"),
            entity_type,
            entity_id: document_id,
        }
    }

    /// Tells the submitter changes are needed.
    #[must_use]
    pub fn revision_requested(
        submitter_id: Uuid,
        kind: TargetKind,
        document_id: Uuid,
        number: &str,
        comments: &str,
    ) -> Self {
        let (label, entity_type) = describe(kind);
        Self {
            recipient_id: submitter_id,
            kind: NotificationKind::RevisionRequested,
            title: format!("{label} {number} needs changes"),
            message: format!("{label} {number} was sent back for revision: {comments}"),
            entity_type,
            entity_id: document_id,
        }
    }

    /// Tells a bailout requester (or the next approver) about a status change.
    #[must_use]
    pub fn bailout_update(recipient_id: Uuid, bailout_id: Uuid, status: BailoutStatus) -> Self {
        let message = match status {
            BailoutStatus::Submitted => "A bailout request is waiting for sales chief approval.",
            BailoutStatus::ApprovedChief => {
                "A bailout request was approved by the sales chief and waits for a director."
            }
            BailoutStatus::ApprovedDirector => {
                "A bailout request was approved by a director and waits for disbursement."
            }
            BailoutStatus::Disbursed => "Your bailout has been disbursed.",
            BailoutStatus::Rejected => "Your bailout request was rejected.",
            BailoutStatus::Draft => "Your bailout request is back in draft.",
        };
        Self {
            recipient_id,
            kind: NotificationKind::BailoutUpdate,
            title: format!("Bailout {status}"),
            message: message.to_string(),
            entity_type: EntityType::Bailout,
            entity_id: bailout_id,
        }
    }

    /// Tells the submitter a claim was reimbursed.
    #[must_use]
    pub fn payment(submitter_id: Uuid, claim_id: Uuid, number: &str, amount: Decimal) -> Self {
        Self {
            recipient_id: submitter_id,
            kind: NotificationKind::Payment,
            title: format!("Claim {number} paid"),
            message: format!("Claim {number} for {amount} has been reimbursed."),
            entity_type: EntityType::Claim,
            entity_id: claim_id,
        }
    }

    /// Renders the draft for a delivery channel.
    #[must_use]
    pub fn to_outbound(&self, to_email: &str, to_name: &str) -> OutboundMessage {
        OutboundMessage {
            to_email: to_email.to_string(),
            to_name: to_name.to_string(),
            subject: format!("[Wayfare] {}", self.title),
            body: self.message.clone(),
        }
    }
}
