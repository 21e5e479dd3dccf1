//! Audit trail events.
//!
//! Every state change produces one [`AuditEntry`]; the database layer writes
//! it in the same transaction as the change. Entries are append-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// Record created.
    Create,
    /// Record changed.
    Update,
    /// Record deleted (soft or hard).
    Delete,
    /// Document sent into review.
    Submit,
    /// Approval level or bailout step approved.
    Approve,
    /// Rejected.
    Reject,
    /// Sent back for changes.
    RequestRevision,
    /// Bailout paid out.
    Disburse,
    /// Supervisor changed.
    AssignSupervisor,
    /// Claim reimbursed.
    MarkPaid,
    /// Travel request closed.
    Close,
}

impl AuditAction {
    /// Returns the string representation of the action.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Submit => "SUBMIT",
            Self::Approve => "APPROVE",
            Self::Reject => "REJECT",
            Self::RequestRevision => "REQUEST_REVISION",
            Self::Disburse => "DISBURSE",
            Self::AssignSupervisor => "ASSIGN_SUPERVISOR",
            Self::MarkPaid => "MARK_PAID",
            Self::Close => "CLOSE",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of record an entry is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    /// User.
    User,
    /// Department.
    Department,
    /// Travel request.
    TravelRequest,
    /// Claim.
    Claim,
    /// Approval row.
    Approval,
    /// Bailout.
    Bailout,
    /// Attachment.
    Attachment,
    /// Chart of accounts entry.
    ChartOfAccount,
}

impl EntityType {
    /// Returns the string representation of the type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Department => "DEPARTMENT",
            Self::TravelRequest => "TRAVEL_REQUEST",
            Self::Claim => "CLAIM",
            Self::Approval => "APPROVAL",
            Self::Bailout => "BAILOUT",
            Self::Attachment => "ATTACHMENT",
            Self::ChartOfAccount => "CHART_OF_ACCOUNT",
        }
    }

    /// Parses a type, accepting the URL form `travel-request` too.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "USER" => Some(Self::User),
            "DEPARTMENT" => Some(Self::Department),
            "TRAVEL_REQUEST" => Some(Self::TravelRequest),
            "CLAIM" => Some(Self::Claim),
            "APPROVAL" => Some(Self::Approval),
            "BAILOUT" => Some(Self::Bailout),
            "ATTACHMENT" => Some(Self::Attachment),
            "CHART_OF_ACCOUNT" => Some(Self::ChartOfAccount),
            _ => None,
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One audit record, before it is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Acting user, `None` for system actions.
    pub actor_id: Option<Uuid>,
    /// What happened.
    pub action: AuditAction,
    /// Kind of record.
    pub entity_type: EntityType,
    /// Record id.
    pub entity_id: Uuid,
    /// Snapshot of the relevant fields.
    pub metadata: Map<String, Value>,
    /// When it happened.
    pub occurred_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Starts an entry with empty metadata.
    #[must_use]
    pub fn new(
        actor_id: Option<Uuid>,
        action: AuditAction,
        entity_type: EntityType,
        entity_id: Uuid,
    ) -> Self {
        Self {
            actor_id,
            action,
            entity_type,
            entity_id,
            metadata: Map::new(),
            occurred_at: Utc::now(),
        }
    }

    /// Adds one metadata field. Values that fail to serialize are stored as null.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.metadata.insert(key.to_string(), value);
        self
    }

    /// Adds a status change as `from` / `to`.
    #[must_use]
    pub fn with_transition(self, from: impl fmt::Display, to: impl fmt::Display) -> Self {
        self.with("from", from.to_string()).with("to", to.to_string())
    }

    /// Metadata as one JSON value.
    #[must_use]
    pub fn metadata_value(&self) -> Value {
        Value::Object(self.metadata.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentStatus;

    #[test]
    fn test_entry_builder_collects_metadata() {
        let actor = Uuid::new_v4();
        let entry = AuditEntry::new(
            Some(actor),
            AuditAction::Approve,
            EntityType::Approval,
            Uuid::new_v4(),
        )
        .with("level", "L2_MANAGER")
        .with_transition(DocumentStatus::ApprovedL1, DocumentStatus::ApprovedL2);

        assert_eq!(entry.actor_id, Some(actor));
        assert_eq!(entry.metadata["level"], "L2_MANAGER");
        assert_eq!(entry.metadata["from"], "APPROVED_L1");
        assert_eq!(entry.metadata["to"], "APPROVED_L2");
        assert!(entry.metadata_value().is_object());
    }

    #[test]
    fn test_entity_type_parse_accepts_url_form() {
        assert_eq!(EntityType::parse("travel-request"), Some(EntityType::TravelRequest));
        assert_eq!(EntityType::parse("CLAIM"), Some(EntityType::Claim));
        assert_eq!(EntityType::parse("ledger"), None);
    }

    #[test]
    fn test_action_wire_names() {
        assert_eq!(AuditAction::RequestRevision.as_str(), "REQUEST_REVISION");
        assert_eq!(
            serde_json::to_string(&AuditAction::AssignSupervisor).unwrap(),
            "\"ASSIGN_SUPERVISOR\""
        );
    }
}
