//! `SeaORM` Entity for approvals table.
//!
//! Exactly one of `travel_request_id` and `claim_id` is set; a check
//! constraint enforces it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use wayfare_core::approval::{ApprovalError, ApprovalStep, ApprovalTarget};

use super::sea_orm_active_enums::{ApprovalLevel, ApprovalStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "approvals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub travel_request_id: Option<Uuid>,
    pub claim_id: Option<Uuid>,
    pub level: ApprovalLevel,
    pub approver_id: Uuid,
    pub status: ApprovalStatus,
    pub comments: Option<String>,
    pub rejection_reason: Option<String>,
    pub approved_at: Option<DateTimeWithTimeZone>,
    pub rejected_at: Option<DateTimeWithTimeZone>,
    pub version: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::travel_requests::Entity",
        from = "Column::TravelRequestId",
        to = "super::travel_requests::Column::Id",
        on_delete = "Cascade"
    )]
    TravelRequests,
    #[sea_orm(
        belongs_to = "super::claims::Entity",
        from = "Column::ClaimId",
        to = "super::claims::Column::Id",
        on_delete = "Cascade"
    )]
    Claims,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::ApproverId",
        to = "super::users::Column::Id",
        on_delete = "Restrict"
    )]
    Approver,
}

impl Related<super::travel_requests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TravelRequests.def()
    }
}

impl Related<super::claims::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Claims.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// The document this row belongs to.
    ///
    /// # Errors
    ///
    /// Returns an error if both or neither reference is set.
    pub fn target(&self) -> Result<ApprovalTarget, ApprovalError> {
        ApprovalTarget::from_parts(self.travel_request_id, self.claim_id)
    }

    /// Converts to the core step.
    #[must_use]
    pub fn to_step(&self) -> ApprovalStep {
        ApprovalStep {
            id: self.id,
            level: self.level.into(),
            approver_id: self.approver_id,
            status: self.status.into(),
            comments: self.comments.clone(),
            rejection_reason: self.rejection_reason.clone(),
            approved_at: self.approved_at.map(|t| t.to_utc()),
            rejected_at: self.rejected_at.map(|t| t.to_utc()),
        }
    }
}
