//! `SeaORM` Entity for bailouts table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::BailoutStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "bailouts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub bailout_number: String,
    pub travel_request_id: Uuid,
    pub requester_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub amount: Decimal,
    pub purpose: String,
    pub status: BailoutStatus,
    pub submitted_at: Option<DateTimeWithTimeZone>,
    pub chief_approver_id: Option<Uuid>,
    pub chief_approved_at: Option<DateTimeWithTimeZone>,
    pub director_approver_id: Option<Uuid>,
    pub director_approved_at: Option<DateTimeWithTimeZone>,
    pub rejected_by: Option<Uuid>,
    pub rejection_reason: Option<String>,
    pub rejected_at: Option<DateTimeWithTimeZone>,
    pub disbursed_by: Option<Uuid>,
    pub disbursed_at: Option<DateTimeWithTimeZone>,
    pub disbursement_reference: Option<String>,
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
        on_delete = "Restrict"
    )]
    TravelRequests,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::RequesterId",
        to = "super::users::Column::Id",
        on_delete = "Restrict"
    )]
    Requester,
}

impl Related<super::travel_requests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TravelRequests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
