//! `SeaORM` Entity for claims table.
//!
//! Entertainment and non-entertainment fields share one table; the columns
//! of the variant a claim is not are null.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use wayfare_core::claim::{ClaimColumns, ClaimDetails, ClaimError};

use super::sea_orm_active_enums::{ClaimType, DocumentStatus, EntertainmentType, ExpenseCategory};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "claims")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub claim_number: String,
    pub travel_request_id: Uuid,
    pub submitter_id: Uuid,
    pub claim_type: ClaimType,
    pub date: Date,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub amount: Decimal,
    pub description: String,
    pub notes: Option<String>,
    pub chart_of_account_id: Option<Uuid>,
    pub status: DocumentStatus,
    pub entertainment_type: Option<EntertainmentType>,
    pub guest_name: Option<String>,
    pub guest_company: Option<String>,
    pub guest_position: Option<String>,
    pub is_government_official: Option<bool>,
    pub location: Option<String>,
    pub expense_category: Option<ExpenseCategory>,
    pub destination: Option<String>,
    pub customer_name: Option<String>,
    pub submitted_at: Option<DateTimeWithTimeZone>,
    pub paid_at: Option<DateTimeWithTimeZone>,
    pub paid_by: Option<Uuid>,
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
        from = "Column::SubmitterId",
        to = "super::users::Column::Id",
        on_delete = "Restrict"
    )]
    Submitter,
    #[sea_orm(
        belongs_to = "super::chart_of_accounts::Entity",
        from = "Column::ChartOfAccountId",
        to = "super::chart_of_accounts::Column::Id",
        on_delete = "Restrict"
    )]
    ChartOfAccounts,
    #[sea_orm(has_many = "super::attachments::Entity")]
    Attachments,
    #[sea_orm(has_many = "super::approvals::Entity")]
    Approvals,
}

impl Related<super::travel_requests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TravelRequests.def()
    }
}

impl Related<super::attachments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attachments.def()
    }
}

impl Related<super::approvals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Approvals.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Rebuilds the typed variant from the nullable columns.
    ///
    /// # Errors
    ///
    /// Returns an error if a required column of the stored variant is null.
    pub fn details(&self) -> Result<ClaimDetails, ClaimError> {
        ClaimDetails::from_columns(ClaimColumns {
            claim_type: self.claim_type.into(),
            entertainment_type: self.entertainment_type.map(Into::into),
            guest_name: self.guest_name.clone(),
            guest_company: self.guest_company.clone(),
            guest_position: self.guest_position.clone(),
            is_government_official: self.is_government_official,
            location: self.location.clone(),
            expense_category: self.expense_category.map(Into::into),
            destination: self.destination.clone(),
            customer_name: self.customer_name.clone(),
        })
    }
}

impl ActiveModel {
    /// Writes every variant column, nulling the other variant's.
    pub fn set_details(&mut self, details: ClaimDetails) {
        use sea_orm::Set;

        let c = details.into_columns();
        self.claim_type = Set(c.claim_type.into());
        self.entertainment_type = Set(c.entertainment_type.map(Into::into));
        self.guest_name = Set(c.guest_name);
        self.guest_company = Set(c.guest_company);
        self.guest_position = Set(c.guest_position);
        self.is_government_official = Set(c.is_government_official);
        self.location = Set(c.location);
        self.expense_category = Set(c.expense_category.map(Into::into));
        self.destination = Set(c.destination);
        self.customer_name = Set(c.customer_name);
    }
}
