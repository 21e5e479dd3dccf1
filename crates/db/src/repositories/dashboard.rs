//! Dashboard queries.
//!
//! Rows are loaded as plain facts and grouped by the aggregation functions
//! in `wayfare_core::dashboard`.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait, QueryFilter,
    QuerySelect, RelationTrait,
};
use uuid::Uuid;
use wayfare_core::access::Actor;
use wayfare_core::bailout::BailoutStatus;
use wayfare_core::dashboard::{
    ClaimFact, DateRange, MyDashboard, Overview, claims_by_department, claims_by_month,
    claims_by_status, count_by_status, total_claimed,
};
use wayfare_core::document::DocumentStatus;
use wayfare_shared::AppError;

use crate::entities::{bailouts, claims, departments, sea_orm_active_enums, travel_requests, users};
use crate::repositories::approval::actionable_for;
use crate::repositories::support::{in_review_statuses, sql_err};

/// Dashboard repository.
#[derive(Debug, Clone)]
pub struct DashboardRepository {
    db: DatabaseConnection,
}

impl DashboardRepository {
    /// Creates a new dashboard repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Personal figures: own documents by status and what waits on the user.
    pub async fn me(&self, actor: Actor) -> Result<MyDashboard, AppError> {
        let request_statuses: Vec<sea_orm_active_enums::DocumentStatus> =
            travel_requests::Entity::find()
                .select_only()
                .column(travel_requests::Column::Status)
                .filter(travel_requests::Column::RequesterId.eq(actor.user_id))
                .into_tuple()
                .all(&self.db)
                .await
                .map_err(sql_err)?;
        let request_statuses: Vec<DocumentStatus> =
            request_statuses.into_iter().map(Into::into).collect();

        let rows: Vec<(sea_orm_active_enums::DocumentStatus, Decimal, NaiveDate)> =
            claims::Entity::find()
                .select_only()
                .column(claims::Column::Status)
                .column(claims::Column::Amount)
                .column(claims::Column::Date)
                .filter(claims::Column::SubmitterId.eq(actor.user_id))
                .into_tuple()
                .all(&self.db)
                .await
                .map_err(sql_err)?;
        let facts: Vec<ClaimFact> = rows
            .into_iter()
            .map(|(status, amount, date)| ClaimFact {
                status: status.into(),
                amount,
                department_id: None,
                date,
            })
            .collect();

        let pending = actionable_for(&self.db, actor.user_id).await?;

        Ok(MyDashboard {
            travel_requests_by_status: count_by_status(&request_statuses),
            claims_by_status: claims_by_status(&facts),
            total_claimed: total_claimed(&facts),
            pending_approvals: u64::try_from(pending.len()).unwrap_or(u64::MAX),
        })
    }

    /// Organization-wide figures over a date range of claim dates.
    pub async fn overview(&self, range: DateRange) -> Result<Overview, AppError> {
        let rows: Vec<(
            sea_orm_active_enums::DocumentStatus,
            Decimal,
            NaiveDate,
            Option<Uuid>,
        )> = claims::Entity::find()
            .select_only()
            .column(claims::Column::Status)
            .column(claims::Column::Amount)
            .column(claims::Column::Date)
            .column(users::Column::DepartmentId)
            .join(JoinType::InnerJoin, claims::Relation::Submitter.def())
            .filter(claims::Column::Date.between(range.from, range.to))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(sql_err)?;
        let facts: Vec<ClaimFact> = rows
            .into_iter()
            .map(|(status, amount, date, department_id)| ClaimFact {
                status: status.into(),
                amount,
                department_id,
                date,
            })
            .collect();

        let names: HashMap<Uuid, String> = departments::Entity::find()
            .all(&self.db)
            .await
            .map_err(sql_err)?
            .into_iter()
            .map(|d| (d.id, d.name))
            .collect();

        // One actionable row per document in review.
        let requests_in_review = travel_requests::Entity::find()
            .filter(travel_requests::Column::Status.is_in(in_review_statuses()))
            .count(&self.db)
            .await
            .map_err(sql_err)?;
        let claims_in_review = claims::Entity::find()
            .filter(claims::Column::Status.is_in(in_review_statuses()))
            .count(&self.db)
            .await
            .map_err(sql_err)?;

        let awaiting: Vec<Decimal> = bailouts::Entity::find()
            .select_only()
            .column(bailouts::Column::Amount)
            .filter(
                bailouts::Column::Status.eq(sea_orm_active_enums::BailoutStatus::from(
                    BailoutStatus::ApprovedDirector,
                )),
            )
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(sql_err)?;

        Ok(Overview {
            range,
            claims_by_status: claims_by_status(&facts),
            claims_by_department: claims_by_department(&facts, &names),
            claims_by_month: claims_by_month(&facts, range),
            pending_approvals: requests_in_review + claims_in_review,
            bailouts_awaiting_disbursement: u64::try_from(awaiting.len()).unwrap_or(u64::MAX),
            bailout_amount_awaiting: awaiting.into_iter().sum(),
        })
    }
}
