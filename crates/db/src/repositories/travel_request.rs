//! Travel request repository.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{info, warn};
use uuid::Uuid;
use wayfare_core::access::{AccessError, Actor, ProcedureTier};
use wayfare_core::approval::ApprovalTarget;
use wayfare_core::audit::{AuditAction, AuditEntry, EntityType};
use wayfare_core::document::{DocumentStatus, ensure_editable, ensure_submittable};
use wayfare_core::hierarchy::ensure_no_dependents;
use wayfare_core::travel::{REQUEST_NUMBER_PREFIX, TravelType, ensure_closable, validate_plan};
use wayfare_shared::{AppError, PageRequest, PageResponse};

use crate::entities::{approvals, bailouts, claims, sea_orm_active_enums, travel_requests};
use crate::repositories::approval::{chain_rows, open_chain};
use crate::repositories::notification::Notifier;
use crate::repositories::support::{
    in_review_statuses, next_document_number, not_found, sql_err, visibility, write_audit,
};

const ENTITY: &str = "travel request";

/// Input for creating a travel request.
#[derive(Debug, Clone)]
pub struct CreateTravelRequestInput {
    /// Why the trip is needed.
    pub purpose: String,
    /// Where to.
    pub destination: String,
    /// Domestic or international.
    pub travel_type: TravelType,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day.
    pub end_date: NaiveDate,
    /// Budget estimate, zero or more.
    pub estimated_budget: Decimal,
    /// Project to charge.
    pub project_code: Option<String>,
}

/// Input for updating a travel request. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateTravelRequestInput {
    /// Purpose.
    pub purpose: Option<String>,
    /// Destination.
    pub destination: Option<String>,
    /// Travel type.
    pub travel_type: Option<TravelType>,
    /// First day.
    pub start_date: Option<NaiveDate>,
    /// Last day.
    pub end_date: Option<NaiveDate>,
    /// Budget estimate.
    pub estimated_budget: Option<Decimal>,
    /// Project code; `Some(None)` clears it.
    pub project_code: Option<Option<String>>,
}

/// Filter options for listing travel requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct TravelRequestFilter {
    /// Only this status.
    pub status: Option<DocumentStatus>,
    /// Only this requester.
    pub requester_id: Option<Uuid>,
}

/// Travel request repository.
#[derive(Debug, Clone)]
pub struct TravelRequestRepository {
    db: DatabaseConnection,
    notifier: Notifier,
}

impl TravelRequestRepository {
    /// Creates a new travel request repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, notifier: Notifier) -> Self {
        Self { db, notifier }
    }

    /// Creates a draft.
    pub async fn create(
        &self,
        actor: Actor,
        input: CreateTravelRequestInput,
    ) -> Result<travel_requests::Model, AppError> {
        validate_plan(input.start_date, input.end_date, input.estimated_budget)?;

        let txn = self.db.begin().await.map_err(sql_err)?;
        let number = next_document_number::<travel_requests::Entity, _>(
            &txn,
            travel_requests::Column::RequestNumber,
            REQUEST_NUMBER_PREFIX,
        )
        .await?;

        let now = Utc::now().into();
        let request = travel_requests::ActiveModel {
            id: Set(Uuid::now_v7()),
            request_number: Set(number),
            requester_id: Set(actor.user_id),
            purpose: Set(input.purpose),
            destination: Set(input.destination),
            travel_type: Set(input.travel_type.into()),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            estimated_budget: Set(input.estimated_budget),
            project_code: Set(input.project_code),
            status: Set(DocumentStatus::Draft.into()),
            submitted_at: Set(None),
            closed_at: Set(None),
            version: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(sql_err)?;

        write_audit(
            &txn,
            AuditEntry::new(
                Some(actor.user_id),
                AuditAction::Create,
                EntityType::TravelRequest,
                request.id,
            )
            .with("request_number", &request.request_number)
            .with("estimated_budget", request.estimated_budget),
        )
        .await?;
        txn.commit().await.map_err(sql_err)?;

        info!(travel_request_id = %request.id, number = %request.request_number, "Travel request created");
        Ok(request)
    }

    /// Lists the travel requests the actor may see, newest first.
    pub async fn list(
        &self,
        actor: Actor,
        filter: TravelRequestFilter,
        page: PageRequest,
    ) -> Result<PageResponse<travel_requests::Model>, AppError> {
        let page = page.normalized();
        let mut query = travel_requests::Entity::find()
            .order_by_desc(travel_requests::Column::CreatedAt)
            .order_by_desc(travel_requests::Column::Id);

        if let Some(cond) = visibility(
            actor,
            travel_requests::Column::RequesterId,
            travel_requests::Column::Id,
            approvals::Column::TravelRequestId,
        ) {
            query = query.filter(cond);
        }
        if let Some(status) = filter.status {
            query = query.filter(
                travel_requests::Column::Status.eq(sea_orm_active_enums::DocumentStatus::from(status)),
            );
        }
        if let Some(requester_id) = filter.requester_id {
            query = query.filter(travel_requests::Column::RequesterId.eq(requester_id));
        }

        let paginator = query.paginate(&self.db, page.limit());
        let total = paginator.num_items().await.map_err(sql_err)?;
        let rows = paginator
            .fetch_page(u64::from(page.page - 1))
            .await
            .map_err(sql_err)?;
        Ok(PageResponse::new(rows, page, total))
    }

    /// Gets one travel request the actor may see.
    pub async fn get(&self, actor: Actor, id: Uuid) -> Result<travel_requests::Model, AppError> {
        let request = find(&self.db, id).await?;
        let approvers: Vec<Uuid> = chain_rows(&self.db, ApprovalTarget::TravelRequest(id))
            .await?
            .iter()
            .map(|r| r.approver_id)
            .collect();
        if !actor.can_read(request.requester_id, &approvers) {
            return Err(AccessError::NotVisible { entity: ENTITY }.into());
        }
        Ok(request)
    }

    /// Edits a draft or a request sent back for revision.
    pub async fn update(
        &self,
        actor: Actor,
        id: Uuid,
        input: UpdateTravelRequestInput,
    ) -> Result<travel_requests::Model, AppError> {
        let txn = self.db.begin().await.map_err(sql_err)?;
        let request = find(&txn, id).await?;
        ensure_editable(ENTITY, request.status.into(), actor.user_id, request.requester_id)?;

        validate_plan(
            input.start_date.unwrap_or(request.start_date),
            input.end_date.unwrap_or(request.end_date),
            input.estimated_budget.unwrap_or(request.estimated_budget),
        )?;

        let version = request.version;
        let mut active = travel_requests::ActiveModel {
            version: Set(version + 1),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };
        if let Some(purpose) = input.purpose {
            active.purpose = Set(purpose);
        }
        if let Some(destination) = input.destination {
            active.destination = Set(destination);
        }
        if let Some(travel_type) = input.travel_type {
            active.travel_type = Set(travel_type.into());
        }
        if let Some(start_date) = input.start_date {
            active.start_date = Set(start_date);
        }
        if let Some(end_date) = input.end_date {
            active.end_date = Set(end_date);
        }
        if let Some(estimated_budget) = input.estimated_budget {
            active.estimated_budget = Set(estimated_budget);
        }
        if let Some(project_code) = input.project_code {
            active.project_code = Set(project_code);
        }
        guarded_update(&txn, id, version, active).await?;
        let request = find(&txn, id).await?;

        write_audit(
            &txn,
            AuditEntry::new(
                Some(actor.user_id),
                AuditAction::Update,
                EntityType::TravelRequest,
                id,
            )
            .with("destination", &request.destination)
            .with("estimated_budget", request.estimated_budget),
        )
        .await?;
        txn.commit().await.map_err(sql_err)?;

        info!(travel_request_id = %id, "Travel request updated");
        Ok(request)
    }

    /// Deletes a draft or a request sent back for revision.
    pub async fn delete(&self, actor: Actor, id: Uuid) -> Result<(), AppError> {
        let txn = self.db.begin().await.map_err(sql_err)?;
        let request = find(&txn, id).await?;
        ensure_editable(ENTITY, request.status.into(), actor.user_id, request.requester_id)?;

        let bailout_count = bailouts::Entity::find()
            .filter(bailouts::Column::TravelRequestId.eq(id))
            .count(&txn)
            .await
            .map_err(sql_err)?;
        ensure_no_dependents(ENTITY, "bailouts", bailout_count)?;

        approvals::Entity::delete_many()
            .filter(approvals::Column::TravelRequestId.eq(id))
            .exec(&txn)
            .await
            .map_err(sql_err)?;
        travel_requests::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(sql_err)?;

        write_audit(
            &txn,
            AuditEntry::new(
                Some(actor.user_id),
                AuditAction::Delete,
                EntityType::TravelRequest,
                id,
            )
            .with("request_number", request.request_number),
        )
        .await?;
        txn.commit().await.map_err(sql_err)?;

        info!(travel_request_id = %id, "Travel request deleted");
        Ok(())
    }

    /// Sends a draft or revised request into review.
    ///
    /// # Errors
    ///
    /// `BadRequest` when the requester has no active supervisor or the
    /// request is not editable, `Forbidden` for anyone but the requester.
    pub async fn submit(&self, actor: Actor, id: Uuid) -> Result<travel_requests::Model, AppError> {
        let txn = self.db.begin().await.map_err(sql_err)?;
        let request = find(&txn, id).await?;
        let from: DocumentStatus = request.status.into();
        ensure_submittable(ENTITY, from, actor.user_id, request.requester_id)?;
        validate_plan(request.start_date, request.end_date, request.estimated_budget)?;

        let now = Utc::now().into();
        guarded_update(
            &txn,
            id,
            request.version,
            travel_requests::ActiveModel {
                status: Set(DocumentStatus::Submitted.into()),
                submitted_at: Set(Some(now)),
                version: Set(request.version + 1),
                updated_at: Set(now),
                ..Default::default()
            },
        )
        .await?;

        let notification = match open_chain(
            &txn,
            ApprovalTarget::TravelRequest(id),
            request.requester_id,
            &request.request_number,
        )
        .await
        {
            Ok(n) => n,
            Err(e) => {
                warn!(travel_request_id = %id, error = %e, "Travel request submission rejected");
                return Err(e);
            }
        };

        write_audit(
            &txn,
            AuditEntry::new(
                Some(actor.user_id),
                AuditAction::Submit,
                EntityType::TravelRequest,
                id,
            )
            .with_transition(from, DocumentStatus::Submitted),
        )
        .await?;
        let request = find(&txn, id).await?;
        txn.commit().await.map_err(sql_err)?;

        info!(travel_request_id = %id, "Travel request submitted");
        self.notifier.deliver(&[notification]).await;
        Ok(request)
    }

    /// Closes an approved request once none of its claims is still in review.
    ///
    /// # Errors
    ///
    /// `Forbidden` unless the caller is the requester or in the Finance tier.
    pub async fn close(&self, actor: Actor, id: Uuid) -> Result<travel_requests::Model, AppError> {
        let txn = self.db.begin().await.map_err(sql_err)?;
        let request = find(&txn, id).await?;

        if actor.user_id != request.requester_id && !ProcedureTier::Finance.allows(actor.role) {
            return Err(AccessError::NotOwner { entity: ENTITY }.into());
        }

        let claims_in_review = claims::Entity::find()
            .filter(claims::Column::TravelRequestId.eq(id))
            .filter(claims::Column::Status.is_in(in_review_statuses()))
            .count(&txn)
            .await
            .map_err(sql_err)?;
        let from: DocumentStatus = request.status.into();
        ensure_closable(from, claims_in_review)?;

        let now = Utc::now().into();
        guarded_update(
            &txn,
            id,
            request.version,
            travel_requests::ActiveModel {
                status: Set(DocumentStatus::Closed.into()),
                closed_at: Set(Some(now)),
                version: Set(request.version + 1),
                updated_at: Set(now),
                ..Default::default()
            },
        )
        .await?;
        write_audit(
            &txn,
            AuditEntry::new(
                Some(actor.user_id),
                AuditAction::Close,
                EntityType::TravelRequest,
                id,
            )
            .with_transition(from, DocumentStatus::Closed),
        )
        .await?;
        let request = find(&txn, id).await?;
        txn.commit().await.map_err(sql_err)?;

        info!(travel_request_id = %id, "Travel request closed");
        Ok(request)
    }
}

pub(crate) async fn find<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<travel_requests::Model, AppError> {
    travel_requests::Entity::find_by_id(id)
        .one(conn)
        .await
        .map_err(sql_err)?
        .ok_or_else(|| not_found("Travel request", id))
}

async fn guarded_update<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
    version: i32,
    changes: travel_requests::ActiveModel,
) -> Result<(), AppError> {
    let result = travel_requests::Entity::update_many()
        .set(changes)
        .filter(travel_requests::Column::Id.eq(id))
        .filter(travel_requests::Column::Version.eq(version))
        .exec(conn)
        .await
        .map_err(sql_err)?;
    if result.rows_affected == 0 {
        return Err(AppError::Conflict(format!(
            "Travel request {id} was modified concurrently, reload and retry"
        )));
    }
    Ok(())
}
