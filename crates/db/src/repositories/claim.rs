//! Claim repository.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;
use wayfare_core::access::{AccessError, Actor, ProcedureTier, require_tier};
use wayfare_core::approval::ApprovalTarget;
use wayfare_core::audit::{AuditAction, AuditEntry, EntityType};
use wayfare_core::claim::{
    CLAIM_NUMBER_PREFIX, ClaimDetails, ensure_payable, ensure_same_type, validate_amount,
};
use wayfare_core::document::{DocumentStatus, ensure_editable, ensure_submittable};
use wayfare_core::notification::NotificationDraft;
use wayfare_core::travel::ensure_claimable;
use wayfare_shared::{AppError, PageRequest, PageResponse};

use crate::entities::{approvals, attachments, chart_of_accounts, claims, sea_orm_active_enums};
use crate::repositories::approval::{chain_rows, open_chain};
use crate::repositories::notification::Notifier;
use crate::repositories::travel_request;
use crate::repositories::support::{
    next_document_number, not_found, queue_notification, sql_err, visibility, write_audit,
};

const ENTITY: &str = "claim";

/// Input for creating a claim.
#[derive(Debug, Clone)]
pub struct CreateClaimInput {
    /// Approved travel request owned by the caller.
    pub travel_request_id: Uuid,
    /// Expense date.
    pub date: NaiveDate,
    /// Amount, greater than zero.
    pub amount: Decimal,
    /// What was spent.
    pub description: String,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Account to book on.
    pub chart_of_account_id: Option<Uuid>,
    /// Entertainment or non-entertainment fields.
    pub details: ClaimDetails,
}

/// Input for updating a claim. The variant of `details` must match.
#[derive(Debug, Clone, Default)]
pub struct UpdateClaimInput {
    /// Expense date.
    pub date: Option<NaiveDate>,
    /// Amount.
    pub amount: Option<Decimal>,
    /// Description.
    pub description: Option<String>,
    /// Notes; `Some(None)` clears them.
    pub notes: Option<Option<String>>,
    /// Account; `Some(None)` clears it.
    pub chart_of_account_id: Option<Option<Uuid>>,
    /// Variant fields.
    pub details: Option<ClaimDetails>,
}

/// Filter options for listing claims.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClaimFilter {
    /// Only this status.
    pub status: Option<DocumentStatus>,
    /// Only claims against this travel request.
    pub travel_request_id: Option<Uuid>,
    /// Only this submitter.
    pub submitter_id: Option<Uuid>,
}

/// A claim with its typed variant fields.
#[derive(Debug, Clone, Serialize)]
pub struct ClaimView {
    /// Stored row.
    #[serde(flatten)]
    pub claim: claims::Model,
    /// Variant fields rebuilt from the row.
    pub details: ClaimDetails,
}

impl TryFrom<claims::Model> for ClaimView {
    type Error = AppError;

    fn try_from(claim: claims::Model) -> Result<Self, Self::Error> {
        let details = claim.details()?;
        Ok(Self { claim, details })
    }
}

/// Claim repository.
#[derive(Debug, Clone)]
pub struct ClaimRepository {
    db: DatabaseConnection,
    notifier: Notifier,
}

impl ClaimRepository {
    /// Creates a new claim repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, notifier: Notifier) -> Self {
        Self { db, notifier }
    }

    /// Creates a draft claim against an approved travel request.
    ///
    /// # Errors
    ///
    /// `Forbidden` when the travel request belongs to someone else,
    /// `BadRequest` when it is not approved or the input is invalid.
    pub async fn create(
        &self,
        actor: Actor,
        input: CreateClaimInput,
    ) -> Result<ClaimView, AppError> {
        validate_amount(input.amount)?;
        input.details.validate()?;

        let txn = self.db.begin().await.map_err(sql_err)?;
        let request = travel_request::find(&txn, input.travel_request_id).await?;
        if request.requester_id != actor.user_id {
            return Err(AccessError::NotOwner {
                entity: "travel request",
            }
            .into());
        }
        ensure_claimable(request.status.into())?;
        if let Some(account_id) = input.chart_of_account_id {
            ensure_bookable(&txn, account_id).await?;
        }

        let number = next_document_number::<claims::Entity, _>(
            &txn,
            claims::Column::ClaimNumber,
            CLAIM_NUMBER_PREFIX,
        )
        .await?;

        let now = Utc::now().into();
        let mut active = claims::ActiveModel {
            id: Set(Uuid::now_v7()),
            claim_number: Set(number),
            travel_request_id: Set(input.travel_request_id),
            submitter_id: Set(actor.user_id),
            date: Set(input.date),
            amount: Set(input.amount),
            description: Set(input.description),
            notes: Set(input.notes),
            chart_of_account_id: Set(input.chart_of_account_id),
            status: Set(DocumentStatus::Draft.into()),
            submitted_at: Set(None),
            paid_at: Set(None),
            paid_by: Set(None),
            version: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        active.set_details(input.details);
        let claim = active.insert(&txn).await.map_err(sql_err)?;

        write_audit(
            &txn,
            AuditEntry::new(Some(actor.user_id), AuditAction::Create, EntityType::Claim, claim.id)
                .with("claim_number", &claim.claim_number)
                .with("claim_type", claim.claim_type)
                .with("amount", claim.amount),
        )
        .await?;
        txn.commit().await.map_err(sql_err)?;

        info!(claim_id = %claim.id, number = %claim.claim_number, "Claim created");
        claim.try_into()
    }

    /// Lists the claims the actor may see, newest first.
    pub async fn list(
        &self,
        actor: Actor,
        filter: ClaimFilter,
        page: PageRequest,
    ) -> Result<PageResponse<ClaimView>, AppError> {
        let page = page.normalized();
        let mut query = claims::Entity::find()
            .order_by_desc(claims::Column::CreatedAt)
            .order_by_desc(claims::Column::Id);

        if let Some(cond) = visibility(
            actor,
            claims::Column::SubmitterId,
            claims::Column::Id,
            approvals::Column::ClaimId,
        ) {
            query = query.filter(cond);
        }
        if let Some(status) = filter.status {
            query = query.filter(
                claims::Column::Status.eq(sea_orm_active_enums::DocumentStatus::from(status)),
            );
        }
        if let Some(travel_request_id) = filter.travel_request_id {
            query = query.filter(claims::Column::TravelRequestId.eq(travel_request_id));
        }
        if let Some(submitter_id) = filter.submitter_id {
            query = query.filter(claims::Column::SubmitterId.eq(submitter_id));
        }

        let paginator = query.paginate(&self.db, page.limit());
        let total = paginator.num_items().await.map_err(sql_err)?;
        let rows = paginator
            .fetch_page(u64::from(page.page - 1))
            .await
            .map_err(sql_err)?;
        let views = rows
            .into_iter()
            .map(ClaimView::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PageResponse::new(views, page, total))
    }

    /// Gets one claim the actor may see.
    pub async fn get(&self, actor: Actor, id: Uuid) -> Result<ClaimView, AppError> {
        let claim = find(&self.db, id).await?;
        ensure_readable(&self.db, actor, &claim).await?;
        claim.try_into()
    }

    /// Edits a draft claim or one sent back for revision.
    pub async fn update(
        &self,
        actor: Actor,
        id: Uuid,
        input: UpdateClaimInput,
    ) -> Result<ClaimView, AppError> {
        let txn = self.db.begin().await.map_err(sql_err)?;
        let claim = find(&txn, id).await?;
        ensure_editable(ENTITY, claim.status.into(), actor.user_id, claim.submitter_id)?;

        if let Some(amount) = input.amount {
            validate_amount(amount)?;
        }
        if let Some(details) = &input.details {
            ensure_same_type(claim.claim_type.into(), details)?;
            details.validate()?;
        }
        if let Some(Some(account_id)) = input.chart_of_account_id {
            ensure_bookable(&txn, account_id).await?;
        }

        let version = claim.version;
        let mut active = claims::ActiveModel {
            version: Set(version + 1),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };
        if let Some(date) = input.date {
            active.date = Set(date);
        }
        if let Some(amount) = input.amount {
            active.amount = Set(amount);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(notes) = input.notes {
            active.notes = Set(notes);
        }
        if let Some(account_id) = input.chart_of_account_id {
            active.chart_of_account_id = Set(account_id);
        }
        if let Some(details) = input.details {
            active.set_details(details);
        }
        guarded_update(&txn, id, version, active).await?;
        let claim = find(&txn, id).await?;

        write_audit(
            &txn,
            AuditEntry::new(Some(actor.user_id), AuditAction::Update, EntityType::Claim, id)
                .with("amount", claim.amount)
                .with("date", claim.date),
        )
        .await?;
        txn.commit().await.map_err(sql_err)?;

        info!(claim_id = %id, "Claim updated");
        claim.try_into()
    }

    /// Deletes a draft claim or one sent back for revision, with its
    /// attachments and approval rows.
    pub async fn delete(&self, actor: Actor, id: Uuid) -> Result<(), AppError> {
        let txn = self.db.begin().await.map_err(sql_err)?;
        let claim = find(&txn, id).await?;
        ensure_editable(ENTITY, claim.status.into(), actor.user_id, claim.submitter_id)?;

        attachments::Entity::delete_many()
            .filter(attachments::Column::ClaimId.eq(id))
            .exec(&txn)
            .await
            .map_err(sql_err)?;
        approvals::Entity::delete_many()
            .filter(approvals::Column::ClaimId.eq(id))
            .exec(&txn)
            .await
            .map_err(sql_err)?;
        claims::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(sql_err)?;

        write_audit(
            &txn,
            AuditEntry::new(Some(actor.user_id), AuditAction::Delete, EntityType::Claim, id)
                .with("claim_number", claim.claim_number),
        )
        .await?;
        txn.commit().await.map_err(sql_err)?;

        info!(claim_id = %id, "Claim deleted");
        Ok(())
    }

    /// Sends a claim into review. Its travel request must still be approved.
    pub async fn submit(&self, actor: Actor, id: Uuid) -> Result<ClaimView, AppError> {
        let txn = self.db.begin().await.map_err(sql_err)?;
        let claim = find(&txn, id).await?;
        let from: DocumentStatus = claim.status.into();
        ensure_submittable(ENTITY, from, actor.user_id, claim.submitter_id)?;

        let request = travel_request::find(&txn, claim.travel_request_id).await?;
        ensure_claimable(request.status.into())?;
        claim.details()?.validate()?;

        let now = Utc::now().into();
        guarded_update(
            &txn,
            id,
            claim.version,
            claims::ActiveModel {
                status: Set(DocumentStatus::Submitted.into()),
                submitted_at: Set(Some(now)),
                version: Set(claim.version + 1),
                updated_at: Set(now),
                ..Default::default()
            },
        )
        .await?;

        let notification = match open_chain(
            &txn,
            ApprovalTarget::Claim(id),
            claim.submitter_id,
            &claim.claim_number,
        )
        .await
        {
            Ok(n) => n,
            Err(e) => {
                warn!(claim_id = %id, error = %e, "Claim submission rejected");
                return Err(e);
            }
        };

        write_audit(
            &txn,
            AuditEntry::new(Some(actor.user_id), AuditAction::Submit, EntityType::Claim, id)
                .with_transition(from, DocumentStatus::Submitted)
                .with("amount", claim.amount),
        )
        .await?;
        let claim = find(&txn, id).await?;
        txn.commit().await.map_err(sql_err)?;

        info!(claim_id = %id, "Claim submitted");
        self.notifier.deliver(&[notification]).await;
        claim.try_into()
    }

    /// Marks an approved claim as reimbursed.
    ///
    /// # Errors
    ///
    /// `Forbidden` below the Finance tier, `BadRequest` unless the claim is
    /// approved.
    pub async fn mark_paid(
        &self,
        actor: Actor,
        id: Uuid,
        reference: Option<String>,
    ) -> Result<ClaimView, AppError> {
        require_tier(actor.role, ProcedureTier::Finance)?;

        let txn = self.db.begin().await.map_err(sql_err)?;
        let claim = find(&txn, id).await?;
        let from: DocumentStatus = claim.status.into();
        if let Err(e) = ensure_payable(from) {
            warn!(claim_id = %id, status = %from, "Claim payment rejected");
            return Err(e.into());
        }

        let now = Utc::now().into();
        guarded_update(
            &txn,
            id,
            claim.version,
            claims::ActiveModel {
                status: Set(DocumentStatus::Paid.into()),
                paid_at: Set(Some(now)),
                paid_by: Set(Some(actor.user_id)),
                version: Set(claim.version + 1),
                updated_at: Set(now),
                ..Default::default()
            },
        )
        .await?;

        write_audit(
            &txn,
            AuditEntry::new(Some(actor.user_id), AuditAction::MarkPaid, EntityType::Claim, id)
                .with_transition(from, DocumentStatus::Paid)
                .with("amount", claim.amount)
                .with("reference", reference.filter(|r| !r.trim().is_empty())),
        )
        .await?;
        let notification = queue_notification(
            &txn,
            NotificationDraft::payment(claim.submitter_id, id, &claim.claim_number, claim.amount),
        )
        .await?;
        let claim = find(&txn, id).await?;
        txn.commit().await.map_err(sql_err)?;

        info!(claim_id = %id, paid_by = %actor.user_id, "Claim paid");
        self.notifier.deliver(&[notification]).await;
        claim.try_into()
    }
}

pub(crate) async fn find<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<claims::Model, AppError> {
    claims::Entity::find_by_id(id)
        .one(conn)
        .await
        .map_err(sql_err)?
        .ok_or_else(|| not_found("Claim", id))
}

/// Owner, an approver of the claim, or an elevated reader.
pub(crate) async fn ensure_readable<C: ConnectionTrait>(
    conn: &C,
    actor: Actor,
    claim: &claims::Model,
) -> Result<(), AppError> {
    let approvers: Vec<Uuid> = chain_rows(conn, ApprovalTarget::Claim(claim.id))
        .await?
        .iter()
        .map(|r| r.approver_id)
        .collect();
    if actor.can_read(claim.submitter_id, &approvers) {
        Ok(())
    } else {
        Err(AccessError::NotVisible { entity: ENTITY }.into())
    }
}

async fn ensure_bookable<C: ConnectionTrait>(conn: &C, account_id: Uuid) -> Result<(), AppError> {
    let account = chart_of_accounts::Entity::find_by_id(account_id)
        .one(conn)
        .await
        .map_err(sql_err)?
        .ok_or_else(|| not_found("Account", account_id))?;
    if account.is_active {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "Account {} is inactive",
            account.code
        )))
    }
}

async fn guarded_update<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
    version: i32,
    changes: claims::ActiveModel,
) -> Result<(), AppError> {
    let result = claims::Entity::update_many()
        .set(changes)
        .filter(claims::Column::Id.eq(id))
        .filter(claims::Column::Version.eq(version))
        .exec(conn)
        .await
        .map_err(sql_err)?;
    if result.rows_affected == 0 {
        return Err(AppError::Conflict(format!(
            "Claim {id} was modified concurrently, reload and retry"
        )));
    }
    Ok(())
}
