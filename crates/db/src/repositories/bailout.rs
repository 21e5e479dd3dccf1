//! Bailout repository.
//!
//! Bailouts follow their own two-level chain (sales chief, then director)
//! instead of the supervisor walk, and end with a finance disbursement.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{info, warn};
use uuid::Uuid;
use wayfare_core::access::{AccessError, Actor, Role};
use wayfare_core::audit::{AuditAction, AuditEntry, EntityType};
use wayfare_core::bailout::{
    BAILOUT_NUMBER_PREFIX, BailoutAction, BailoutError, BailoutService, BailoutStatus,
};
use wayfare_core::notification::NotificationDraft;
use wayfare_core::travel::ensure_bailout_eligible;
use wayfare_shared::{AppError, PageRequest, PageResponse};

use crate::entities::{bailouts, sea_orm_active_enums, users};
use crate::repositories::notification::Notifier;
use crate::repositories::support::{
    next_document_number, not_found, queue_notification, sql_err, write_audit,
};
use crate::repositories::travel_request;

/// Input for creating a bailout.
#[derive(Debug, Clone)]
pub struct CreateBailoutInput {
    /// Approved travel request owned by the caller.
    pub travel_request_id: Uuid,
    /// Cash needed up front.
    pub amount: Decimal,
    /// What it is for.
    pub purpose: String,
}

/// Input for updating a draft bailout.
#[derive(Debug, Clone, Default)]
pub struct UpdateBailoutInput {
    /// Amount.
    pub amount: Option<Decimal>,
    /// Purpose.
    pub purpose: Option<String>,
}

/// Filter options for listing bailouts.
#[derive(Debug, Clone, Copy, Default)]
pub struct BailoutFilter {
    /// Only this status.
    pub status: Option<BailoutStatus>,
    /// Only bailouts for this travel request.
    pub travel_request_id: Option<Uuid>,
}

/// Bailout repository.
#[derive(Debug, Clone)]
pub struct BailoutRepository {
    db: DatabaseConnection,
    notifier: Notifier,
}

impl BailoutRepository {
    /// Creates a new bailout repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, notifier: Notifier) -> Self {
        Self { db, notifier }
    }

    /// Opens a draft bailout against an approved travel request.
    ///
    /// # Errors
    ///
    /// `Forbidden` for non-sales roles or someone else's travel request,
    /// `BadRequest` for a non-positive amount or an unapproved request.
    pub async fn create(
        &self,
        actor: Actor,
        input: CreateBailoutInput,
    ) -> Result<bailouts::Model, AppError> {
        BailoutService::validate_request(actor.role, input.amount)?;
        if input.purpose.trim().is_empty() {
            return Err(AppError::Validation("Purpose is required".to_string()));
        }

        let txn = self.db.begin().await.map_err(sql_err)?;
        let request = travel_request::find(&txn, input.travel_request_id).await?;
        if request.requester_id != actor.user_id {
            return Err(AccessError::NotOwner {
                entity: "travel request",
            }
            .into());
        }
        ensure_bailout_eligible(request.status.into())?;

        let number = next_document_number::<bailouts::Entity, _>(
            &txn,
            bailouts::Column::BailoutNumber,
            BAILOUT_NUMBER_PREFIX,
        )
        .await?;
        let now = Utc::now().into();
        let bailout = bailouts::ActiveModel {
            id: Set(Uuid::now_v7()),
            bailout_number: Set(number),
            travel_request_id: Set(input.travel_request_id),
            requester_id: Set(actor.user_id),
            amount: Set(input.amount),
            purpose: Set(input.purpose.trim().to_string()),
            status: Set(BailoutStatus::Draft.into()),
            submitted_at: Set(None),
            chief_approver_id: Set(None),
            chief_approved_at: Set(None),
            director_approver_id: Set(None),
            director_approved_at: Set(None),
            rejected_by: Set(None),
            rejection_reason: Set(None),
            rejected_at: Set(None),
            disbursed_by: Set(None),
            disbursed_at: Set(None),
            disbursement_reference: Set(None),
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
                EntityType::Bailout,
                bailout.id,
            )
            .with("bailout_number", &bailout.bailout_number)
            .with("amount", bailout.amount),
        )
        .await?;
        txn.commit().await.map_err(sql_err)?;

        info!(bailout_id = %bailout.id, number = %bailout.bailout_number, "Bailout created");
        Ok(bailout)
    }

    /// Lists the bailouts the actor may see, newest first.
    ///
    /// Requesters see their own; sales chiefs and directors also see every
    /// submitted one; finance and admins see all.
    pub async fn list(
        &self,
        actor: Actor,
        filter: BailoutFilter,
        page: PageRequest,
    ) -> Result<PageResponse<bailouts::Model>, AppError> {
        let page = page.normalized();
        let mut query = bailouts::Entity::find()
            .order_by_desc(bailouts::Column::CreatedAt)
            .order_by_desc(bailouts::Column::Id);

        if !actor.role.is_elevated_reader() {
            let mut cond = Condition::any().add(bailouts::Column::RequesterId.eq(actor.user_id));
            if is_bailout_approver(actor.role) {
                cond = cond.add(
                    bailouts::Column::Status
                        .ne(sea_orm_active_enums::BailoutStatus::from(BailoutStatus::Draft)),
                );
            }
            query = query.filter(cond);
        }
        if let Some(status) = filter.status {
            query = query.filter(
                bailouts::Column::Status.eq(sea_orm_active_enums::BailoutStatus::from(status)),
            );
        }
        if let Some(travel_request_id) = filter.travel_request_id {
            query = query.filter(bailouts::Column::TravelRequestId.eq(travel_request_id));
        }

        let paginator = query.paginate(&self.db, page.limit());
        let total = paginator.num_items().await.map_err(sql_err)?;
        let rows = paginator
            .fetch_page(u64::from(page.page - 1))
            .await
            .map_err(sql_err)?;
        Ok(PageResponse::new(rows, page, total))
    }

    /// Gets one bailout the actor may see.
    pub async fn get(&self, actor: Actor, id: Uuid) -> Result<bailouts::Model, AppError> {
        let bailout = find(&self.db, id).await?;
        let status: BailoutStatus = bailout.status.into();
        let visible = bailout.requester_id == actor.user_id
            || actor.role.is_elevated_reader()
            || (is_bailout_approver(actor.role) && status != BailoutStatus::Draft);
        if !visible {
            return Err(AccessError::NotVisible { entity: "bailout" }.into());
        }
        Ok(bailout)
    }

    /// Edits a draft.
    pub async fn update(
        &self,
        actor: Actor,
        id: Uuid,
        input: UpdateBailoutInput,
    ) -> Result<bailouts::Model, AppError> {
        let txn = self.db.begin().await.map_err(sql_err)?;
        let bailout = find(&txn, id).await?;
        BailoutService::ensure_editable(bailout.status.into(), actor.user_id, bailout.requester_id)?;
        if let Some(amount) = input.amount {
            BailoutService::validate_request(actor.role, amount)?;
        }

        let mut changes = bailouts::ActiveModel {
            version: Set(bailout.version + 1),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };
        if let Some(amount) = input.amount {
            changes.amount = Set(amount);
        }
        if let Some(purpose) = input.purpose {
            if purpose.trim().is_empty() {
                return Err(AppError::Validation("Purpose is required".to_string()));
            }
            changes.purpose = Set(purpose.trim().to_string());
        }
        guarded_update(&txn, id, bailout.version, changes).await?;
        let bailout = find(&txn, id).await?;

        write_audit(
            &txn,
            AuditEntry::new(Some(actor.user_id), AuditAction::Update, EntityType::Bailout, id)
                .with("amount", bailout.amount),
        )
        .await?;
        txn.commit().await.map_err(sql_err)?;

        info!(bailout_id = %id, "Bailout updated");
        Ok(bailout)
    }

    /// Deletes a draft.
    pub async fn delete(&self, actor: Actor, id: Uuid) -> Result<(), AppError> {
        let txn = self.db.begin().await.map_err(sql_err)?;
        let bailout = find(&txn, id).await?;
        BailoutService::ensure_editable(bailout.status.into(), actor.user_id, bailout.requester_id)?;

        bailouts::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(sql_err)?;
        write_audit(
            &txn,
            AuditEntry::new(Some(actor.user_id), AuditAction::Delete, EntityType::Bailout, id)
                .with("bailout_number", bailout.bailout_number),
        )
        .await?;
        txn.commit().await.map_err(sql_err)?;

        info!(bailout_id = %id, "Bailout deleted");
        Ok(())
    }

    /// Requester submits a draft to the sales chiefs.
    pub async fn submit(&self, actor: Actor, id: Uuid) -> Result<bailouts::Model, AppError> {
        self.transition(actor, id, |status, requester| {
            BailoutService::submit(status, actor.user_id, requester)
        })
        .await
    }

    /// Sales chief approves.
    pub async fn approve_chief(&self, actor: Actor, id: Uuid) -> Result<bailouts::Model, AppError> {
        self.transition(actor, id, |status, requester| {
            BailoutService::approve_chief(status, actor, requester)
        })
        .await
    }

    /// Director approves.
    pub async fn approve_director(
        &self,
        actor: Actor,
        id: Uuid,
    ) -> Result<bailouts::Model, AppError> {
        self.transition(actor, id, |status, requester| {
            BailoutService::approve_director(status, actor, requester)
        })
        .await
    }

    /// Chief or director rejects at the current level.
    pub async fn reject(
        &self,
        actor: Actor,
        id: Uuid,
        reason: &str,
    ) -> Result<bailouts::Model, AppError> {
        self.transition(actor, id, |status, requester| {
            BailoutService::reject(status, actor, requester, reason)
        })
        .await
    }

    /// Finance pays out a director-approved bailout.
    pub async fn disburse(
        &self,
        actor: Actor,
        id: Uuid,
        reference: Option<String>,
    ) -> Result<bailouts::Model, AppError> {
        self.transition(actor, id, |status, _| {
            BailoutService::disburse(status, actor, reference)
        })
        .await
    }

    async fn transition<F>(
        &self,
        actor: Actor,
        id: Uuid,
        decide: F,
    ) -> Result<bailouts::Model, AppError>
    where
        F: FnOnce(BailoutStatus, Uuid) -> Result<BailoutAction, BailoutError>,
    {
        let txn = self.db.begin().await.map_err(sql_err)?;
        let bailout = find(&txn, id).await?;
        let from: BailoutStatus = bailout.status.into();

        let action = match decide(from, bailout.requester_id) {
            Ok(action) => action,
            Err(e) => {
                warn!(bailout_id = %id, status = %from, error = %e, "Bailout transition rejected");
                return Err(e.into());
            }
        };
        let to = action.new_status();

        let mut changes = bailouts::ActiveModel {
            status: Set(to.into()),
            version: Set(bailout.version + 1),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };
        let mut entry = AuditEntry::new(
            Some(actor.user_id),
            audit_action(&action),
            EntityType::Bailout,
            id,
        )
        .with_transition(from, to);
        match action {
            BailoutAction::Submit { submitted_at, .. } => {
                changes.submitted_at = Set(Some(submitted_at.into()));
            }
            BailoutAction::ApproveChief {
                approved_by,
                approved_at,
                ..
            } => {
                changes.chief_approver_id = Set(Some(approved_by));
                changes.chief_approved_at = Set(Some(approved_at.into()));
            }
            BailoutAction::ApproveDirector {
                approved_by,
                approved_at,
                ..
            } => {
                changes.director_approver_id = Set(Some(approved_by));
                changes.director_approved_at = Set(Some(approved_at.into()));
            }
            BailoutAction::Reject {
                rejected_by,
                rejection_reason,
                rejected_at,
                ..
            } => {
                entry = entry.with("reason", &rejection_reason);
                changes.rejected_by = Set(Some(rejected_by));
                changes.rejection_reason = Set(Some(rejection_reason));
                changes.rejected_at = Set(Some(rejected_at.into()));
            }
            BailoutAction::Disburse {
                disbursed_by,
                disbursed_at,
                reference,
                ..
            } => {
                entry = entry.with("reference", &reference).with("amount", bailout.amount);
                changes.disbursed_by = Set(Some(disbursed_by));
                changes.disbursed_at = Set(Some(disbursed_at.into()));
                changes.disbursement_reference = Set(reference);
            }
        }
        guarded_update(&txn, id, bailout.version, changes).await?;
        write_audit(&txn, entry).await?;

        let mut notifications = Vec::new();
        for recipient in recipients(&txn, to, bailout.requester_id).await? {
            notifications.push(
                queue_notification(&txn, NotificationDraft::bailout_update(recipient, id, to))
                    .await?,
            );
        }

        let bailout = find(&txn, id).await?;
        txn.commit().await.map_err(sql_err)?;

        info!(bailout_id = %id, from = %from, to = %to, actor_id = %actor.user_id, "Bailout transitioned");
        self.notifier.deliver(&notifications).await;
        Ok(bailout)
    }
}

const fn is_bailout_approver(role: Role) -> bool {
    matches!(role, Role::SalesChief | Role::Director)
}

const fn audit_action(action: &BailoutAction) -> AuditAction {
    match action {
        BailoutAction::Submit { .. } => AuditAction::Submit,
        BailoutAction::ApproveChief { .. } | BailoutAction::ApproveDirector { .. } => {
            AuditAction::Approve
        }
        BailoutAction::Reject { .. } => AuditAction::Reject,
        BailoutAction::Disburse { .. } => AuditAction::Disburse,
    }
}

/// Who hears about a bailout reaching `status`: the requester, plus whoever
/// acts next.
async fn recipients<C: ConnectionTrait>(
    conn: &C,
    status: BailoutStatus,
    requester_id: Uuid,
) -> Result<Vec<Uuid>, AppError> {
    let next_roles: &[Role] = match status {
        BailoutStatus::Submitted => &[Role::SalesChief],
        BailoutStatus::ApprovedChief => &[Role::Director],
        BailoutStatus::ApprovedDirector => &[Role::Finance],
        _ => &[],
    };
    let mut out = Vec::new();
    if status != BailoutStatus::Submitted {
        out.push(requester_id);
    }
    if !next_roles.is_empty() {
        let roles: Vec<sea_orm_active_enums::UserRole> =
            next_roles.iter().map(|r| (*r).into()).collect();
        let ids: Vec<Uuid> = users::Entity::find()
            .filter(users::Column::Role.is_in(roles))
            .filter(users::Column::DeletedAt.is_null())
            .filter(users::Column::Id.ne(requester_id))
            .all(conn)
            .await
            .map_err(sql_err)?
            .into_iter()
            .map(|u| u.id)
            .collect();
        out.extend(ids);
    }
    Ok(out)
}

pub(crate) async fn find<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<bailouts::Model, AppError> {
    bailouts::Entity::find_by_id(id)
        .one(conn)
        .await
        .map_err(sql_err)?
        .ok_or_else(|| not_found("Bailout", id))
}

async fn guarded_update<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
    version: i32,
    changes: bailouts::ActiveModel,
) -> Result<(), AppError> {
    let result = bailouts::Entity::update_many()
        .set(changes)
        .filter(bailouts::Column::Id.eq(id))
        .filter(bailouts::Column::Version.eq(version))
        .exec(conn)
        .await
        .map_err(sql_err)?;
    if result.rows_affected == 0 {
        return Err(AppError::Conflict(format!(
            "Bailout {id} was modified concurrently, reload and retry"
        )));
    }
    Ok(())
}
