//! Approval repository.
//!
//! Every transition loads the document and all of its approval rows inside
//! one transaction, runs the core state machine, and writes back only the
//! rows that changed. Writes are guarded by the `version` column of each
//! row and of the document, so two approvers racing on the same chain
//! cannot both win: the loser gets `CONFLICT` and nothing of theirs is
//! stored.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;
use wayfare_core::access::{AccessError, Actor};
use wayfare_core::approval::{
    ApprovalAction, ApprovalChain, ApprovalError, ApprovalLevel, ApprovalTarget, TargetKind, TransitionOutcome,
    plan_chain,
};
use wayfare_core::audit::{AuditAction, AuditEntry, EntityType};
use wayfare_core::document::DocumentStatus;
use wayfare_core::notification::NotificationDraft;
use wayfare_shared::{AppError, PageRequest, PageResponse};

use crate::entities::{
    approvals, audit_logs, claims,
    sea_orm_active_enums::{self, ApprovalStatus},
    travel_requests,
};
use crate::repositories::notification::Notifier;
use crate::repositories::support::{not_found, queue_notification, sql_err, write_audit};
use crate::repositories::user::active_forest;

/// A travel request or claim as seen by the approval flow.
#[derive(Debug, Clone)]
pub(crate) enum Document {
    Travel(travel_requests::Model),
    Claim(claims::Model),
}

impl Document {
    pub(crate) async fn load<C: ConnectionTrait>(
        conn: &C,
        target: ApprovalTarget,
    ) -> Result<Self, AppError> {
        match target {
            ApprovalTarget::TravelRequest(id) => travel_requests::Entity::find_by_id(id)
                .one(conn)
                .await
                .map_err(sql_err)?
                .map(Self::Travel)
                .ok_or_else(|| not_found("Travel request", id)),
            ApprovalTarget::Claim(id) => claims::Entity::find_by_id(id)
                .one(conn)
                .await
                .map_err(sql_err)?
                .map(Self::Claim)
                .ok_or_else(|| not_found("Claim", id)),
        }
    }

    pub(crate) fn target(&self) -> ApprovalTarget {
        match self {
            Self::Travel(m) => ApprovalTarget::TravelRequest(m.id),
            Self::Claim(m) => ApprovalTarget::Claim(m.id),
        }
    }

    pub(crate) fn status(&self) -> DocumentStatus {
        match self {
            Self::Travel(m) => m.status.into(),
            Self::Claim(m) => m.status.into(),
        }
    }

    pub(crate) fn submitter_id(&self) -> Uuid {
        match self {
            Self::Travel(m) => m.requester_id,
            Self::Claim(m) => m.submitter_id,
        }
    }

    pub(crate) fn number(&self) -> &str {
        match self {
            Self::Travel(m) => &m.request_number,
            Self::Claim(m) => &m.claim_number,
        }
    }

    fn amount(&self) -> Decimal {
        match self {
            Self::Travel(m) => m.estimated_budget,
            Self::Claim(m) => m.amount,
        }
    }

    const fn entity_type(&self) -> EntityType {
        match self {
            Self::Travel(_) => EntityType::TravelRequest,
            Self::Claim(_) => EntityType::Claim,
        }
    }

    /// Writes a new status if the stored version still matches.
    pub(crate) async fn save_status<C: ConnectionTrait>(
        &self,
        conn: &C,
        status: DocumentStatus,
    ) -> Result<(), AppError> {
        let status: sea_orm_active_enums::DocumentStatus = status.into();
        let now = Utc::now().into();
        let rows_affected = match self {
            Self::Travel(m) => {
                travel_requests::Entity::update_many()
                    .set(travel_requests::ActiveModel {
                        status: Set(status),
                        version: Set(m.version + 1),
                        updated_at: Set(now),
                        ..Default::default()
                    })
                    .filter(travel_requests::Column::Id.eq(m.id))
                    .filter(travel_requests::Column::Version.eq(m.version))
                    .exec(conn)
                    .await
                    .map_err(sql_err)?
                    .rows_affected
            }
            Self::Claim(m) => {
                claims::Entity::update_many()
                    .set(claims::ActiveModel {
                        status: Set(status),
                        version: Set(m.version + 1),
                        updated_at: Set(now),
                        ..Default::default()
                    })
                    .filter(claims::Column::Id.eq(m.id))
                    .filter(claims::Column::Version.eq(m.version))
                    .exec(conn)
                    .await
                    .map_err(sql_err)?
                    .rows_affected
            }
        };
        if rows_affected == 0 {
            return Err(ApprovalError::ConcurrentModification.into());
        }
        Ok(())
    }
}

/// An approval row with its document and every row of its chain.
#[derive(Debug, Clone)]
pub(crate) struct LoadedChain {
    row: approvals::Model,
    document: Document,
    rows: Vec<approvals::Model>,
}

impl LoadedChain {
    pub(crate) async fn load<C: ConnectionTrait>(
        conn: &C,
        approval_id: Uuid,
    ) -> Result<Self, AppError> {
        let row = approvals::Entity::find_by_id(approval_id)
            .one(conn)
            .await
            .map_err(sql_err)?
            .ok_or(ApprovalError::StepNotFound(approval_id))?;
        let target = row.target()?;
        let document = Document::load(conn, target).await?;
        let rows = chain_rows(conn, target).await?;
        Ok(Self {
            row,
            document,
            rows,
        })
    }
}

/// Column of `approvals` that points at the target's table.
fn target_filter(target: ApprovalTarget) -> sea_orm::Condition {
    let cond = sea_orm::Condition::all();
    match target {
        ApprovalTarget::TravelRequest(id) => cond.add(approvals::Column::TravelRequestId.eq(id)),
        ApprovalTarget::Claim(id) => cond.add(approvals::Column::ClaimId.eq(id)),
    }
}

/// Every approval row of a document, in level order.
pub(crate) async fn chain_rows<C: ConnectionTrait>(
    conn: &C,
    target: ApprovalTarget,
) -> Result<Vec<approvals::Model>, AppError> {
    let mut rows = approvals::Entity::find()
        .filter(target_filter(target))
        .all(conn)
        .await
        .map_err(sql_err)?;
    rows.sort_by_key(|r| ApprovalLevel::from(r.level));
    Ok(rows)
}

/// Prepares the chain for a document entering review and queues a
/// notification for the first approver.
///
/// A fresh submission gets one row per level from the submitter's
/// supervisor chain. A resubmission after revision reuses the existing
/// rows, which the revision already reset to pending.
pub(crate) async fn open_chain<C: ConnectionTrait>(
    conn: &C,
    target: ApprovalTarget,
    submitter_id: Uuid,
    number: &str,
) -> Result<Uuid, AppError> {
    let mut rows = chain_rows(conn, target).await?;

    if rows.is_empty() {
        let plan = plan_chain(submitter_id, &active_forest(conn).await?)?;
        let (travel_request_id, claim_id) = target.into_parts();
        let now = Utc::now().into();
        for step in plan {
            let row = approvals::ActiveModel {
                id: Set(Uuid::now_v7()),
                travel_request_id: Set(travel_request_id),
                claim_id: Set(claim_id),
                level: Set(step.level.into()),
                approver_id: Set(step.approver_id),
                status: Set(ApprovalStatus::Pending),
                comments: Set(None),
                rejection_reason: Set(None),
                approved_at: Set(None),
                rejected_at: Set(None),
                version: Set(0),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(conn)
            .await
            .map_err(sql_err)?;
            rows.push(row);
        }
    }

    let first = rows
        .iter()
        .find(|r| r.status == ApprovalStatus::Pending)
        .ok_or(ApprovalError::NoApproverAvailable)?;
    queue_notification(
        conn,
        NotificationDraft::approval_required(
            first.approver_id,
            target.kind(),
            target.id(),
            number,
            first.level.into(),
        ),
    )
    .await
}

/// Result of an approval transition.
#[derive(Debug, Clone, Serialize)]
pub struct ApprovalDecision {
    /// The acted-on row after the transition.
    pub approval: approvals::Model,
    /// The document's status after the transition.
    pub document_status: DocumentStatus,
    /// True when the chain finished with this approval.
    pub chain_completed: bool,
}

/// An approval row waiting for its approver, with the document it belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct PendingApproval {
    /// The row.
    pub approval: approvals::Model,
    /// The document.
    pub target: ApprovalTarget,
    /// Document number.
    pub document_number: String,
    /// Who submitted the document.
    pub submitter_id: Uuid,
    /// Document status.
    pub document_status: DocumentStatus,
    /// Claim amount or travel budget.
    pub amount: Decimal,
}

/// The full chain of one document.
#[derive(Debug, Clone, Serialize)]
pub struct ChainView {
    /// The document.
    pub target: ApprovalTarget,
    /// Document number.
    pub document_number: String,
    /// Document status.
    pub document_status: DocumentStatus,
    /// Rows in level order.
    pub steps: Vec<approvals::Model>,
}

/// Approval repository.
#[derive(Debug, Clone)]
pub struct ApprovalRepository {
    db: DatabaseConnection,
    notifier: Notifier,
}

impl ApprovalRepository {
    /// Creates a new approval repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, notifier: Notifier) -> Self {
        Self { db, notifier }
    }

    /// Approves a row.
    ///
    /// # Errors
    ///
    /// `Forbidden` for someone other than the row's approver, `BadRequest`
    /// when the row or document is not actionable, `Conflict` when another
    /// transition on the same chain committed first.
    pub async fn approve(
        &self,
        actor: Actor,
        approval_id: Uuid,
        comments: Option<String>,
    ) -> Result<ApprovalDecision, AppError> {
        self.transition(actor, approval_id, |chain| {
            chain.approve(approval_id, actor.user_id, comments)
        })
        .await
    }

    /// Rejects the document at a row.
    pub async fn reject(
        &self,
        actor: Actor,
        approval_id: Uuid,
        reason: &str,
    ) -> Result<ApprovalDecision, AppError> {
        self.transition(actor, approval_id, |chain| {
            chain.reject(approval_id, actor.user_id, reason)
        })
        .await
    }

    /// Sends the document back to its submitter.
    pub async fn request_revision(
        &self,
        actor: Actor,
        approval_id: Uuid,
        comments: &str,
    ) -> Result<ApprovalDecision, AppError> {
        self.transition(actor, approval_id, |chain| {
            chain.request_revision(approval_id, actor.user_id, comments)
        })
        .await
    }

    async fn transition<F>(
        &self,
        actor: Actor,
        approval_id: Uuid,
        apply: F,
    ) -> Result<ApprovalDecision, AppError>
    where
        F: FnOnce(&mut ApprovalChain) -> Result<TransitionOutcome, ApprovalError>,
    {
        let txn = self.db.begin().await.map_err(sql_err)?;
        let loaded = LoadedChain::load(&txn, approval_id).await?;
        self.commit_transition(txn, actor, loaded, apply).await
    }

    /// Applies a transition to a chain read earlier and stores the result.
    ///
    /// Every write is checked against the versions in `loaded`.
    pub(crate) async fn commit_transition<F>(
        &self,
        txn: DatabaseTransaction,
        actor: Actor,
        loaded: LoadedChain,
        apply: F,
    ) -> Result<ApprovalDecision, AppError>
    where
        F: FnOnce(&mut ApprovalChain) -> Result<TransitionOutcome, ApprovalError>,
    {
        let LoadedChain {
            row,
            document,
            rows,
        } = loaded;
        let approval_id = row.id;
        let target = row.target()?;

        let mut chain = ApprovalChain::new(
            target,
            document.status(),
            rows.iter().map(approvals::Model::to_step).collect(),
        );
        let outcome = match apply(&mut chain) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(%approval_id, actor_id = %actor.user_id, error = %e, "Approval transition rejected");
                return Err(e.into());
            }
        };

        let now = Utc::now().into();
        for changed in &outcome.changed_steps {
            let (Some(stored), Some(step)) = (
                rows.iter().find(|r| r.id == *changed),
                chain.step(*changed),
            ) else {
                continue;
            };
            let result = approvals::Entity::update_many()
                .set(approvals::ActiveModel {
                    status: Set(step.status.into()),
                    comments: Set(step.comments.clone()),
                    rejection_reason: Set(step.rejection_reason.clone()),
                    approved_at: Set(step.approved_at.map(Into::into)),
                    rejected_at: Set(step.rejected_at.map(Into::into)),
                    version: Set(stored.version + 1),
                    updated_at: Set(now),
                    ..Default::default()
                })
                .filter(approvals::Column::Id.eq(stored.id))
                .filter(approvals::Column::Version.eq(stored.version))
                .exec(&txn)
                .await
                .map_err(sql_err)?;
            if result.rows_affected == 0 {
                warn!(%approval_id, row = %stored.id, "Approval row changed concurrently");
                return Err(ApprovalError::ConcurrentModification.into());
            }
        }
        document.save_status(&txn, outcome.parent_status).await?;

        let (action, draft) = notification_for(&document, &chain, &outcome, &row);
        let mut entry = AuditEntry::new(
            Some(actor.user_id),
            action,
            document.entity_type(),
            target.id(),
        )
        .with("approval_id", approval_id)
        .with("level", outcome.level)
        .with_transition(outcome.previous_parent_status, outcome.parent_status);
        if let Some(step) = chain.step(approval_id) {
            if let Some(reason) = &step.rejection_reason
                && outcome.action == ApprovalAction::Reject
            {
                entry = entry.with("reason", reason);
            }
            if let Some(comments) = &step.comments {
                entry = entry.with("comments", comments);
            }
        }
        write_audit(&txn, entry).await?;

        let notification = match draft {
            Some(draft) => Some(queue_notification(&txn, draft).await?),
            None => None,
        };

        let approval = approvals::Entity::find_by_id(approval_id)
            .one(&txn)
            .await
            .map_err(sql_err)?
            .ok_or(ApprovalError::StepNotFound(approval_id))?;
        txn.commit().await.map_err(sql_err)?;

        info!(
            %approval_id,
            document_id = %target.id(),
            action = ?outcome.action,
            status = %outcome.parent_status,
            "Approval transition applied"
        );
        if let Some(id) = notification {
            self.notifier.deliver(&[id]).await;
        }

        Ok(ApprovalDecision {
            approval,
            document_status: outcome.parent_status,
            chain_completed: outcome.completed_chain(),
        })
    }

    /// Rows the user can act on right now: pending, every lower level
    /// approved, document in review.
    pub async fn pending_for(&self, approver_id: Uuid) -> Result<Vec<PendingApproval>, AppError> {
        actionable_for(&self.db, approver_id).await
    }

    /// Number of rows the user can act on right now.
    pub async fn pending_count(&self, approver_id: Uuid) -> Result<u64, AppError> {
        let pending = self.pending_for(approver_id).await?;
        Ok(u64::try_from(pending.len()).unwrap_or(u64::MAX))
    }

    /// Decisions the user has taken, newest first, from the audit trail.
    ///
    /// Rows reset by a later rejection or revision keep their history here.
    pub async fn history(
        &self,
        approver_id: Uuid,
        page: PageRequest,
    ) -> Result<PageResponse<audit_logs::Model>, AppError> {
        let page = page.normalized();
        let paginator = audit_logs::Entity::find()
            .filter(audit_logs::Column::ActorId.eq(approver_id))
            .filter(audit_logs::Column::Action.is_in([
                sea_orm_active_enums::AuditAction::Approve,
                sea_orm_active_enums::AuditAction::Reject,
                sea_orm_active_enums::AuditAction::RequestRevision,
            ]))
            .filter(audit_logs::Column::EntityType.is_in([
                sea_orm_active_enums::EntityType::TravelRequest,
                sea_orm_active_enums::EntityType::Claim,
            ]))
            .order_by_desc(audit_logs::Column::CreatedAt)
            .order_by_desc(audit_logs::Column::Id)
            .paginate(&self.db, page.limit());
        let total = paginator.num_items().await.map_err(sql_err)?;
        let rows = paginator
            .fetch_page(u64::from(page.page - 1))
            .await
            .map_err(sql_err)?;
        Ok(PageResponse::new(rows, page, total))
    }

    /// The chain of one document.
    ///
    /// # Errors
    ///
    /// `Forbidden` unless the caller submitted the document, is one of its
    /// approvers, or is an elevated reader.
    pub async fn chain(&self, actor: Actor, target: ApprovalTarget) -> Result<ChainView, AppError> {
        let document = Document::load(&self.db, target).await?;
        let steps = chain_rows(&self.db, target).await?;
        let approvers: Vec<Uuid> = steps.iter().map(|s| s.approver_id).collect();

        if !actor.can_read(document.submitter_id(), &approvers) {
            return Err(AccessError::NotVisible {
                entity: entity_label(target.kind()),
            }
            .into());
        }

        Ok(ChainView {
            target,
            document_number: document.number().to_string(),
            document_status: document.status(),
            steps,
        })
    }
}

const fn entity_label(kind: TargetKind) -> &'static str {
    match kind {
        TargetKind::TravelRequest => "travel request",
        TargetKind::Claim => "claim",
    }
}

fn notification_for(
    document: &Document,
    chain: &ApprovalChain,
    outcome: &TransitionOutcome,
    acted_row: &approvals::Model,
) -> (AuditAction, Option<NotificationDraft>) {
    let target = document.target();
    let submitter = document.submitter_id();
    let number = document.number();
    let step = chain.step(acted_row.id);

    match outcome.action {
        ApprovalAction::Approve => {
            let draft = if outcome.completed_chain() {
                Some(NotificationDraft::approved(submitter, target.kind(), target.id(), number))
            } else {
                chain.next_pending().map(|next| {
                    NotificationDraft::approval_required(
                        next.approver_id,
                        target.kind(),
                        target.id(),
                        number,
                        next.level,
                    )
                })
            };
            (AuditAction::Approve, draft)
        }
        ApprovalAction::Reject => {
            let reason = step
                .and_then(|s| s.rejection_reason.as_deref())
                .unwrap_or_default();
            (
                AuditAction::Reject,
                Some(NotificationDraft::rejected(
                    submitter,
                    target.kind(),
                    target.id(),
                    number,
                    reason,
                )),
            )
        }
        ApprovalAction::RequestRevision => {
            let comments = step.and_then(|s| s.comments.as_deref()).unwrap_or_default();
            (
                AuditAction::RequestRevision,
                Some(NotificationDraft::revision_requested(
                    submitter,
                    target.kind(),
                    target.id(),
                    number,
                    comments,
                )),
            )
        }
    }
}

/// Pending rows held by `approver_id` on documents still in review,
/// whether or not their turn has come.
pub(crate) async fn pending_held_by<C: ConnectionTrait>(
    conn: &C,
    approver_id: Uuid,
) -> Result<u64, AppError> {
    let rows = approvals::Entity::find()
        .filter(approvals::Column::ApproverId.eq(approver_id))
        .filter(approvals::Column::Status.eq(ApprovalStatus::Pending))
        .all(conn)
        .await
        .map_err(sql_err)?;

    let mut held = 0;
    for row in rows {
        let document = Document::load(conn, row.target()?).await?;
        if document.status().is_in_review() {
            held += 1;
        }
    }
    Ok(held)
}

/// Approval rows `approver_id` can decide now.
pub(crate) async fn actionable_for<C: ConnectionTrait>(
    conn: &C,
    approver_id: Uuid,
) -> Result<Vec<PendingApproval>, AppError> {
    let rows = approvals::Entity::find()
        .filter(approvals::Column::ApproverId.eq(approver_id))
        .filter(approvals::Column::Status.eq(ApprovalStatus::Pending))
        .order_by_asc(approvals::Column::CreatedAt)
        .all(conn)
        .await
        .map_err(sql_err)?;

    let mut pending = Vec::new();
    for row in rows {
        let target = row.target()?;
        let document = Document::load(conn, target).await?;
        let status = document.status();
        if !status.is_in_review() {
            continue;
        }
        let chain = ApprovalChain::new(
            target,
            status,
            chain_rows(conn, target)
                .await?
                .iter()
                .map(approvals::Model::to_step)
                .collect(),
        );
        if !chain.is_actionable(row.id) {
            continue;
        }
        pending.push(PendingApproval {
            target,
            document_number: document.number().to_string(),
            submitter_id: document.submitter_id(),
            document_status: status,
            amount: document.amount(),
            approval: row,
        });
    }
    Ok(pending)
}
