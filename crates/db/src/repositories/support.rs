//! Helpers shared by every repository.

use chrono::{Datelike, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, SqlErr, sea_query::Query,
};
use tracing::error;
use uuid::Uuid;
use wayfare_core::access::Actor;
use wayfare_core::audit::AuditEntry;
use wayfare_core::document::document_number;
use wayfare_core::notification::{DeliveryStatus, NotificationDraft};
use wayfare_shared::AppError;

use crate::entities::{approvals, audit_logs, notifications, sea_orm_active_enums};

/// Maps a database error to the application taxonomy.
///
/// Unique violations become `DuplicateEntry`, foreign key violations
/// `ForeignKey`, and a missing record `NotFound`. Anything else is logged
/// and reported as a generic database error.
pub fn sql_err(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => AppError::DuplicateEntry(detail),
        Some(SqlErr::ForeignKeyConstraintViolation(detail)) => AppError::ForeignKey(detail),
        _ => match err {
            DbErr::RecordNotFound(what) => AppError::NotFound(what),
            other => {
                error!(error = %other, "Database operation failed");
                AppError::Database(other.to_string())
            }
        },
    }
}

/// `NotFound` for a missing row.
pub(crate) fn not_found(entity: &str, id: Uuid) -> AppError {
    AppError::NotFound(format!("{entity} {id} not found"))
}

/// Appends one audit row.
pub(crate) async fn write_audit<C: ConnectionTrait>(
    conn: &C,
    entry: AuditEntry,
) -> Result<(), AppError> {
    audit_logs::ActiveModel {
        id: Set(Uuid::now_v7()),
        actor_id: Set(entry.actor_id),
        action: Set(entry.action.into()),
        entity_type: Set(entry.entity_type.into()),
        entity_id: Set(entry.entity_id),
        metadata: Set(entry.metadata_value()),
        created_at: Set(entry.occurred_at.into()),
    }
    .insert(conn)
    .await
    .map_err(sql_err)?;
    Ok(())
}

/// Stores a notification as pending delivery and returns its id.
pub(crate) async fn queue_notification<C: ConnectionTrait>(
    conn: &C,
    draft: NotificationDraft,
) -> Result<Uuid, AppError> {
    let id = Uuid::now_v7();
    notifications::ActiveModel {
        id: Set(id),
        recipient_id: Set(draft.recipient_id),
        kind: Set(draft.kind.into()),
        title: Set(draft.title),
        message: Set(draft.message),
        entity_type: Set(draft.entity_type.into()),
        entity_id: Set(draft.entity_id),
        delivery_status: Set(DeliveryStatus::Pending.into()),
        read_at: Set(None),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await
    .map_err(sql_err)?;
    Ok(id)
}

/// Next `PREFIX-YYYY-NNNNN` number for the current year.
///
/// Two writers racing for the same number are caught by the unique index
/// on the column and surface as `DuplicateEntry`.
pub(crate) async fn next_document_number<E, C>(
    conn: &C,
    column: E::Column,
    prefix: &str,
) -> Result<String, AppError>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let year = Utc::now().year();
    let stem = format!("{prefix}-{year}-");

    let last: Option<String> = E::find()
        .select_only()
        .column(column)
        .filter(column.starts_with(&stem))
        .order_by_desc(column)
        .into_tuple()
        .one(conn)
        .await
        .map_err(sql_err)?;

    let sequence = last
        .as_deref()
        .and_then(|n| n.strip_prefix(&stem))
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0)
        + 1;

    Ok(document_number(prefix, year, sequence))
}

/// Document statuses in which the approval chain is running.
pub(crate) fn in_review_statuses() -> [sea_orm_active_enums::DocumentStatus; 6] {
    use sea_orm_active_enums::DocumentStatus as S;
    [
        S::Submitted,
        S::ApprovedL1,
        S::ApprovedL2,
        S::ApprovedL3,
        S::ApprovedL4,
        S::ApprovedL5,
    ]
}

/// Rows an actor may list: their own, those they approve, or everything for
/// elevated readers. `None` means no restriction.
pub(crate) fn visibility<C, F>(actor: Actor, owner: C, id: C, approval_fk: F) -> Option<Condition>
where
    C: ColumnTrait,
    F: ColumnTrait,
{
    if actor.role.is_elevated_reader() {
        return None;
    }
    Some(
        Condition::any().add(owner.eq(actor.user_id)).add(
            id.in_subquery(
                Query::select()
                    .column(approval_fk)
                    .from(approvals::Entity)
                    .and_where(approvals::Column::ApproverId.eq(actor.user_id))
                    .to_owned(),
            ),
        ),
    )
}
