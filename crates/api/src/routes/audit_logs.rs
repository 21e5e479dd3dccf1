//! Audit trail routes. Read-only.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;
use wayfare_core::access::ProcedureTier;
use wayfare_core::audit::{AuditAction, EntityType};
use wayfare_db::entities::audit_logs;
use wayfare_db::repositories::AuditLogFilter;
use wayfare_shared::{AppError, PageRequest, PageResponse};

use crate::middleware::AuthUser;
use crate::{ApiResult, AppState};

/// Creates the audit log routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/audit-logs", get(list_audit_logs))
        .route("/audit-logs/{entity_type}/{entity_id}", get(entity_history))
}

/// Query parameters for searching the trail.
#[derive(Debug, Deserialize)]
pub struct ListAuditLogsQuery {
    /// Kind of record.
    pub entity_type: Option<EntityType>,
    /// One record.
    pub entity_id: Option<Uuid>,
    /// Who acted.
    pub actor_id: Option<Uuid>,
    /// What they did.
    pub action: Option<AuditAction>,
    /// First day, inclusive (YYYY-MM-DD).
    pub from: Option<NaiveDate>,
    /// Last day, inclusive (YYYY-MM-DD).
    pub to: Option<NaiveDate>,
}

/// GET `/audit-logs` - Admins search the trail, newest first.
async fn list_audit_logs(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageRequest>,
    Query(query): Query<ListAuditLogsQuery>,
) -> ApiResult<Json<PageResponse<audit_logs::Model>>> {
    auth.require(ProcedureTier::Admin)?;
    if let (Some(from), Some(to)) = (query.from, query.to)
        && from > to
    {
        return Err(AppError::Validation("from must not be after to".to_string()).into());
    }

    let filter = AuditLogFilter {
        entity_type: query.entity_type,
        entity_id: query.entity_id,
        actor_id: query.actor_id,
        action: query.action,
        from: query.from,
        to: query.to,
    };
    Ok(Json(state.audit_logs().list(filter, page).await?))
}

/// GET `/audit-logs/{entity_type}/{entity_id}` - History of one record, oldest first.
async fn entity_history(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((entity_type, entity_id)): Path<(String, Uuid)>,
) -> ApiResult<Json<Vec<audit_logs::Model>>> {
    auth.require(ProcedureTier::Finance)?;
    let entity_type = EntityType::parse(&entity_type)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown entity type: {entity_type}")))?;
    Ok(Json(
        state
            .audit_logs()
            .entity_history(entity_type, entity_id)
            .await?,
    ))
}
