//! Approval chain routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;
use wayfare_core::approval::{ApprovalTarget, TargetKind};
use wayfare_db::entities::audit_logs;
use wayfare_db::repositories::{ApprovalDecision, ChainView, PendingApproval};
use wayfare_shared::{AppError, PageRequest, PageResponse};

use crate::extractors::ValidatedJson;
use crate::middleware::AuthUser;
use crate::{ApiResult, AppState};

/// Creates the approval routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/approvals/pending", get(pending))
        .route("/approvals/history", get(history))
        .route("/approvals/{id}/approve", post(approve))
        .route("/approvals/{id}/reject", post(reject))
        .route("/approvals/{id}/revision", post(request_revision))
        .route("/approvals/chain/{target_type}/{target_id}", get(chain))
}

/// Request body for approving.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ApproveRequest {
    /// Optional note.
    #[validate(length(max = 2000))]
    pub comments: Option<String>,
}

/// Request body for rejecting.
#[derive(Debug, Deserialize, Validate)]
pub struct RejectRequest {
    /// Why, at least ten characters.
    #[validate(length(max = 2000))]
    pub reason: String,
}

/// Request body for sending back.
#[derive(Debug, Deserialize, Validate)]
pub struct RevisionRequest {
    /// What to change, at least ten characters.
    #[validate(length(max = 2000))]
    pub comments: String,
}

/// GET `/approvals/pending` - Rows waiting for the caller.
async fn pending(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<PendingApproval>>> {
    Ok(Json(state.approvals().pending_for(auth.user_id()).await?))
}

/// GET `/approvals/history` - Decisions the caller has taken.
async fn history(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageRequest>,
) -> ApiResult<Json<PageResponse<audit_logs::Model>>> {
    Ok(Json(state.approvals().history(auth.user_id(), page).await?))
}

/// POST `/approvals/{id}/approve` - The body is optional.
async fn approve(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    payload: Option<ValidatedJson<ApproveRequest>>,
) -> ApiResult<Json<ApprovalDecision>> {
    let comments = payload.and_then(|ValidatedJson(body)| body.comments);
    let decision = state.approvals().approve(auth.actor(), id, comments).await?;
    info!(
        approval_id = %id,
        status = %decision.document_status,
        completed = decision.chain_completed,
        "Approval recorded via API"
    );
    Ok(Json(decision))
}

/// POST `/approvals/{id}/reject`
async fn reject(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<RejectRequest>,
) -> ApiResult<Json<ApprovalDecision>> {
    Ok(Json(
        state
            .approvals()
            .reject(auth.actor(), id, &payload.reason)
            .await?,
    ))
}

/// POST `/approvals/{id}/revision`
async fn request_revision(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<RevisionRequest>,
) -> ApiResult<Json<ApprovalDecision>> {
    Ok(Json(
        state
            .approvals()
            .request_revision(auth.actor(), id, &payload.comments)
            .await?,
    ))
}

/// GET `/approvals/chain/{target_type}/{target_id}` - `target_type` is
/// `travel-request` or `claim`.
async fn chain(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((target_type, target_id)): Path<(String, Uuid)>,
) -> ApiResult<Json<ChainView>> {
    let kind = TargetKind::parse(&target_type)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown approval target: {target_type}")))?;
    let target = ApprovalTarget::new(kind, target_id);
    Ok(Json(state.approvals().chain(auth.actor(), target).await?))
}
