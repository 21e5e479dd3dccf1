//! Claim routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;
use wayfare_core::claim::ClaimDetails;
use wayfare_core::document::DocumentStatus;
use wayfare_db::repositories::{ClaimFilter, ClaimView, CreateClaimInput, UpdateClaimInput};
use wayfare_shared::{PageRequest, PageResponse};

use crate::extractors::{ValidatedJson, nullable};
use crate::middleware::AuthUser;
use crate::{ApiResult, AppState};

/// Creates the claim routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/claims", get(list_claims).post(create_claim))
        .route(
            "/claims/{id}",
            get(get_claim).put(update_claim).delete(delete_claim),
        )
        .route("/claims/{id}/submit", post(submit_claim))
        .route("/claims/{id}/pay", post(pay_claim))
}

/// Query parameters for listing claims.
#[derive(Debug, Deserialize)]
pub struct ListClaimsQuery {
    /// Filter by status.
    pub status: Option<DocumentStatus>,
    /// Filter by travel request.
    pub travel_request_id: Option<Uuid>,
    /// Filter by submitter.
    pub submitter_id: Option<Uuid>,
}

/// Request body for creating a claim.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateClaimRequest {
    /// Approved travel request owned by the caller.
    pub travel_request_id: Uuid,
    /// Expense date.
    pub date: NaiveDate,
    /// Amount.
    pub amount: Decimal,
    /// What was spent.
    #[validate(length(min = 1, max = 1000))]
    pub description: String,
    /// Notes.
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    /// Account to book on.
    pub chart_of_account_id: Option<Uuid>,
    /// Entertainment or non-entertainment fields, tagged by `claim_type`.
    pub details: ClaimDetails,
}

/// Request body for updating a claim.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateClaimRequest {
    /// Expense date.
    pub date: Option<NaiveDate>,
    /// Amount.
    pub amount: Option<Decimal>,
    /// Description.
    #[validate(length(min = 1, max = 1000))]
    pub description: Option<String>,
    /// Notes; `null` clears them.
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
    /// Account; `null` clears it.
    #[serde(default, deserialize_with = "nullable")]
    pub chart_of_account_id: Option<Option<Uuid>>,
    /// Variant fields, same `claim_type` as stored.
    pub details: Option<ClaimDetails>,
}

/// Request body for paying a claim.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct PayClaimRequest {
    /// Payment reference, e.g. a bank transfer id.
    #[validate(length(max = 100))]
    pub reference: Option<String>,
}

/// GET `/claims` - Claims the caller may see, newest first.
async fn list_claims(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageRequest>,
    Query(query): Query<ListClaimsQuery>,
) -> ApiResult<Json<PageResponse<ClaimView>>> {
    let filter = ClaimFilter {
        status: query.status,
        travel_request_id: query.travel_request_id,
        submitter_id: query.submitter_id,
    };
    Ok(Json(state.claims().list(auth.actor(), filter, page).await?))
}

/// GET `/claims/{id}`
async fn get_claim(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ClaimView>> {
    Ok(Json(state.claims().get(auth.actor(), id).await?))
}

/// POST `/claims` - Create a draft claim.
async fn create_claim(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateClaimRequest>,
) -> ApiResult<impl IntoResponse> {
    let claim = state
        .claims()
        .create(
            auth.actor(),
            CreateClaimInput {
                travel_request_id: payload.travel_request_id,
                date: payload.date,
                amount: payload.amount,
                description: payload.description,
                notes: payload.notes,
                chart_of_account_id: payload.chart_of_account_id,
                details: payload.details,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(claim)))
}

/// PUT `/claims/{id}` - Edit a draft or a claim sent back for revision.
async fn update_claim(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateClaimRequest>,
) -> ApiResult<Json<ClaimView>> {
    let claim = state
        .claims()
        .update(
            auth.actor(),
            id,
            UpdateClaimInput {
                date: payload.date,
                amount: payload.amount,
                description: payload.description,
                notes: payload.notes,
                chart_of_account_id: payload.chart_of_account_id,
                details: payload.details,
            },
        )
        .await?;
    Ok(Json(claim))
}

/// DELETE `/claims/{id}`
async fn delete_claim(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.claims().delete(auth.actor(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/claims/{id}/submit` - Send into review.
async fn submit_claim(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ClaimView>> {
    let claim = state.claims().submit(auth.actor(), id).await?;
    info!(claim_id = %id, "Claim submitted via API");
    Ok(Json(claim))
}

/// POST `/claims/{id}/pay` - Finance marks an approved claim paid.
async fn pay_claim(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<PayClaimRequest>,
) -> ApiResult<Json<ClaimView>> {
    let claim = state
        .claims()
        .mark_paid(auth.actor(), id, payload.reference)
        .await?;
    Ok(Json(claim))
}
