//! Bailout (cash advance) routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;
use wayfare_core::bailout::BailoutStatus;
use wayfare_db::entities::bailouts;
use wayfare_db::repositories::{BailoutFilter, CreateBailoutInput, UpdateBailoutInput};
use wayfare_shared::{PageRequest, PageResponse};

use crate::extractors::ValidatedJson;
use crate::middleware::AuthUser;
use crate::{ApiResult, AppState};

/// Creates the bailout routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bailouts", get(list_bailouts).post(create_bailout))
        .route(
            "/bailouts/{id}",
            get(get_bailout).put(update_bailout).delete(delete_bailout),
        )
        .route("/bailouts/{id}/submit", post(submit_bailout))
        .route("/bailouts/{id}/approve-chief", post(approve_chief))
        .route("/bailouts/{id}/approve-director", post(approve_director))
        .route("/bailouts/{id}/reject", post(reject_bailout))
        .route("/bailouts/{id}/disburse", post(disburse_bailout))
}

/// Query parameters for listing bailouts.
#[derive(Debug, Deserialize)]
pub struct ListBailoutsQuery {
    /// Filter by status.
    pub status: Option<BailoutStatus>,
    /// Filter by travel request.
    pub travel_request_id: Option<Uuid>,
}

/// Request body for creating a bailout.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBailoutRequest {
    /// Travel request the advance is for.
    pub travel_request_id: Uuid,
    /// Amount needed.
    pub amount: Decimal,
    /// What it is for.
    #[validate(length(min = 1, max = 1000))]
    pub purpose: String,
}

/// Request body for editing a draft bailout.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateBailoutRequest {
    /// Amount.
    pub amount: Option<Decimal>,
    /// Purpose.
    #[validate(length(min = 1, max = 1000))]
    pub purpose: Option<String>,
}

/// Request body for rejecting a bailout.
#[derive(Debug, Deserialize, Validate)]
pub struct RejectBailoutRequest {
    /// Why, at least ten characters.
    #[validate(length(max = 2000))]
    pub reason: String,
}

/// Request body for disbursing a bailout.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct DisburseBailoutRequest {
    /// Transfer reference.
    #[validate(length(max = 100))]
    pub reference: Option<String>,
}

/// GET `/bailouts` - Bailouts the caller may see, newest first.
async fn list_bailouts(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageRequest>,
    Query(query): Query<ListBailoutsQuery>,
) -> ApiResult<Json<PageResponse<bailouts::Model>>> {
    let filter = BailoutFilter {
        status: query.status,
        travel_request_id: query.travel_request_id,
    };
    Ok(Json(state.bailouts().list(auth.actor(), filter, page).await?))
}

/// GET `/bailouts/{id}`
async fn get_bailout(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<bailouts::Model>> {
    Ok(Json(state.bailouts().get(auth.actor(), id).await?))
}

/// POST `/bailouts` - Open a draft bailout.
async fn create_bailout(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateBailoutRequest>,
) -> ApiResult<impl IntoResponse> {
    let bailout = state
        .bailouts()
        .create(
            auth.actor(),
            CreateBailoutInput {
                travel_request_id: payload.travel_request_id,
                amount: payload.amount,
                purpose: payload.purpose,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(bailout)))
}

/// PUT `/bailouts/{id}` - Edit a draft.
async fn update_bailout(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateBailoutRequest>,
) -> ApiResult<Json<bailouts::Model>> {
    let bailout = state
        .bailouts()
        .update(
            auth.actor(),
            id,
            UpdateBailoutInput {
                amount: payload.amount,
                purpose: payload.purpose,
            },
        )
        .await?;
    Ok(Json(bailout))
}

/// DELETE `/bailouts/{id}`
async fn delete_bailout(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.bailouts().delete(auth.actor(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/bailouts/{id}/submit`
async fn submit_bailout(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<bailouts::Model>> {
    Ok(Json(state.bailouts().submit(auth.actor(), id).await?))
}

/// POST `/bailouts/{id}/approve-chief`
async fn approve_chief(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<bailouts::Model>> {
    Ok(Json(state.bailouts().approve_chief(auth.actor(), id).await?))
}

/// POST `/bailouts/{id}/approve-director`
async fn approve_director(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<bailouts::Model>> {
    Ok(Json(
        state.bailouts().approve_director(auth.actor(), id).await?,
    ))
}

/// POST `/bailouts/{id}/reject`
async fn reject_bailout(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<RejectBailoutRequest>,
) -> ApiResult<Json<bailouts::Model>> {
    Ok(Json(
        state
            .bailouts()
            .reject(auth.actor(), id, &payload.reason)
            .await?,
    ))
}

/// POST `/bailouts/{id}/disburse` - Finance pays out.
async fn disburse_bailout(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<DisburseBailoutRequest>,
) -> ApiResult<Json<bailouts::Model>> {
    let bailout = state
        .bailouts()
        .disburse(auth.actor(), id, payload.reference)
        .await?;
    info!(bailout_id = %id, disbursed_by = %auth.user_id(), "Bailout disbursed via API");
    Ok(Json(bailout))
}
