//! Travel request routes.

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
use wayfare_core::document::DocumentStatus;
use wayfare_core::travel::TravelType;
use wayfare_db::entities::travel_requests;
use wayfare_db::repositories::{
    CreateTravelRequestInput, TravelRequestFilter, UpdateTravelRequestInput,
};
use wayfare_shared::{PageRequest, PageResponse};

use crate::extractors::{ValidatedJson, nullable};
use crate::middleware::AuthUser;
use crate::{ApiResult, AppState};

/// Creates the travel request routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/travel-requests",
            get(list_travel_requests).post(create_travel_request),
        )
        .route(
            "/travel-requests/{id}",
            get(get_travel_request)
                .put(update_travel_request)
                .delete(delete_travel_request),
        )
        .route("/travel-requests/{id}/submit", post(submit_travel_request))
        .route("/travel-requests/{id}/close", post(close_travel_request))
}

/// Query parameters for listing travel requests.
#[derive(Debug, Deserialize)]
pub struct ListTravelRequestsQuery {
    /// Filter by status.
    pub status: Option<DocumentStatus>,
    /// Filter by requester.
    pub requester_id: Option<Uuid>,
}

/// Request body for creating a travel request.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTravelRequestRequest {
    /// Why the trip is needed.
    #[validate(length(min = 1, max = 1000))]
    pub purpose: String,
    /// Where to.
    #[validate(length(min = 1, max = 200))]
    pub destination: String,
    /// Domestic or international.
    pub travel_type: TravelType,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day.
    pub end_date: NaiveDate,
    /// Budget estimate.
    pub estimated_budget: Decimal,
    /// Project to charge.
    #[validate(length(max = 50))]
    pub project_code: Option<String>,
}

/// Request body for updating a travel request.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTravelRequestRequest {
    /// Purpose.
    #[validate(length(min = 1, max = 1000))]
    pub purpose: Option<String>,
    /// Destination.
    #[validate(length(min = 1, max = 200))]
    pub destination: Option<String>,
    /// Travel type.
    pub travel_type: Option<TravelType>,
    /// First day.
    pub start_date: Option<NaiveDate>,
    /// Last day.
    pub end_date: Option<NaiveDate>,
    /// Budget estimate.
    pub estimated_budget: Option<Decimal>,
    /// Project code; `null` clears it.
    #[serde(default, deserialize_with = "nullable")]
    pub project_code: Option<Option<String>>,
}

/// GET `/travel-requests` - Requests the caller may see, newest first.
async fn list_travel_requests(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageRequest>,
    Query(query): Query<ListTravelRequestsQuery>,
) -> ApiResult<Json<PageResponse<travel_requests::Model>>> {
    let filter = TravelRequestFilter {
        status: query.status,
        requester_id: query.requester_id,
    };
    Ok(Json(
        state
            .travel_requests()
            .list(auth.actor(), filter, page)
            .await?,
    ))
}

/// GET `/travel-requests/{id}`
async fn get_travel_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<travel_requests::Model>> {
    Ok(Json(state.travel_requests().get(auth.actor(), id).await?))
}

/// POST `/travel-requests` - Create a draft.
async fn create_travel_request(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateTravelRequestRequest>,
) -> ApiResult<impl IntoResponse> {
    let request = state
        .travel_requests()
        .create(
            auth.actor(),
            CreateTravelRequestInput {
                purpose: payload.purpose,
                destination: payload.destination,
                travel_type: payload.travel_type,
                start_date: payload.start_date,
                end_date: payload.end_date,
                estimated_budget: payload.estimated_budget,
                project_code: payload.project_code,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// PUT `/travel-requests/{id}` - Edit a draft or a request sent back for revision.
async fn update_travel_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateTravelRequestRequest>,
) -> ApiResult<Json<travel_requests::Model>> {
    let request = state
        .travel_requests()
        .update(
            auth.actor(),
            id,
            UpdateTravelRequestInput {
                purpose: payload.purpose,
                destination: payload.destination,
                travel_type: payload.travel_type,
                start_date: payload.start_date,
                end_date: payload.end_date,
                estimated_budget: payload.estimated_budget,
                project_code: payload.project_code,
            },
        )
        .await?;
    Ok(Json(request))
}

/// DELETE `/travel-requests/{id}`
async fn delete_travel_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.travel_requests().delete(auth.actor(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/travel-requests/{id}/submit` - Send into review.
async fn submit_travel_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<travel_requests::Model>> {
    let request = state.travel_requests().submit(auth.actor(), id).await?;
    info!(travel_request_id = %id, "Travel request submitted via API");
    Ok(Json(request))
}

/// POST `/travel-requests/{id}/close` - Close an approved request.
async fn close_travel_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<travel_requests::Model>> {
    Ok(Json(state.travel_requests().close(auth.actor(), id).await?))
}
