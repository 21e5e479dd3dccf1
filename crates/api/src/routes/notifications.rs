//! Notification inbox routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use wayfare_db::entities::notifications;
use wayfare_db::repositories::NotificationFilter;
use wayfare_shared::{PageRequest, PageResponse};

use crate::middleware::AuthUser;
use crate::{ApiResult, AppState};

/// Creates the notification routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/unread-count", get(unread_count))
        .route("/notifications/{id}/read", post(mark_read))
        .route("/notifications/read-all", post(mark_all_read))
}

/// Query parameters for listing notifications.
#[derive(Debug, Deserialize)]
pub struct ListNotificationsQuery {
    /// Only unread ones.
    #[serde(default)]
    pub unread_only: bool,
}

/// Unread counter.
#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    /// Number of unread notifications.
    pub count: u64,
}

/// Result of marking everything read.
#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    /// How many changed.
    pub updated: u64,
}

/// GET `/notifications` - The caller's notifications, newest first.
async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageRequest>,
    Query(query): Query<ListNotificationsQuery>,
) -> ApiResult<Json<PageResponse<notifications::Model>>> {
    let filter = NotificationFilter {
        unread_only: query.unread_only,
    };
    Ok(Json(
        state
            .notifications()
            .list(auth.user_id(), filter, page)
            .await?,
    ))
}

/// GET `/notifications/unread-count`
async fn unread_count(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<UnreadCountResponse>> {
    let count = state.notifications().unread_count(auth.user_id()).await?;
    Ok(Json(UnreadCountResponse { count }))
}

/// POST `/notifications/{id}/read`
async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<notifications::Model>> {
    Ok(Json(
        state.notifications().mark_read(id, auth.user_id()).await?,
    ))
}

/// POST `/notifications/read-all`
async fn mark_all_read(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<MarkAllReadResponse>> {
    let updated = state.notifications().mark_all_read(auth.user_id()).await?;
    Ok(Json(MarkAllReadResponse { updated }))
}
