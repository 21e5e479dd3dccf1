//! Claim attachment routes.
//!
//! Only metadata is recorded here; clients upload the bytes to external
//! storage first and register the resulting URL.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;
use wayfare_core::attachment::NewAttachment;
use wayfare_db::entities::attachments;

use crate::extractors::ValidatedJson;
use crate::middleware::AuthUser;
use crate::{ApiResult, AppState};

/// Creates the attachment routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/claims/{claim_id}/attachments",
            get(list_attachments).post(add_attachment),
        )
        .route(
            "/attachments/{id}",
            get(get_attachment).delete(delete_attachment),
        )
}

/// Request body for registering an uploaded file.
#[derive(Debug, Deserialize, Validate)]
pub struct AddAttachmentRequest {
    /// Original filename.
    #[validate(length(min = 1, max = 255))]
    pub filename: String,
    /// MIME type.
    #[validate(length(min = 1, max = 100))]
    pub mime_type: String,
    /// Size in bytes.
    pub file_size: i64,
    /// Where the file lives.
    #[validate(url)]
    pub storage_url: String,
}

/// GET `/claims/{claim_id}/attachments`
async fn list_attachments(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(claim_id): Path<Uuid>,
) -> ApiResult<Json<Vec<attachments::Model>>> {
    Ok(Json(state.attachments().list(auth.actor(), claim_id).await?))
}

/// POST `/claims/{claim_id}/attachments`
async fn add_attachment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(claim_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<AddAttachmentRequest>,
) -> ApiResult<impl IntoResponse> {
    let attachment = state
        .attachments()
        .add(
            auth.actor(),
            claim_id,
            NewAttachment {
                filename: payload.filename,
                mime_type: payload.mime_type,
                file_size: payload.file_size,
                storage_url: payload.storage_url,
            },
        )
        .await?;

    info!(attachment_id = %attachment.id, claim_id = %claim_id, "Attachment registered via API");
    Ok((StatusCode::CREATED, Json(attachment)))
}

/// GET `/attachments/{id}`
async fn get_attachment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<attachments::Model>> {
    Ok(Json(state.attachments().get(auth.actor(), id).await?))
}

/// DELETE `/attachments/{id}`
async fn delete_attachment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.attachments().delete(auth.actor(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
