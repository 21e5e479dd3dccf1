//! Department routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;
use wayfare_core::access::ProcedureTier;
use wayfare_core::hierarchy::TreeNode;
use wayfare_db::entities::departments;
use wayfare_db::repositories::{CreateDepartmentInput, UpdateDepartmentInput};

use crate::extractors::{ValidatedJson, nullable};
use crate::middleware::AuthUser;
use crate::{ApiResult, AppState};

/// Creates the department routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/departments", get(list_departments).post(create_department))
        .route("/departments/tree", get(department_tree))
        .route(
            "/departments/{id}",
            get(get_department)
                .put(update_department)
                .delete(delete_department),
        )
}

/// Request body for creating a department.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateDepartmentRequest {
    /// Unique short code.
    #[validate(length(min = 1, max = 20))]
    pub code: String,
    /// Name.
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Parent department.
    pub parent_id: Option<Uuid>,
}

/// Request body for updating a department.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateDepartmentRequest {
    /// Code.
    #[validate(length(min = 1, max = 20))]
    pub code: Option<String>,
    /// Name.
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    /// Description; `null` clears it.
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    /// Parent; `null` makes it a root.
    #[serde(default, deserialize_with = "nullable")]
    pub parent_id: Option<Option<Uuid>>,
}

/// GET `/departments` - All departments by code.
async fn list_departments(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> ApiResult<Json<Vec<departments::Model>>> {
    Ok(Json(state.departments().list().await?))
}

/// GET `/departments/tree` - Departments nested under their parents.
async fn department_tree(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> ApiResult<Json<Vec<TreeNode<departments::Model>>>> {
    Ok(Json(state.departments().tree().await?))
}

/// GET `/departments/{id}`
async fn get_department(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<departments::Model>> {
    Ok(Json(state.departments().find_by_id(id).await?))
}

/// POST `/departments`
async fn create_department(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateDepartmentRequest>,
) -> ApiResult<impl IntoResponse> {
    auth.require(ProcedureTier::Admin)?;
    let department = state
        .departments()
        .create(
            auth.actor(),
            CreateDepartmentInput {
                code: payload.code,
                name: payload.name,
                description: payload.description,
                parent_id: payload.parent_id,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(department)))
}

/// PUT `/departments/{id}`
async fn update_department(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateDepartmentRequest>,
) -> ApiResult<Json<departments::Model>> {
    auth.require(ProcedureTier::Admin)?;
    let department = state
        .departments()
        .update(
            auth.actor(),
            id,
            UpdateDepartmentInput {
                code: payload.code,
                name: payload.name,
                description: payload.description,
                parent_id: payload.parent_id,
            },
        )
        .await?;
    Ok(Json(department))
}

/// DELETE `/departments/{id}`
async fn delete_department(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    auth.require(ProcedureTier::Admin)?;
    state.departments().delete(auth.actor(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
