//! User management routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;
use wayfare_core::access::{ProcedureTier, Role};
use wayfare_core::auth::{check_strength, hash_password};
use wayfare_db::entities::users;
use wayfare_db::repositories::{CreateUserInput, UpdateUserInput, UserFilter};
use wayfare_shared::{PageRequest, PageResponse};

use crate::extractors::{ValidatedJson, nullable};
use crate::middleware::AuthUser;
use crate::{ApiResult, AppState};

/// Creates the user routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/users/{id}/supervisor", put(assign_supervisor))
        .route("/users/{id}/reports", get(direct_reports))
}

/// Query parameters for listing users.
#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    /// Filter by role.
    pub role: Option<Role>,
    /// Filter by department.
    pub department_id: Option<Uuid>,
    /// Substring of name, email or employee id.
    pub search: Option<String>,
    /// Include soft-deleted users.
    #[serde(default)]
    pub include_deleted: bool,
}

/// Request body for creating a user.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    /// Employee number.
    #[validate(length(min = 1, max = 32))]
    pub employee_id: String,
    /// Email address.
    #[validate(email)]
    pub email: String,
    /// Display name.
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    /// Initial password.
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    /// Role.
    pub role: Role,
    /// Department.
    pub department_id: Option<Uuid>,
    /// Direct supervisor.
    pub supervisor_id: Option<Uuid>,
    /// Phone number.
    #[validate(length(max = 32))]
    pub phone: Option<String>,
}

/// Request body for updating a user.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    /// Email address.
    #[validate(email)]
    pub email: Option<String>,
    /// Display name.
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    /// Role.
    pub role: Option<Role>,
    /// Department; `null` clears it.
    #[serde(default, deserialize_with = "nullable")]
    pub department_id: Option<Option<Uuid>>,
    /// Phone; `null` clears it.
    #[serde(default, deserialize_with = "nullable")]
    pub phone: Option<Option<String>>,
}

/// Request body for assigning a supervisor.
#[derive(Debug, Deserialize)]
pub struct AssignSupervisorRequest {
    /// New supervisor, or `null` to clear.
    pub supervisor_id: Option<Uuid>,
}

/// GET `/users` - List users.
async fn list_users(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(page): Query<PageRequest>,
    Query(query): Query<ListUsersQuery>,
) -> ApiResult<Json<PageResponse<users::Model>>> {
    let filter = UserFilter {
        role: query.role,
        department_id: query.department_id,
        search: query.search,
        include_deleted: query.include_deleted,
    };
    Ok(Json(state.users().list(filter, page).await?))
}

/// GET `/users/{id}` - Get one user.
async fn get_user(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<users::Model>> {
    Ok(Json(state.users().find_by_id(id).await?))
}

/// POST `/users` - Create a user.
async fn create_user(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    auth.require(ProcedureTier::Admin)?;
    check_strength(&payload.password)?;
    let password_hash = hash_password(&payload.password)?;

    let user = state
        .users()
        .create(
            auth.actor(),
            CreateUserInput {
                employee_id: payload.employee_id,
                email: payload.email,
                name: payload.name,
                password_hash,
                role: payload.role,
                department_id: payload.department_id,
                supervisor_id: payload.supervisor_id,
                phone: payload.phone,
            },
        )
        .await?;

    info!(user_id = %user.id, created_by = %auth.user_id(), "User created via API");
    Ok((StatusCode::CREATED, Json(user)))
}

/// PUT `/users/{id}` - Update a user.
async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<Json<users::Model>> {
    auth.require(ProcedureTier::Admin)?;
    let user = state
        .users()
        .update(
            auth.actor(),
            id,
            UpdateUserInput {
                email: payload.email,
                name: payload.name,
                role: payload.role,
                department_id: payload.department_id,
                phone: payload.phone,
            },
        )
        .await?;
    Ok(Json(user))
}

/// DELETE `/users/{id}` - Soft-delete a user.
async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    auth.require(ProcedureTier::Admin)?;
    state.users().soft_delete(auth.actor(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT `/users/{id}/supervisor` - Set or clear the supervisor.
async fn assign_supervisor(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignSupervisorRequest>,
) -> ApiResult<Json<users::Model>> {
    auth.require(ProcedureTier::Admin)?;
    let user = state
        .users()
        .assign_supervisor(auth.actor(), id, payload.supervisor_id)
        .await?;
    Ok(Json(user))
}

/// GET `/users/{id}/reports` - Active direct reports.
async fn direct_reports(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<users::Model>>> {
    Ok(Json(state.users().direct_reports(id).await?))
}
