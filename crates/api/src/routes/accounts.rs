//! Chart of accounts routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;
use wayfare_core::access::ProcedureTier;
use wayfare_core::account::AccountType;
use wayfare_core::hierarchy::TreeNode;
use wayfare_db::entities::chart_of_accounts;
use wayfare_db::repositories::{AccountFilter, CreateAccountInput, UpdateAccountInput};

use crate::extractors::{ValidatedJson, nullable};
use crate::middleware::AuthUser;
use crate::{ApiResult, AppState};

/// Creates the chart of accounts routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/chart-of-accounts", get(list_accounts).post(create_account))
        .route("/chart-of-accounts/tree", get(account_tree))
        .route(
            "/chart-of-accounts/{id}",
            get(get_account).put(update_account).delete(delete_account),
        )
}

/// Query parameters for listing accounts.
#[derive(Debug, Deserialize)]
pub struct ListAccountsQuery {
    /// Filter by account type.
    #[serde(rename = "type")]
    pub account_type: Option<AccountType>,
    /// Filter by active status.
    pub active: Option<bool>,
}

/// Request body for creating an account.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAccountRequest {
    /// Account code, unique.
    #[validate(length(min = 1, max = 20))]
    pub code: String,
    /// Account name.
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    /// Account type.
    #[serde(rename = "type")]
    pub account_type: AccountType,
    /// Parent account of the same type.
    pub parent_id: Option<Uuid>,
    /// Account description.
    pub description: Option<String>,
    /// Whether claims may be booked on it (default: true).
    pub is_active: Option<bool>,
}

/// Request body for updating an account.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAccountRequest {
    /// Account code.
    #[validate(length(min = 1, max = 20))]
    pub code: Option<String>,
    /// Account name.
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    /// Account type (only while it has no children).
    #[serde(rename = "type")]
    pub account_type: Option<AccountType>,
    /// Parent; `null` makes it a root.
    #[serde(default, deserialize_with = "nullable")]
    pub parent_id: Option<Option<Uuid>>,
    /// Description; `null` clears it.
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    /// Whether the account is active.
    pub is_active: Option<bool>,
}

/// GET `/chart-of-accounts` - List accounts by code.
async fn list_accounts(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<ListAccountsQuery>,
) -> ApiResult<Json<Vec<chart_of_accounts::Model>>> {
    let filter = AccountFilter {
        account_type: query.account_type,
        is_active: query.active,
    };
    Ok(Json(state.accounts().list(filter).await?))
}

/// GET `/chart-of-accounts/tree` - Accounts nested under their parents.
async fn account_tree(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> ApiResult<Json<Vec<TreeNode<chart_of_accounts::Model>>>> {
    Ok(Json(state.accounts().tree().await?))
}

/// GET `/chart-of-accounts/{id}`
async fn get_account(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<chart_of_accounts::Model>> {
    Ok(Json(state.accounts().find_by_id(id).await?))
}

/// POST `/chart-of-accounts` - Create an account.
async fn create_account(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateAccountRequest>,
) -> ApiResult<impl IntoResponse> {
    auth.require(ProcedureTier::Finance)?;
    let account = state
        .accounts()
        .create(
            auth.actor(),
            CreateAccountInput {
                code: payload.code,
                name: payload.name,
                account_type: payload.account_type,
                parent_id: payload.parent_id,
                description: payload.description,
                is_active: payload.is_active.unwrap_or(true),
            },
        )
        .await?;

    info!(account_id = %account.id, code = %account.code, "Account created via API");
    Ok((StatusCode::CREATED, Json(account)))
}

/// PUT `/chart-of-accounts/{id}` - Update an account.
async fn update_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateAccountRequest>,
) -> ApiResult<Json<chart_of_accounts::Model>> {
    auth.require(ProcedureTier::Finance)?;
    let account = state
        .accounts()
        .update(
            auth.actor(),
            id,
            UpdateAccountInput {
                code: payload.code,
                name: payload.name,
                account_type: payload.account_type,
                parent_id: payload.parent_id,
                description: payload.description,
                is_active: payload.is_active,
            },
        )
        .await?;
    Ok(Json(account))
}

/// DELETE `/chart-of-accounts/{id}` - Delete an unused account.
async fn delete_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    auth.require(ProcedureTier::Finance)?;
    state.accounts().delete(auth.actor(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
