//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth::auth_middleware};

pub mod accounts;
pub mod approvals;
pub mod attachments;
pub mod audit_logs;
pub mod auth;
pub mod bailouts;
pub mod claims;
pub mod dashboard;
pub mod departments;
pub mod health;
pub mod notifications;
pub mod travel_requests;
pub mod users;

/// Creates the public API routes.
pub fn api_routes() -> Router<AppState> {
    Router::new().merge(health::routes()).merge(auth::routes())
}

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Protected routes that require authentication
    let protected_routes = Router::new()
        .merge(auth::protected_routes())
        .merge(users::routes())
        .merge(departments::routes())
        .merge(accounts::routes())
        .merge(travel_requests::routes())
        .merge(claims::routes())
        .merge(attachments::routes())
        .merge(approvals::routes())
        .merge(bailouts::routes())
        .merge(notifications::routes())
        .merge(audit_logs::routes())
        .merge(dashboard::routes())
        .layer(middleware::from_fn_with_state(state, auth_middleware));

    api_routes().merge(protected_routes)
}
