//! Authentication routes for login, logout and the current session.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::{info, warn};
use wayfare_core::access::Role;
use wayfare_core::auth::verify_password;
use wayfare_db::entities::users;
use wayfare_shared::AppError;
use wayfare_shared::auth::{LoginRequest, LoginResponse, SessionUser};

use crate::middleware::{AuthUser, SESSION_COOKIE};
use crate::{ApiResult, AppState};

/// Creates the public auth router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

/// Creates the auth routes that need a session.
pub fn protected_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(me))
}

pub(crate) fn session_user(user: &users::Model) -> SessionUser {
    SessionUser {
        id: user.id,
        employee_id: user.employee_id.clone(),
        email: user.email.clone(),
        name: user.name.clone(),
        role: Role::from(user.role).as_str().to_string(),
        department_id: user.department_id,
        supervisor_id: user.supervisor_id,
    }
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid email or password".to_string())
}

/// POST /auth/login - Authenticate and return a token, also set as the session cookie.
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let Some(user) = state.users().find_active_by_email(&payload.email).await? else {
        info!(email = %payload.email, "Login attempt for unknown or deleted user");
        return Err(invalid_credentials().into());
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "Failed login attempt - invalid password");
        return Err(invalid_credentials().into());
    }

    let session = session_user(&user);
    let access_token = state
        .jwt_service
        .generate_access_token(user.id, &session.role)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let cookie = Cookie::build((SESSION_COOKIE, access_token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);

    info!(user_id = %user.id, role = %session.role, "User logged in");
    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            user: session,
            access_token,
            expires_in: state.jwt_service.access_token_expires_in(),
        }),
    ))
}

/// POST /auth/logout - Clear the session cookie.
async fn logout(jar: CookieJar) -> impl IntoResponse {
    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        StatusCode::NO_CONTENT,
    )
}

/// GET /auth/me - The authenticated user.
async fn me(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<SessionUser>> {
    let user = state.users().find_by_id(auth.user_id()).await?;
    Ok(Json(session_user(&user)))
}
