//! Authentication middleware for protected routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};
use uuid::Uuid;
use wayfare_core::access::{AccessError, Actor, ProcedureTier, Role};
use wayfare_shared::{AppError, Claims, JwtError};

use crate::AppState;
use crate::error::ApiError;

/// Cookie carrying the same JWT as the bearer header.
pub const SESSION_COOKIE: &str = "wayfare_session";

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Bearer header first, then the session cookie.
fn find_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer_token)
    {
        return Some(token.to_string());
    }
    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
}

/// Compares in time independent of where the inputs first differ.
fn tokens_match(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Role a session acts with.
///
/// Service sessions keep their synthetic role. User sessions must still
/// belong to an active user and take the role stored now, not the one
/// in the token.
async fn session_role(state: &AppState, claims: &Claims) -> Result<Role, AppError> {
    let Some(claimed) = Role::parse(&claims.role) else {
        warn!(user_id = %claims.sub, role = %claims.role, "Session carries an unknown role");
        return Err(AccessError::UnknownRole(claims.role.clone()).into());
    };
    if claims.service {
        return Ok(claimed);
    }

    let Some(user) = state.users().find_active_by_id(claims.sub).await? else {
        warn!(user_id = %claims.sub, "Session for a deleted or unknown user");
        return Err(AppError::Unauthorized(
            "User no longer has access".to_string(),
        ));
    };
    let role = Role::from(user.role);
    if role != claimed {
        debug!(user_id = %claims.sub, token_role = %claimed, %role, "Role changed since sign-in");
    }
    Ok(role)
}

/// Resolves a token to claims.
///
/// The configured service token maps to a synthetic ADMIN session for the
/// configured service user; anything else must be a valid JWT.
fn authenticate(state: &AppState, token: &str) -> Result<Claims, AppError> {
    if let Some(service_token) = state.auth.service_token.as_deref()
        && !service_token.is_empty()
        && tokens_match(token, service_token)
    {
        let user_id = state.auth.service_user_id.ok_or_else(|| {
            warn!("Service token used but no service user is configured");
            AppError::Unauthorized("Service token is not bound to a user".to_string())
        })?;
        return Ok(Claims::service_account(user_id));
    }

    state.jwt_service.validate_token(token).map_err(|e| match e {
        JwtError::Expired => AppError::Unauthorized("Token has expired".to_string()),
        _ => AppError::Unauthorized("Invalid or malformed token".to_string()),
    })
}

/// Authentication middleware.
///
/// This middleware:
/// 1. Takes the token from the Authorization header or the session cookie
/// 2. Resolves it to claims (service token or JWT)
/// 3. Checks the user is still active and takes their current role
/// 4. Stores the authenticated user in request extensions for handlers
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = find_token(request.headers()) else {
        return ApiError(AppError::Unauthorized(
            "Authorization header with Bearer token or session cookie is required".to_string(),
        ))
        .into_response();
    };

    let claims = match authenticate(&state, &token) {
        Ok(claims) => claims,
        Err(e) => return ApiError(e).into_response(),
    };

    let role = match session_role(&state, &claims).await {
        Ok(role) => role,
        Err(e) => return ApiError(e).into_response(),
    };

    debug!(user_id = %claims.sub, %role, service = claims.service, "Request authenticated");
    let actor = Actor::new(claims.sub, role);
    request.extensions_mut().insert(AuthUser { claims, actor });
    next.run(request).await
}

/// Extractor for the authenticated user.
///
/// ```ignore
/// async fn handler(auth: AuthUser) -> ApiResult<impl IntoResponse> {
///     auth.require(ProcedureTier::Finance)?;
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    claims: Claims,
    actor: Actor,
}

impl AuthUser {
    /// Returns the user ID.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.actor.user_id
    }

    /// Returns the user's role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.actor.role
    }

    /// Returns the actor handed to business rules.
    #[must_use]
    pub const fn actor(&self) -> Actor {
        self.actor
    }

    /// True for service-token sessions.
    #[must_use]
    pub const fn is_service(&self) -> bool {
        self.claims.service
    }

    /// Returns the inner claims.
    #[must_use]
    pub const fn claims(&self) -> &Claims {
        &self.claims
    }

    /// Fails with `FORBIDDEN` below the tier.
    pub fn require(&self, tier: ProcedureTier) -> Result<(), ApiError> {
        self.actor.require(tier).map_err(|e| {
            warn!(user_id = %self.actor.user_id, role = %self.actor.role, tier = tier.label(), "Tier check failed");
            ApiError::from(e)
        })
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| ApiError(AppError::Unauthorized("Authentication required".to_string())))
    }
}
