//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes under `/api/v1`
//! - Authentication middleware (bearer JWT, session cookie, service token)
//! - Request extractors with validation
//! - JSON error responses

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use wayfare_db::Notifier;
use wayfare_db::repositories::{
    ApprovalRepository, AttachmentRepository, AuditLogRepository, BailoutRepository,
    ChartOfAccountsRepository, ClaimRepository, DashboardRepository, DepartmentRepository,
    NotificationRepository, TravelRequestRepository, UserRepository,
};
use wayfare_shared::config::AuthSettings;
use wayfare_shared::{JwtService, NotificationSender};

pub use error::{ApiError, ApiResult};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
    /// Stores and delivers notifications after commit.
    pub notifier: Notifier,
    /// Service-token settings.
    pub auth: Arc<AuthSettings>,
    /// Attachment size limit in bytes.
    pub max_upload_bytes: i64,
}

impl AppState {
    /// Builds the state from its parts.
    pub fn new(
        db: DatabaseConnection,
        jwt_service: JwtService,
        sender: Arc<dyn NotificationSender>,
        auth: AuthSettings,
        max_upload_bytes: i64,
    ) -> Self {
        let notifier = Notifier::new(db.clone(), sender);
        Self {
            db: Arc::new(db),
            jwt_service: Arc::new(jwt_service),
            notifier,
            auth: Arc::new(auth),
            max_upload_bytes,
        }
    }

    fn conn(&self) -> DatabaseConnection {
        (*self.db).clone()
    }

    pub(crate) fn users(&self) -> UserRepository {
        UserRepository::new(self.conn())
    }

    pub(crate) fn departments(&self) -> DepartmentRepository {
        DepartmentRepository::new(self.conn())
    }

    pub(crate) fn accounts(&self) -> ChartOfAccountsRepository {
        ChartOfAccountsRepository::new(self.conn())
    }

    pub(crate) fn travel_requests(&self) -> TravelRequestRepository {
        TravelRequestRepository::new(self.conn(), self.notifier.clone())
    }

    pub(crate) fn claims(&self) -> ClaimRepository {
        ClaimRepository::new(self.conn(), self.notifier.clone())
    }

    pub(crate) fn attachments(&self) -> AttachmentRepository {
        AttachmentRepository::new(self.conn(), self.max_upload_bytes)
    }

    pub(crate) fn approvals(&self) -> ApprovalRepository {
        ApprovalRepository::new(self.conn(), self.notifier.clone())
    }

    pub(crate) fn bailouts(&self) -> BailoutRepository {
        BailoutRepository::new(self.conn(), self.notifier.clone())
    }

    pub(crate) fn notifications(&self) -> NotificationRepository {
        NotificationRepository::new(self.conn())
    }

    pub(crate) fn audit_logs(&self) -> AuditLogRepository {
        AuditLogRepository::new(self.conn())
    }

    pub(crate) fn dashboard(&self) -> DashboardRepository {
        DashboardRepository::new(self.conn())
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
