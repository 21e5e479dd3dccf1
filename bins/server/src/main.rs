//! Wayfare API Server
//!
//! Main entry point for the Wayfare backend service.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::StatusCode;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use wayfare_api::{AppState, create_router};
use wayfare_db::connect;
use wayfare_db::migration::{Migrator, MigratorTrait};
use wayfare_shared::config::LogFormat;
use wayfare_shared::{AppConfig, EmailSender, JwtConfig, JwtService, LogSender, NotificationSender};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "wayfare=debug,tower_http=debug".into());
    match config.log.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }

    // Connect to database and bring the schema up to date
    let db = connect(&config.database).await?;
    info!("Connected to database");
    Migrator::up(&db, None).await?;
    info!("Migrations applied");

    let jwt_service = JwtService::new(JwtConfig {
        secret: config.jwt.secret.clone(),
        access_token_expires_minutes: i64::try_from(config.jwt.access_token_expiry_secs / 60)
            .unwrap_or(i64::MAX),
    });

    let sender: Arc<dyn NotificationSender> = match config.notifications.smtp.clone() {
        Some(smtp) => {
            info!(smtp_host = %smtp.host, smtp_port = smtp.port, "Email delivery configured");
            Arc::new(EmailSender::new(smtp))
        }
        None => {
            info!("No SMTP settings, notifications are logged only");
            Arc::new(LogSender)
        }
    };

    if config.auth.service_token.is_some() && config.auth.service_user_id.is_none() {
        tracing::warn!("Service token is set without a service user; it will be refused");
    }

    let state = AppState::new(
        db,
        jwt_service,
        sender,
        config.auth.clone(),
        config.uploads.max_file_size_bytes,
    );

    let app = create_router(state).layer(TimeoutLayer::with_status_code(
        StatusCode::REQUEST_TIMEOUT,
        Duration::from_secs(config.server.request_timeout_secs),
    ));

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
