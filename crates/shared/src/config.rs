//! Application configuration management.

use serde::Deserialize;
use uuid::Uuid;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// Service-account authentication.
    #[serde(default)]
    pub auth: AuthSettings,
    /// Notification delivery configuration.
    #[serde(default)]
    pub notifications: NotificationConfig,
    /// Attachment upload limits.
    #[serde(default)]
    pub uploads: UploadConfig,
    /// Log output configuration.
    #[serde(default)]
    pub log: LogConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT configuration as read from config files.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    28_800 // 8 hours
}

/// Service-account bearer token settings.
///
/// When `service_token` is set, a request carrying it as a bearer token is
/// treated as an ADMIN session for `service_user_id`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthSettings {
    /// Static bearer token for service accounts.
    pub service_token: Option<String>,
    /// User the synthetic session acts as.
    pub service_user_id: Option<Uuid>,
}

/// Notification delivery configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationConfig {
    /// SMTP settings. Without them notifications are only logged.
    pub smtp: Option<SmtpConfig>,
}

/// SMTP transport settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    /// SMTP relay host.
    pub host: String,
    /// SMTP port.
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    /// SMTP username.
    pub username: String,
    /// SMTP password.
    pub password: String,
    /// Sender address.
    pub from_email: String,
    /// Sender display name.
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from_name() -> String {
    "Wayfare".to_string()
}

/// Attachment upload limits.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Largest accepted attachment in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_file_size_bytes: i64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_max_upload_bytes() -> i64 {
    10 * 1024 * 1024
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Log output configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogConfig {
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones overriding earlier ones:
    /// `config/default`, `config/{RUN_MODE}`, then `WAYFARE__*` variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("WAYFARE").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("WAYFARE__SERVER__PORT", Some("9090")),
                ("WAYFARE__DATABASE__URL", Some("postgres://localhost/wayfare")),
                ("WAYFARE__JWT__SECRET", Some("secret")),
                ("RUN_MODE", Some("config-test-nonexistent")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.server.port, 9090);
                assert_eq!(config.server.host, "0.0.0.0");
                assert_eq!(config.database.url, "postgres://localhost/wayfare");
                assert_eq!(config.database.max_connections, 10);
                assert_eq!(config.jwt.access_token_expiry_secs, 28_800);
                assert!(config.auth.service_token.is_none());
                assert!(config.notifications.smtp.is_none());
                assert_eq!(config.uploads.max_file_size_bytes, 10 * 1024 * 1024);
                assert_eq!(config.log.format, LogFormat::Pretty);
            },
        );
    }

    #[test]
    fn test_missing_database_url_fails() {
        temp_env::with_vars(
            [
                ("WAYFARE__JWT__SECRET", Some("secret")),
                ("WAYFARE__DATABASE__URL", None),
                ("RUN_MODE", Some("config-test-nonexistent")),
            ],
            || {
                assert!(AppConfig::load().is_err());
            },
        );
    }
}
