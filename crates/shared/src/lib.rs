//! Shared types, errors, and configuration for Wayfare.
//!
//! This crate provides common types used across all other crates:
//! - Pagination types for list endpoints
//! - Application-wide error types
//! - Configuration management
//! - JWT claims and token service
//! - Notification delivery adapters (SMTP and log)

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;
pub mod notify;
pub mod types;

#[cfg(test)]
mod jwt_tests;

pub use auth::Claims;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use jwt::{JwtConfig, JwtError, JwtService};
pub use notify::{DeliveryError, EmailSender, LogSender, NotificationSender, OutboundMessage};
pub use types::{PageMeta, PageRequest, PageResponse};
