//! Sales bailout (cash advance) workflow.
//!
//! # Modules
//!
//! - `types` - Bailout status and transition actions
//! - `error` - Bailout-specific error types
//! - `service` - State transition logic

/// Prefix of bailout numbers.
pub const BAILOUT_NUMBER_PREFIX: &str = "BO";

pub mod error;
pub mod service;
pub mod types;

pub use error::BailoutError;
pub use service::BailoutService;
pub use types::{BailoutAction, BailoutStatus};
