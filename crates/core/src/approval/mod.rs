//! Multi-level approval chains for travel requests and claims.
//!
//! # Modules
//!
//! - `types` - Levels, row statuses, the target sum type and transition results
//! - `error` - Approval-specific error types
//! - `chain` - The chain state machine
//! - `builder` - Chain construction from the supervisor hierarchy

pub mod builder;
pub mod chain;
pub mod error;
pub mod types;

#[cfg(test)]
mod approval_props;

pub use builder::plan_chain;
pub use chain::ApprovalChain;
pub use error::ApprovalError;
pub use types::{
    ApprovalAction, ApprovalLevel, ApprovalStatus, ApprovalStep, ApprovalTarget, MAX_LEVELS,
    MIN_REASON_LEN, PlannedStep, TargetKind, TransitionOutcome,
};
