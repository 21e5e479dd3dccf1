//! Core business rules for Wayfare.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and state machines live here.
//!
//! # Modules
//!
//! - `access` - Roles, procedure tiers and the permission matrix
//! - `account` - Chart of accounts rules
//! - `approval` - Multi-level approval chains
//! - `document` - Travel request / claim status and edit gating
//! - `travel` - Travel request rules
//! - `claim` - Claim rules and the entertainment / non-entertainment variants
//! - `bailout` - Sales cash advance workflow
//! - `hierarchy` - Supervisor, department and account trees
//! - `attachment` - Attachment metadata validation
//! - `audit` - Audit trail events
//! - `notification` - Notification templates
//! - `dashboard` - Dashboard aggregation
//! - `auth` - Password hashing

pub mod access;
pub mod account;
pub mod approval;
pub mod attachment;
pub mod audit;
pub mod auth;
pub mod bailout;
pub mod claim;
pub mod dashboard;
pub mod document;
pub mod hierarchy;
pub mod notification;
pub mod travel;
