//! Dashboard read models and their aggregation.
//!
//! Repositories load the relevant rows as plain facts; everything else is
//! done by the pure functions in `aggregate`.

pub mod aggregate;
pub mod types;

pub use aggregate::{
    claims_by_department, claims_by_month, claims_by_status, count_by_status, month_key,
    total_claimed,
};
pub use types::*;
