//! Dashboard data types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use wayfare_shared::AppError;

use crate::document::DocumentStatus;

/// One claim as seen by the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimFact {
    /// Claim status.
    pub status: DocumentStatus,
    /// Claimed amount.
    pub amount: Decimal,
    /// Department of the submitter at query time.
    pub department_id: Option<Uuid>,
    /// Expense date.
    pub date: NaiveDate,
}

/// Count per status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    /// Status.
    pub status: DocumentStatus,
    /// Number of documents.
    pub count: u64,
}

/// Count and sum per status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTotal {
    /// Status.
    pub status: DocumentStatus,
    /// Number of claims.
    pub count: u64,
    /// Sum of amounts.
    pub total_amount: Decimal,
}

/// Count and sum per department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentTotal {
    /// Department, `None` for users without one.
    pub department_id: Option<Uuid>,
    /// Department name, or "Unassigned".
    pub department_name: String,
    /// Number of claims.
    pub count: u64,
    /// Sum of amounts.
    pub total_amount: Decimal,
}

/// Count and sum per calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthTotal {
    /// `YYYY-MM`.
    pub month: String,
    /// Number of claims.
    pub count: u64,
    /// Sum of amounts.
    pub total_amount: Decimal,
}

/// Personal dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MyDashboard {
    /// My travel requests by status.
    pub travel_requests_by_status: Vec<StatusCount>,
    /// My claims by status.
    pub claims_by_status: Vec<StatusTotal>,
    /// Sum of my claims that entered review and were not rejected.
    pub total_claimed: Decimal,
    /// Approvals waiting for me right now.
    pub pending_approvals: u64,
}

/// Organization-wide dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overview {
    /// Range the totals cover.
    pub range: DateRange,
    /// Claims by status.
    pub claims_by_status: Vec<StatusTotal>,
    /// Claims by department, largest total first.
    pub claims_by_department: Vec<DepartmentTotal>,
    /// Claims per month, every month of the range included.
    pub claims_by_month: Vec<MonthTotal>,
    /// Approval rows currently actionable.
    pub pending_approvals: u64,
    /// Bailouts approved by a director and not yet paid.
    pub bailouts_awaiting_disbursement: u64,
    /// Their total amount.
    pub bailout_amount_awaiting: Decimal,
}

/// Longest accepted range, in days.
pub const MAX_RANGE_DAYS: i64 = 366 * 3;

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First day.
    pub from: NaiveDate,
    /// Last day.
    pub to: NaiveDate,
}

/// Invalid dashboard query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DashboardError {
    /// `from` after `to`.
    #[error("Invalid date range: {from} is after {to}")]
    InvertedRange {
        /// Start.
        from: NaiveDate,
        /// End.
        to: NaiveDate,
    },
    /// Range too long.
    #[error("Date range cannot exceed {MAX_RANGE_DAYS} days")]
    RangeTooLong,
}

impl From<DashboardError> for AppError {
    fn from(e: DashboardError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl DateRange {
    /// Creates a validated range.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, DashboardError> {
        if from > to {
            return Err(DashboardError::InvertedRange { from, to });
        }
        if (to - from).num_days() > MAX_RANGE_DAYS {
            return Err(DashboardError::RangeTooLong);
        }
        Ok(Self { from, to })
    }

    /// True if `date` falls inside the range.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}
