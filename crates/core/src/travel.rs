//! Travel request rules.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use wayfare_shared::AppError;

use crate::document::DocumentStatus;

/// Prefix of travel request numbers.
pub const REQUEST_NUMBER_PREFIX: &str = "TR";

/// Domestic or international trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TravelType {
    /// Within the country.
    Domestic,
    /// Abroad.
    International,
}

impl TravelType {
    /// Returns the string representation of the type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Domestic => "DOMESTIC",
            Self::International => "INTERNATIONAL",
        }
    }
}

impl fmt::Display for TravelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Travel request rule violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TravelError {
    /// The trip ends before it starts.
    #[error("End date {end} is before start date {start}")]
    EndBeforeStart {
        /// Start date.
        start: NaiveDate,
        /// End date.
        end: NaiveDate,
    },

    /// Budget must not be negative.
    #[error("Estimated budget cannot be negative")]
    NegativeBudget,

    /// Only approved travel requests may be closed.
    #[error("Only approved travel requests can be closed (status {0})")]
    NotClosable(DocumentStatus),

    /// A claim against this request is still in review.
    #[error("Travel request has claims still awaiting approval")]
    ClaimsInReview,

    /// Claims and bailouts need a travel request in a given state.
    #[error("Travel request in status {0} cannot be used here")]
    WrongStatusForUse(DocumentStatus),
}

impl From<TravelError> for AppError {
    fn from(e: TravelError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

/// Checks the date range and budget of a travel request.
pub fn validate_plan(
    start: NaiveDate,
    end: NaiveDate,
    estimated_budget: Decimal,
) -> Result<(), TravelError> {
    if end < start {
        return Err(TravelError::EndBeforeStart { start, end });
    }
    if estimated_budget < Decimal::ZERO {
        return Err(TravelError::NegativeBudget);
    }
    Ok(())
}

/// Checks that an approved travel request can be closed.
///
/// `claims_in_review` counts claims against it that are still running their
/// approval chain.
pub fn ensure_closable(status: DocumentStatus, claims_in_review: u64) -> Result<(), TravelError> {
    if status != DocumentStatus::Approved {
        return Err(TravelError::NotClosable(status));
    }
    if claims_in_review > 0 {
        return Err(TravelError::ClaimsInReview);
    }
    Ok(())
}

/// Claims may only be filed against an approved travel request.
pub fn ensure_claimable(status: DocumentStatus) -> Result<(), TravelError> {
    if status == DocumentStatus::Approved {
        Ok(())
    } else {
        Err(TravelError::WrongStatusForUse(status))
    }
}

/// Bailouts need a travel request that has left draft and was not rejected.
pub fn ensure_bailout_eligible(status: DocumentStatus) -> Result<(), TravelError> {
    match status {
        DocumentStatus::Draft | DocumentStatus::Rejected => {
            Err(TravelError::WrongStatusForUse(status))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_same_day_trip_is_valid() {
        assert!(validate_plan(date("2026-03-01"), date("2026-03-01"), dec!(0)).is_ok());
    }

    #[test]
    fn test_end_before_start() {
        let err = validate_plan(date("2026-03-05"), date("2026-03-01"), dec!(100)).unwrap_err();
        assert!(matches!(err, TravelError::EndBeforeStart { .. }));
    }

    #[test]
    fn test_negative_budget() {
        assert_eq!(
            validate_plan(date("2026-03-01"), date("2026-03-02"), dec!(-0.01)),
            Err(TravelError::NegativeBudget)
        );
    }

    #[test]
    fn test_close_rules() {
        assert!(ensure_closable(DocumentStatus::Approved, 0).is_ok());
        assert_eq!(
            ensure_closable(DocumentStatus::Approved, 2),
            Err(TravelError::ClaimsInReview)
        );
        assert!(ensure_closable(DocumentStatus::Submitted, 0).is_err());
    }

    #[test]
    fn test_use_rules() {
        assert!(ensure_claimable(DocumentStatus::Approved).is_ok());
        assert!(ensure_claimable(DocumentStatus::ApprovedL2).is_err());
        assert!(ensure_bailout_eligible(DocumentStatus::Submitted).is_ok());
        assert!(ensure_bailout_eligible(DocumentStatus::Draft).is_err());
        assert!(ensure_bailout_eligible(DocumentStatus::Rejected).is_err());
    }
}
