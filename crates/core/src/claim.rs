//! Expense claim rules and the entertainment / non-entertainment variants.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use wayfare_shared::AppError;

use crate::document::DocumentStatus;

/// Prefix of claim numbers.
pub const CLAIM_NUMBER_PREFIX: &str = "CL";

/// Discriminant of [`ClaimDetails`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimType {
    /// Hosting guests or officials.
    Entertainment,
    /// Everything else spent on the trip.
    NonEntertainment,
}

impl ClaimType {
    /// Returns the string representation of the type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Entertainment => "ENTERTAINMENT",
            Self::NonEntertainment => "NON_ENTERTAINMENT",
        }
    }
}

impl fmt::Display for ClaimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of entertainment expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntertainmentType {
    /// Meal with guests.
    Meal,
    /// Gift.
    Gift,
    /// Event tickets or hosting.
    Event,
    /// Other.
    Other,
}

/// Category of a non-entertainment expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpenseCategory {
    /// Flights, trains, taxis.
    Transport,
    /// Hotels.
    Accommodation,
    /// Own meals.
    Meal,
    /// Phone and data.
    Communication,
    /// Other.
    Other,
}

/// Fields of an entertainment claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntertainmentDetails {
    /// Kind of entertainment.
    pub entertainment_type: EntertainmentType,
    /// Guest name.
    pub guest_name: String,
    /// Guest company.
    pub guest_company: String,
    /// Guest position.
    pub guest_position: Option<String>,
    /// Whether the guest is a government official.
    #[serde(default)]
    pub is_government_official: bool,
    /// Where it took place.
    pub location: String,
}

/// Fields of a non-entertainment claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonEntertainmentDetails {
    /// Expense category.
    pub expense_category: ExpenseCategory,
    /// Destination, for transport.
    pub destination: Option<String>,
    /// Customer visited.
    pub customer_name: Option<String>,
}

/// Variant-specific claim fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "claim_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimDetails {
    /// Entertainment claim.
    Entertainment(EntertainmentDetails),
    /// Non-entertainment claim.
    NonEntertainment(NonEntertainmentDetails),
}

impl ClaimDetails {
    /// The discriminant.
    #[must_use]
    pub const fn claim_type(&self) -> ClaimType {
        match self {
            Self::Entertainment(_) => ClaimType::Entertainment,
            Self::NonEntertainment(_) => ClaimType::NonEntertainment,
        }
    }

    /// Checks required text fields.
    pub fn validate(&self) -> Result<(), ClaimError> {
        if let Self::Entertainment(e) = self {
            for (field, value) in [
                ("guest_name", &e.guest_name),
                ("guest_company", &e.guest_company),
                ("location", &e.location),
            ] {
                if value.trim().is_empty() {
                    return Err(ClaimError::MissingField(field));
                }
            }
        }
        Ok(())
    }

    /// Flattens into the nullable column set used for storage.
    #[must_use]
    pub fn into_columns(self) -> ClaimColumns {
        match self {
            Self::Entertainment(e) => ClaimColumns {
                claim_type: ClaimType::Entertainment,
                entertainment_type: Some(e.entertainment_type),
                guest_name: Some(e.guest_name),
                guest_company: Some(e.guest_company),
                guest_position: e.guest_position,
                is_government_official: Some(e.is_government_official),
                location: Some(e.location),
                ..ClaimColumns::empty(ClaimType::Entertainment)
            },
            Self::NonEntertainment(n) => ClaimColumns {
                expense_category: Some(n.expense_category),
                destination: n.destination,
                customer_name: n.customer_name,
                ..ClaimColumns::empty(ClaimType::NonEntertainment)
            },
        }
    }

    /// Rebuilds the variant from stored columns.
    ///
    /// # Errors
    ///
    /// Returns `ClaimError::MissingField` when a required column for the
    /// stored type is null.
    pub fn from_columns(columns: ClaimColumns) -> Result<Self, ClaimError> {
        match columns.claim_type {
            ClaimType::Entertainment => Ok(Self::Entertainment(EntertainmentDetails {
                entertainment_type: columns
                    .entertainment_type
                    .ok_or(ClaimError::MissingField("entertainment_type"))?,
                guest_name: columns
                    .guest_name
                    .ok_or(ClaimError::MissingField("guest_name"))?,
                guest_company: columns
                    .guest_company
                    .ok_or(ClaimError::MissingField("guest_company"))?,
                guest_position: columns.guest_position,
                is_government_official: columns.is_government_official.unwrap_or(false),
                location: columns.location.ok_or(ClaimError::MissingField("location"))?,
            })),
            ClaimType::NonEntertainment => Ok(Self::NonEntertainment(NonEntertainmentDetails {
                expense_category: columns
                    .expense_category
                    .ok_or(ClaimError::MissingField("expense_category"))?,
                destination: columns.destination,
                customer_name: columns.customer_name,
            })),
        }
    }
}

/// Variant fields as nullable columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimColumns {
    /// Discriminant.
    pub claim_type: ClaimType,
    /// Entertainment kind.
    pub entertainment_type: Option<EntertainmentType>,
    /// Guest name.
    pub guest_name: Option<String>,
    /// Guest company.
    pub guest_company: Option<String>,
    /// Guest position.
    pub guest_position: Option<String>,
    /// Government official flag.
    pub is_government_official: Option<bool>,
    /// Entertainment location.
    pub location: Option<String>,
    /// Non-entertainment category.
    pub expense_category: Option<ExpenseCategory>,
    /// Destination.
    pub destination: Option<String>,
    /// Customer name.
    pub customer_name: Option<String>,
}

impl ClaimColumns {
    /// All variant columns null.
    #[must_use]
    pub const fn empty(claim_type: ClaimType) -> Self {
        Self {
            claim_type,
            entertainment_type: None,
            guest_name: None,
            guest_company: None,
            guest_position: None,
            is_government_official: None,
            location: None,
            expense_category: None,
            destination: None,
            customer_name: None,
        }
    }
}

/// Claim rule violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimError {
    /// Amount must be greater than zero.
    #[error("Amount must be greater than zero")]
    NonPositiveAmount,

    /// A claim cannot switch between entertainment and non-entertainment.
    #[error("Claim type cannot change from {from} to {to}")]
    TypeChange {
        /// Stored type.
        from: ClaimType,
        /// Requested type.
        to: ClaimType,
    },

    /// A required variant field is empty.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Only approved claims can be paid.
    #[error("Only approved claims can be paid (status {0})")]
    NotPayable(DocumentStatus),
}

impl From<ClaimError> for AppError {
    fn from(e: ClaimError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

/// Checks the claimed amount.
pub fn validate_amount(amount: Decimal) -> Result<(), ClaimError> {
    if amount > Decimal::ZERO {
        Ok(())
    } else {
        Err(ClaimError::NonPositiveAmount)
    }
}

/// Checks that an update keeps the stored variant.
pub fn ensure_same_type(stored: ClaimType, update: &ClaimDetails) -> Result<(), ClaimError> {
    let to = update.claim_type();
    if stored == to {
        Ok(())
    } else {
        Err(ClaimError::TypeChange { from: stored, to })
    }
}

/// Checks that finance may mark a claim paid.
pub fn ensure_payable(status: DocumentStatus) -> Result<(), ClaimError> {
    if status == DocumentStatus::Approved {
        Ok(())
    } else {
        Err(ClaimError::NotPayable(status))
    }
}
