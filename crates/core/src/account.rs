//! Chart of accounts rules.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use wayfare_shared::AppError;

/// Top-level account classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    /// Asset.
    Asset,
    /// Liability.
    Liability,
    /// Equity.
    Equity,
    /// Revenue.
    Revenue,
    /// Expense.
    Expense,
}

impl AccountType {
    /// Returns the string representation of the type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asset => "ASSET",
            Self::Liability => "LIABILITY",
            Self::Equity => "EQUITY",
            Self::Revenue => "REVENUE",
            Self::Expense => "EXPENSE",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chart of accounts rule violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountError {
    /// Parent and child must be the same type.
    #[error("Parent account type {parent} does not match {child}")]
    TypeMismatch {
        /// Child type.
        child: AccountType,
        /// Parent type.
        parent: AccountType,
    },

    /// The account still has sub-accounts.
    #[error("Cannot delete account: it has {0} child accounts")]
    HasChildren(u64),

    /// Claims are booked against the account.
    #[error("Cannot delete account: {0} claims reference it")]
    HasClaims(u64),

    /// The type of an account with children cannot change.
    #[error("Cannot change the type of an account that has child accounts")]
    TypeLockedByChildren,
}

impl From<AccountError> for AppError {
    fn from(e: AccountError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

/// Checks that a parent shares the child's type.
pub fn check_parent_type(child: AccountType, parent: AccountType) -> Result<(), AccountError> {
    if child == parent {
        Ok(())
    } else {
        Err(AccountError::TypeMismatch { child, parent })
    }
}

/// Checks that nothing depends on an account before deleting it.
pub fn check_deletable(children: u64, claims: u64) -> Result<(), AccountError> {
    if children > 0 {
        return Err(AccountError::HasChildren(children));
    }
    if claims > 0 {
        return Err(AccountError::HasClaims(claims));
    }
    Ok(())
}
