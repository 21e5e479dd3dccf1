//! Password hashing with Argon2id.

use argon2::{
    Argon2, PasswordHash,
    password_hash::{PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;
use wayfare_shared::AppError;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Errors that can occur during password operations.
#[derive(Debug, Error)]
pub enum PasswordError {
    /// Failed to hash password.
    #[error("failed to hash password: {0}")]
    HashError(String),

    /// Stored hash is not a PHC string.
    #[error("invalid password hash format")]
    InvalidHash,

    /// Verification failed for a reason other than a mismatch.
    #[error("failed to verify password: {0}")]
    VerifyError(String),

    /// Password does not meet the policy.
    #[error("password must be at least {MIN_PASSWORD_LEN} characters and contain a letter and a digit")]
    TooWeak,
}

impl From<PasswordError> for AppError {
    fn from(e: PasswordError) -> Self {
        match e {
            PasswordError::TooWeak => Self::Validation(e.to_string()),
            PasswordError::HashError(_) | PasswordError::InvalidHash | PasswordError::VerifyError(_) => {
                Self::Internal(e.to_string())
            }
        }
    }
}

/// Hashes a password into a PHC string.
///
/// ```
/// use wayfare_core::auth::hash_password;
///
/// let hash = hash_password("Travel2026").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashError(e.to_string()))
}

/// Verifies a password against a stored hash. A mismatch is `Ok(false)`.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHash)?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(e.to_string())),
    }
}

/// Applies the password policy.
pub fn check_strength(password: &str) -> Result<(), PasswordError> {
    let long_enough = password.chars().count() >= MIN_PASSWORD_LEN;
    let has_letter = password.chars().any(char::is_alphabetic);
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if long_enough && has_letter && has_digit {
        Ok(())
    } else {
        Err(PasswordError::TooWeak)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("Expense42").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("Expense42", &hash).unwrap());
        assert!(!verify_password("expense42", &hash).unwrap());
    }

    #[test]
    fn test_same_password_gets_new_salt() {
        assert_ne!(hash_password("Expense42").unwrap(), hash_password("Expense42").unwrap());
    }

    #[test]
    fn test_garbage_hash() {
        assert!(matches!(
            verify_password("Expense42", "not-a-hash"),
            Err(PasswordError::InvalidHash)
        ));
    }

    #[test]
    fn test_strength_policy() {
        assert!(check_strength("abcdefg1").is_ok());
        assert!(check_strength("abc1").is_err());
        assert!(check_strength("abcdefgh").is_err());
        assert!(check_strength("12345678").is_err());
    }
}
