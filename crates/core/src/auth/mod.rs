//! Credentials: Argon2id password hashing and the password policy applied
//! when administrators set or reset a password.

mod password;

pub use password::{MIN_PASSWORD_LEN, PasswordError, check_strength, hash_password, verify_password};
