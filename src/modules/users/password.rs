//! Password hashing using Argon2

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
    Argon2,
};
use thiserror::Error;

/// Prefix marking a stored credential that can never match
pub const UNUSABLE_PASSWORD_PREFIX: char = '!';

#[derive(Debug, Error)]
#[error("failed to hash password: {0}")]
pub struct PasswordError(String);

/// Hash a password with a fresh salt.
///
/// `None` produces an unusable credential: the account exists but cannot log
/// in with a password.
pub fn hash_password(password: Option<&str>) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let Some(password) = password else {
        return Ok(format!("{}{}", UNUSABLE_PASSWORD_PREFIX, salt.as_str()));
    };

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError(e.to_string()))
}

/// Check a password against a stored hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    if hash.starts_with(UNUSABLE_PASSWORD_PREFIX) {
        return false;
    }

    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}
