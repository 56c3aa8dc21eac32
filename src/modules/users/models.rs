use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::password::{hash_password, PasswordError};

/// Stored account
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: Option<String>,
    /// Argon2 hash, never serialized
    pub password: String,
    pub is_staff: bool,
    pub is_active: bool,
    pub is_superuser: bool,
}

/// Public representation of an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserView {
    pub id: i64,
    pub email: Option<String>,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            is_active: user.is_active,
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
        }
    }
}

/// Body of `POST /user/create/`
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateUser {
    pub email: Option<String>,
    pub password: Option<String>,
    pub is_staff: Option<bool>,
    pub is_active: Option<bool>,
    pub is_superuser: Option<bool>,
}

impl CreateUser {
    pub fn flags(&self) -> UserFlags {
        let defaults = UserFlags::default();
        UserFlags {
            is_staff: self.is_staff.unwrap_or(defaults.is_staff),
            is_active: self.is_active.unwrap_or(defaults.is_active),
            is_superuser: self.is_superuser.unwrap_or(defaults.is_superuser),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserFlags {
    pub is_staff: bool,
    pub is_active: bool,
    pub is_superuser: bool,
}

impl Default for UserFlags {
    fn default() -> Self {
        Self {
            is_staff: false,
            is_active: true,
            is_superuser: false,
        }
    }
}

impl UserFlags {
    pub fn superuser() -> Self {
        Self {
            is_staff: true,
            is_active: true,
            is_superuser: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum UserError {
    #[error("The Email must be set")]
    MissingEmail,

    #[error(transparent)]
    Password(#[from] PasswordError),
}

/// A validated account ready to be inserted
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub flags: UserFlags,
}

impl NewUser {
    /// Build an account from raw input: the email is required and normalized,
    /// the password is hashed (or made unusable when absent).
    pub fn new(email: &str, password: Option<&str>, flags: UserFlags) -> Result<Self, UserError> {
        if email.is_empty() {
            return Err(UserError::MissingEmail);
        }

        Ok(Self {
            email: normalize_email(email),
            password_hash: hash_password(password)?,
            flags,
        })
    }

    /// Staff account with every permission
    pub fn superuser(email: &str, password: &str) -> Result<Self, UserError> {
        Self::new(email, Some(password), UserFlags::superuser())
    }
}

/// Lowercase the domain part of an address; the local part is case sensitive.
pub fn normalize_email(email: &str) -> String {
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}
