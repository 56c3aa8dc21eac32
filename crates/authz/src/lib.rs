//! Bearer token verification.
//!
//! Handlers only see [`Identity`]; how a token maps to an identity is behind
//! the [`TokenVerifier`] seam. [`JwtVerifier`] is the HS256 implementation the
//! service runs with.

use std::fmt::Debug;

use axum::http::{header, HeaderMap};
use thiserror::Error;

pub mod jwt;

pub use jwt::{JwtConfig, JwtVerifier};

/// Caller identity proven by a verified bearer token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication credentials were not provided")]
    MissingCredentials,

    #[error("Authorization header must be 'Bearer <token>'")]
    MalformedHeader,

    #[error("Token has expired")]
    Expired,

    #[error("Given token not valid: {0}")]
    InvalidToken(String),

    #[error("failed to issue token: {0}")]
    Issue(String),
}

/// Capability that turns a bearer credential into a caller identity
pub trait TokenVerifier: Send + Sync + Debug {
    fn verify(&self, token: &str) -> Result<Identity, AuthError>;
}

/// Extract the bearer token from an `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?;

    let token = value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(AuthError::MalformedHeader)?;

    if token.is_empty() {
        return Err(AuthError::MalformedHeader);
    }

    Ok(token)
}
