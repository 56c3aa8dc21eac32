//! Request authentication

use axum::{extract::FromRequestParts, http::request::Parts};
use bookshelf_authz::bearer_token;
use bookshelf_http::error::AppError;

use crate::modules::users::models::User;
use crate::state::AppState;

/// Extractor that requires a valid bearer token for an active account
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = state.verifier.verify(bearer_token(&parts.headers)?)?;

        let user = state
            .users
            .get(identity.user_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("User not found"))?;

        if !user.is_active {
            return Err(AppError::unauthorized("User is inactive"));
        }

        Ok(CurrentUser(user))
    }
}
