//! HTTP handlers for `/user/...`

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use bookshelf_db::StoreError;
use bookshelf_http::error::AppError;

use super::models::{CreateUser, NewUser, UserError, UserView};
use crate::auth::CurrentUser;
use crate::modules::books::models::Book;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/create/", post(create_user))
        .route("/get-all-books/", get(list_my_books))
        .with_state(state)
}

/// Open registration; no credentials required
async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUser>, JsonRejection>,
) -> Result<(StatusCode, Json<UserView>), AppError> {
    let Json(request) = payload.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;

    let submitted_email = request.email.clone().unwrap_or_default();
    let new_user = prepare_user(request).await?;

    match state.users.create(new_user).await {
        Ok(user) => Ok((StatusCode::CREATED, Json(UserView::from(&user)))),
        Err(StoreError::UniqueViolation(_)) => Err(AppError::conflict(format!(
            "User with email {} already exists",
            submitted_email
        ))),
        Err(err) => Err(err.into()),
    }
}

/// Validate a signup and hash its password on the blocking pool
async fn prepare_user(request: CreateUser) -> Result<NewUser, AppError> {
    let flags = request.flags();
    let email = request.email.unwrap_or_default();

    tokio::task::spawn_blocking(move || NewUser::new(&email, request.password.as_deref(), flags))
        .await
        .map_err(|err| AppError::Internal(err.into()))?
        .map_err(|err| match err {
            UserError::MissingEmail => AppError::validation(err.to_string()),
            UserError::Password(_) => AppError::Internal(err.into()),
        })
}

async fn list_my_books(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Book>>, AppError> {
    Ok(Json(state.books.list_borrowed_by(user.id).await?))
}
