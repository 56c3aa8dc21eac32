//! HTTP handlers for `/book/...`

use axum::{
    extract::{FromRequestParts, Path, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use bookshelf_http::error::{AppError, ErrorBody};

use super::models::Book;
use crate::auth::CurrentUser;
use crate::state::AppState;

pub const IN_YOUR_USE: &str = "This book is in your use";
pub const NOT_AVAILABLE: &str = "This book is not available";
pub const NOT_IN_YOUR_USE: &str = "This book isn't in your use";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/get-all/", get(list_books))
        .route("/return-all/", put(return_all_books))
        .route("/{book_id}/detail/", get(book_detail))
        .route("/{book_id}/take/", put(take_book))
        .route("/{book_id}/return/", put(return_book))
        .with_state(state)
}

/// Outcome of a take or return request.
///
/// A refusal is not an HTTP error: it answers 200 with `{"error": ...}`.
#[derive(Debug)]
pub enum Lending {
    Updated(Book),
    Refused(&'static str),
}

impl IntoResponse for Lending {
    fn into_response(self) -> Response {
        match self {
            Lending::Updated(book) => (StatusCode::OK, Json(book)).into_response(),
            Lending::Refused(reason) => (StatusCode::OK, Json(ErrorBody::new(reason))).into_response(),
        }
    }
}

/// Book id taken from the path, rejected as a JSON 400 when not an integer
#[derive(Debug, Clone, Copy)]
pub struct BookId(pub i64);

impl<S> FromRequestParts<S> for BookId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(book_id) = Path::<i64>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))?;

        Ok(BookId(book_id))
    }
}

fn missing(book_id: i64) -> AppError {
    AppError::not_found(format!("Book with id {} does not exist", book_id))
}

async fn list_books(
    _user: CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Book>>, AppError> {
    Ok(Json(state.books.list().await?))
}

async fn book_detail(
    _user: CurrentUser,
    State(state): State<AppState>,
    BookId(book_id): BookId,
) -> Result<Json<Book>, AppError> {
    let book = state
        .books
        .get(book_id)
        .await?
        .ok_or_else(|| missing(book_id))?;

    Ok(Json(book))
}

async fn take_book(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    BookId(book_id): BookId,
) -> Result<Lending, AppError> {
    let mut book = state
        .books
        .get(book_id)
        .await?
        .ok_or_else(|| missing(book_id))?;

    if book.is_available() {
        if let Some(taken) = state.books.take(book_id, user.id).await? {
            tracing::info!(book_id, user_id = user.id, "book taken");
            return Ok(Lending::Updated(taken));
        }

        // Another checkout won the conditional update; answer from the fresh row.
        book = state
            .books
            .get(book_id)
            .await?
            .ok_or_else(|| missing(book_id))?;
    }

    if book.is_held_by(user.id) {
        Ok(Lending::Refused(IN_YOUR_USE))
    } else {
        Ok(Lending::Refused(NOT_AVAILABLE))
    }
}

async fn return_book(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    BookId(book_id): BookId,
) -> Result<Lending, AppError> {
    let book = state
        .books
        .get(book_id)
        .await?
        .ok_or_else(|| missing(book_id))?;

    if !book.is_held_by(user.id) {
        return Ok(Lending::Refused(NOT_IN_YOUR_USE));
    }

    match state.books.give_back(book_id, user.id).await? {
        Some(returned) => {
            tracing::info!(book_id, user_id = user.id, "book returned");
            Ok(Lending::Updated(returned))
        }
        None => Ok(Lending::Refused(NOT_IN_YOUR_USE)),
    }
}

async fn return_all_books(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<String>, AppError> {
    let returned = state.books.give_back_all(user.id).await?;
    tracing::info!(user_id = user.id, returned, "books returned");

    Ok(Json(format!("{} books were returned.", returned)))
}
