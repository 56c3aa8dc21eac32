//! Administrative operations exposed through the CLI rather than HTTP

use bookshelf_authz::{AuthError, JwtVerifier};
use bookshelf_db::StoreError;
use thiserror::Error;

use crate::modules::books::models::{Book, BookError, NewBook};
use crate::modules::users::models::{normalize_email, NewUser, User, UserError};
use crate::modules::users::password::verify_password;
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("User with email {0} already exists")]
    EmailTaken(String),

    #[error("no user with email {0}")]
    UnknownUser(String),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error(transparent)]
    User(#[from] UserError),

    #[error(transparent)]
    Book(#[from] BookError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Create an active staff account with every permission
pub async fn create_superuser(
    state: &AppState,
    email: &str,
    password: &str,
) -> Result<User, AdminError> {
    let new_user = NewUser::superuser(email, password)?;

    match state.users.create(new_user).await {
        Ok(user) => {
            tracing::info!(user_id = user.id, "superuser created");
            Ok(user)
        }
        Err(StoreError::UniqueViolation(_)) => Err(AdminError::EmailTaken(email.to_string())),
        Err(err) => Err(err.into()),
    }
}

/// Add a book to the shelf
pub async fn add_book(state: &AppState, title: &str, author: &str) -> Result<Book, AdminError> {
    let book = state.books.create(NewBook::new(title, author)?).await?;
    tracing::info!(book_id = book.id, "book added");
    Ok(book)
}

/// Check the password and sign an access token for the account
pub async fn issue_token(
    state: &AppState,
    jwt: &JwtVerifier,
    email: &str,
    password: &str,
) -> Result<String, AdminError> {
    let user = state
        .users
        .find_by_email(&normalize_email(email))
        .await?
        .filter(|user| user.is_active && verify_password(password, &user.password))
        .ok_or(AdminError::InvalidCredentials)?;

    Ok(jwt.issue(user.id)?)
}

/// Delete an account. Books it held stay checked out with no borrower.
pub async fn delete_user(state: &AppState, email: &str) -> Result<User, AdminError> {
    let user = state
        .users
        .find_by_email(&normalize_email(email))
        .await?
        .ok_or_else(|| AdminError::UnknownUser(email.to_string()))?;

    let orphaned = state.books.list_borrowed_by(user.id).await?.len();
    state.users.delete(user.id).await?;

    if orphaned > 0 {
        tracing::warn!(
            user_id = user.id,
            orphaned,
            "deleted user held books; they remain checked out without a borrower"
        );
    }

    Ok(user)
}
