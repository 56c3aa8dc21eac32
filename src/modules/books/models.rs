use serde::Serialize;
use thiserror::Error;

pub const TITLE_MAX_CHARS: usize = 50;
pub const AUTHOR_MAX_CHARS: usize = 100;

/// A book on the shelf.
///
/// `status == true` means the book is available and `borrower` is empty;
/// `false` means it is checked out by `borrower`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub status: bool,
    #[serde(rename = "user")]
    #[sqlx(rename = "user_id")]
    pub borrower: Option<i64>,
}

impl Book {
    pub fn is_available(&self) -> bool {
        self.status
    }

    pub fn is_held_by(&self, user_id: i64) -> bool {
        self.borrower == Some(user_id)
    }
}

/// Input for adding a book to the catalogue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BookError {
    #[error("title must be at most 50 characters")]
    TitleTooLong,

    #[error("author must be at most 100 characters")]
    AuthorTooLong,
}

impl NewBook {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Result<Self, BookError> {
        let title = title.into();
        let author = author.into();

        if title.chars().count() > TITLE_MAX_CHARS {
            return Err(BookError::TitleTooLong);
        }
        if author.chars().count() > AUTHOR_MAX_CHARS {
            return Err(BookError::AuthorTooLong);
        }

        Ok(Self { title, author })
    }
}
