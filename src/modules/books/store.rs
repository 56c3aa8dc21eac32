//! Book persistence.
//!
//! Lending transitions are single conditional `UPDATE`s: a book is only taken
//! while `status = 1` and only returned by its current borrower, so concurrent
//! requests cannot both win.

use async_trait::async_trait;
use bookshelf_db::{Migration, SqlitePool, StoreError};

use super::models::{Book, NewBook};

const BOOK_COLUMNS: &str = "id, title, author, status, user_id";

pub fn migrations() -> Vec<Migration> {
    vec![Migration {
        id: "001_init",
        // No CHECK tying status to user_id: deleting a borrower nulls user_id
        // and leaves status untouched.
        up: r#"
            CREATE TABLE books (
                id      INTEGER PRIMARY KEY AUTOINCREMENT,
                title   TEXT    NOT NULL CHECK (length(title) <= 50),
                author  TEXT    NOT NULL CHECK (length(author) <= 100),
                status  INTEGER NOT NULL DEFAULT 1 CHECK (status IN (0, 1)),
                user_id INTEGER NULL REFERENCES users (id) ON DELETE SET NULL
            );
            CREATE INDEX books_user_id_idx ON books (user_id);
            "#,
    }]
}

/// Storage capability for books
#[async_trait]
pub trait BookStore: Send + Sync + std::fmt::Debug {
    /// Add an available book
    async fn create(&self, book: NewBook) -> Result<Book, StoreError>;

    async fn get(&self, id: i64) -> Result<Option<Book>, StoreError>;

    /// All books ordered by id
    async fn list(&self) -> Result<Vec<Book>, StoreError>;

    async fn count(&self) -> Result<i64, StoreError>;

    /// Books currently borrowed by `user_id`, ordered by id
    async fn list_borrowed_by(&self, user_id: i64) -> Result<Vec<Book>, StoreError>;

    /// Lend the book to `user_id` if it is available.
    /// Returns `None` when the book is missing or already checked out.
    async fn take(&self, id: i64, user_id: i64) -> Result<Option<Book>, StoreError>;

    /// Put the book back on the shelf if `user_id` holds it.
    /// Returns `None` when the book is missing or held by someone else.
    async fn give_back(&self, id: i64, user_id: i64) -> Result<Option<Book>, StoreError>;

    /// Put every book held by `user_id` back on the shelf in one statement
    async fn give_back_all(&self, user_id: i64) -> Result<u64, StoreError>;
}

#[derive(Debug, Clone)]
pub struct SqliteBookStore {
    pool: SqlitePool,
}

impl SqliteBookStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStore for SqliteBookStore {
    async fn create(&self, book: NewBook) -> Result<Book, StoreError> {
        let sql = format!(
            "INSERT INTO books (title, author) VALUES (?, ?) RETURNING {}",
            BOOK_COLUMNS
        );

        let created = sqlx::query_as::<_, Book>(&sql)
            .bind(&book.title)
            .bind(&book.author)
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    async fn get(&self, id: i64) -> Result<Option<Book>, StoreError> {
        let sql = format!("SELECT {} FROM books WHERE id = ?", BOOK_COLUMNS);

        let book = sqlx::query_as::<_, Book>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(book)
    }

    async fn list(&self) -> Result<Vec<Book>, StoreError> {
        let sql = format!("SELECT {} FROM books ORDER BY id", BOOK_COLUMNS);

        let books = sqlx::query_as::<_, Book>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(books)
    }

    async fn count(&self) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn list_borrowed_by(&self, user_id: i64) -> Result<Vec<Book>, StoreError> {
        let sql = format!(
            "SELECT {} FROM books WHERE user_id = ? ORDER BY id",
            BOOK_COLUMNS
        );

        let books = sqlx::query_as::<_, Book>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(books)
    }

    async fn take(&self, id: i64, user_id: i64) -> Result<Option<Book>, StoreError> {
        let sql = format!(
            "UPDATE books SET status = 0, user_id = ? WHERE id = ? AND status = 1 RETURNING {}",
            BOOK_COLUMNS
        );

        let book = sqlx::query_as::<_, Book>(&sql)
            .bind(user_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(book)
    }

    async fn give_back(&self, id: i64, user_id: i64) -> Result<Option<Book>, StoreError> {
        let sql = format!(
            "UPDATE books SET status = 1, user_id = NULL WHERE id = ? AND user_id = ? RETURNING {}",
            BOOK_COLUMNS
        );

        let book = sqlx::query_as::<_, Book>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(book)
    }

    async fn give_back_all(&self, user_id: i64) -> Result<u64, StoreError> {
        let result = sqlx::query("UPDATE books SET status = 1, user_id = NULL WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
