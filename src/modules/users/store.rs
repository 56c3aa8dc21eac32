//! Account persistence

use async_trait::async_trait;
use bookshelf_db::{Migration, SqlitePool, StoreError};

use super::models::{NewUser, User};

const USER_COLUMNS: &str = "id, email, password, is_staff, is_active, is_superuser";

pub fn migrations() -> Vec<Migration> {
    vec![Migration {
        id: "001_init",
        up: r#"
            CREATE TABLE users (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                email        TEXT    NULL UNIQUE,
                password     TEXT    NOT NULL,
                is_staff     INTEGER NOT NULL DEFAULT 0,
                is_active    INTEGER NOT NULL DEFAULT 1,
                is_superuser INTEGER NOT NULL DEFAULT 0
            );
            "#,
    }]
}

/// Storage capability for accounts
#[async_trait]
pub trait UserStore: Send + Sync + std::fmt::Debug {
    /// Insert an account; a taken email fails with [`StoreError::UniqueViolation`]
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;

    async fn get(&self, id: i64) -> Result<Option<User>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Remove an account. Books it borrowed keep their status but lose the
    /// borrower reference.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;
}

#[derive(Debug, Clone)]
pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let sql = format!(
            "INSERT INTO users (email, password, is_staff, is_active, is_superuser) \
             VALUES (?, ?, ?, ?, ?) RETURNING {}",
            USER_COLUMNS
        );

        let created = sqlx::query_as::<_, User>(&sql)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.flags.is_staff)
            .bind(user.flags.is_active)
            .bind(user.flags.is_superuser)
            .fetch_one(&self.pool)
            .await?;

        tracing::info!(user_id = created.id, "user created");
        Ok(created)
    }

    async fn get(&self, id: i64) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS);

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
