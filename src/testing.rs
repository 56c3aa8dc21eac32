//! Fixtures shared by unit tests

use bookshelf_db::SqlitePool;

use crate::modules::{books, users};
use crate::modules::users::models::{NewUser, User, UserFlags};
use crate::modules::users::store::{SqliteUserStore, UserStore};

/// Fresh in-memory database with every module's schema applied
pub async fn memory_pool() -> SqlitePool {
    let pool = bookshelf_db::connect("sqlite::memory:", 1).await.unwrap();

    let mut migrations = Vec::new();
    for migration in books::store::migrations() {
        migrations.push((books::MODULE_NAME.to_string(), migration));
    }
    for migration in users::store::migrations() {
        migrations.push((users::MODULE_NAME.to_string(), migration));
    }

    bookshelf_db::apply_migrations(&pool, &migrations)
        .await
        .unwrap();
    pool
}

/// Insert an account with an unusable password, skipping the hashing cost
pub async fn create_user(pool: &SqlitePool, email: &str) -> User {
    SqliteUserStore::new(pool.clone())
        .create(NewUser {
            email: email.to_string(),
            password_hash: "!fixture".to_string(),
            flags: UserFlags::default(),
        })
        .await
        .unwrap()
}
