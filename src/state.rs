//! Shared services handed to every handler

use std::sync::Arc;

use bookshelf_authz::TokenVerifier;
use bookshelf_db::SqlitePool;

use crate::modules::books::store::{BookStore, SqliteBookStore};
use crate::modules::users::store::{SqliteUserStore, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub books: Arc<dyn BookStore>,
    pub users: Arc<dyn UserStore>,
    pub verifier: Arc<dyn TokenVerifier>,
}

impl AppState {
    /// Wire the SQLite-backed stores around a pool
    pub fn from_pool(pool: SqlitePool, verifier: Arc<dyn TokenVerifier>) -> Self {
        Self {
            books: Arc::new(SqliteBookStore::new(pool.clone())),
            users: Arc::new(SqliteUserStore::new(pool)),
            verifier,
        }
    }
}
