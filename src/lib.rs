//! Bookshelf application library
//!
//! Wires the book and user modules onto the kernel registry, the SQLite
//! stores and the HTTP server.

pub mod admin;
pub mod auth;
pub mod modules;
pub mod state;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use bookshelf_authz::{JwtConfig, JwtVerifier};
use bookshelf_db::SqlitePool;
use bookshelf_kernel::{
    settings::{AuthSettings, Settings},
    InitCtx, ModuleRegistry,
};

pub use state::AppState;

/// Token verifier configured from the `auth` settings
pub fn jwt_verifier(settings: &AuthSettings) -> JwtVerifier {
    JwtVerifier::new(JwtConfig {
        secret: settings.jwt_secret.clone(),
        ttl_minutes: settings.token_ttl_minutes,
        leeway_seconds: settings.leeway_seconds,
    })
}

/// A migrated, initialized application ready to serve
pub struct App {
    pub settings: Settings,
    pub pool: SqlitePool,
    pub state: AppState,
    pub jwt: Arc<JwtVerifier>,
    pub registry: ModuleRegistry,
}

impl App {
    /// Connect to the configured database and bring every module up
    pub async fn bootstrap(settings: Settings) -> anyhow::Result<Self> {
        let pool = bookshelf_db::connect(&settings.database.url, settings.database.max_connections)
            .await
            .context("failed to open database")?;

        Self::with_pool(settings, pool).await
    }

    /// Bring every module up on an existing pool
    pub async fn with_pool(settings: Settings, pool: SqlitePool) -> anyhow::Result<Self> {
        let jwt = Arc::new(jwt_verifier(&settings.auth));
        let state = AppState::from_pool(pool.clone(), jwt.clone());

        let mut registry = ModuleRegistry::new();
        modules::register_all(&mut registry, &state);
        tracing::info!(modules = registry.module_count(), "modules registered");

        let applied = bookshelf_db::apply_migrations(&pool, &registry.collect_migrations())
            .await
            .context("failed to apply migrations")?;
        tracing::info!(applied, "migrations complete");

        let ctx = InitCtx {
            settings: &settings,
            db: &pool,
        };
        registry.init_modules(&ctx).await?;

        Ok(Self {
            settings,
            pool,
            state,
            jwt,
            registry,
        })
    }

    /// Full HTTP router with middleware and documentation routes
    pub fn router(&self) -> Router {
        bookshelf_http::build_router(&self.registry, &self.settings)
    }

    /// Serve HTTP until shutdown, then stop modules and close the pool
    pub async fn serve(self) -> anyhow::Result<()> {
        bookshelf_http::start_server(&self.registry, &self.settings).await?;

        self.registry.stop_modules().await?;
        self.pool.close().await;
        Ok(())
    }
}
