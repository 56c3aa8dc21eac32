use async_trait::async_trait;
use axum::Router;
use bookshelf_db::{Migration, SqlitePool};

use crate::settings::Settings;

/// Handles a module may use while it comes up. The schema is already
/// migrated by the time any module sees this.
pub struct InitCtx<'a> {
    pub settings: &'a Settings,
    pub db: &'a SqlitePool,
}

/// A feature area of the service: its tables, its routes and their docs
#[async_trait]
pub trait Module: Sync + Send {
    /// Stable identifier; routes are mounted under `/{name}`
    fn name(&self) -> &'static str;

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
    }

    /// Partial OpenAPI document with `paths` relative to the mount point
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    /// Schema changes owned by this module, applied in the order given
    fn migrations(&self) -> Vec<Migration> {
        Vec::new()
    }

    /// Release resources at shutdown, after the server stopped accepting requests
    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
