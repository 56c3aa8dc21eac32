pub mod models;
pub mod password;
pub mod routes;
pub mod store;

use async_trait::async_trait;
use axum::Router;
use bookshelf_kernel::{InitCtx, Migration, Module};
use serde_json::json;

use crate::state::AppState;

pub const MODULE_NAME: &str = "user";

/// Account registration and per-user views
pub struct UsersModule {
    state: AppState,
}

impl UsersModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for UsersModule {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "users module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = json!({
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        });

        Some(json!({
            "paths": {
                "/create/": {
                    "post": {
                        "summary": "Register an account",
                        "tags": ["Users"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/CreateUser" }
                                }
                            }
                        },
                        "responses": {
                            "201": {
                                "description": "Account created",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/User" }
                                    }
                                }
                            },
                            "400": {
                                "description": "Missing email, malformed body or email already registered",
                                "content": error
                            }
                        }
                    }
                },
                "/get-all-books/": {
                    "get": {
                        "summary": "Books borrowed by the caller",
                        "tags": ["Users"],
                        "security": [{ "bearerAuth": [] }],
                        "responses": {
                            "200": {
                                "description": "Borrowed books ordered by id",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Book" }
                                        }
                                    }
                                }
                            },
                            "401": { "description": "Missing or invalid token", "content": error }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "User": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer", "format": "int64" },
                            "email": { "type": ["string", "null"], "format": "email" },
                            "is_active": { "type": "boolean" },
                            "is_staff": { "type": "boolean" },
                            "is_superuser": { "type": "boolean" }
                        },
                        "required": ["id", "email", "is_active", "is_staff", "is_superuser"]
                    },
                    "CreateUser": {
                        "type": "object",
                        "properties": {
                            "email": { "type": "string", "format": "email" },
                            "password": { "type": "string", "format": "password" },
                            "is_active": { "type": "boolean", "default": true },
                            "is_staff": { "type": "boolean", "default": false },
                            "is_superuser": { "type": "boolean", "default": false }
                        },
                        "required": ["email"],
                        "additionalProperties": false
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        store::migrations()
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "users module stopped");
        Ok(())
    }
}

/// Create a new instance of the users module
pub fn create_module(state: AppState) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(UsersModule::new(state))
}
