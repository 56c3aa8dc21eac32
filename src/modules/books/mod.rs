pub mod models;
pub mod routes;
pub mod store;

use async_trait::async_trait;
use axum::Router;
use bookshelf_kernel::{InitCtx, Migration, Module};
use serde_json::json;

use crate::state::AppState;

pub const MODULE_NAME: &str = "book";

/// Catalogue browsing and lending
pub struct BooksModule {
    state: AppState,
}

impl BooksModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let books = self.state.books.count().await?;
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            books,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let book_id = json!({
            "name": "book_id",
            "in": "path",
            "required": true,
            "schema": { "type": "integer", "format": "int64" }
        });
        let book_or_refusal = json!({
            "description": "Updated book, or `{\"error\": ...}` when the request was refused",
            "content": {
                "application/json": {
                    "schema": {
                        "oneOf": [
                            { "$ref": "#/components/schemas/Book" },
                            { "$ref": "#/components/schemas/ErrorResponse" }
                        ]
                    }
                }
            }
        });
        let not_found = json!({
            "description": "No book with that id",
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                }
            }
        });
        let secured = json!([{ "bearerAuth": [] }]);

        Some(json!({
            "paths": {
                "/get-all/": {
                    "get": {
                        "summary": "List all books",
                        "tags": ["Books"],
                        "security": secured,
                        "responses": {
                            "200": {
                                "description": "Every book ordered by id",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Book" }
                                        }
                                    }
                                }
                            }
                        }
                    }
                },
                "/{book_id}/detail/": {
                    "get": {
                        "summary": "Book detail",
                        "tags": ["Books"],
                        "security": secured,
                        "parameters": [book_id],
                        "responses": {
                            "200": {
                                "description": "The book",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/Book" }
                                    }
                                }
                            },
                            "404": not_found
                        }
                    }
                },
                "/{book_id}/take/": {
                    "put": {
                        "summary": "Check a book out",
                        "tags": ["Books"],
                        "security": secured,
                        "parameters": [book_id],
                        "responses": { "200": book_or_refusal, "404": not_found }
                    }
                },
                "/{book_id}/return/": {
                    "put": {
                        "summary": "Return a book",
                        "tags": ["Books"],
                        "security": secured,
                        "parameters": [book_id],
                        "responses": { "200": book_or_refusal, "404": not_found }
                    }
                },
                "/return-all/": {
                    "put": {
                        "summary": "Return every book held by the caller",
                        "tags": ["Books"],
                        "security": secured,
                        "responses": {
                            "200": {
                                "description": "Count message, e.g. \"3 books were returned.\"",
                                "content": {
                                    "application/json": { "schema": { "type": "string" } }
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer", "format": "int64" },
                            "title": { "type": "string", "maxLength": 50 },
                            "author": { "type": "string", "maxLength": 100 },
                            "status": {
                                "type": "boolean",
                                "description": "true when the book is on the shelf"
                            },
                            "user": {
                                "type": ["integer", "null"],
                                "format": "int64",
                                "description": "Id of the borrower"
                            }
                        },
                        "required": ["id", "title", "author", "status", "user"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        store::migrations()
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module
pub fn create_module(state: AppState) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(BooksModule::new(state))
}
