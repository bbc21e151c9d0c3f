//! User accounts: registration by staff, login and logout.

pub mod models;
pub mod password;
pub mod repository;

mod routes;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use catalog_kernel::{AppContext, InitCtx, Migration, Module};
use serde_json::json;

use repository::AccountsRepository;
use routes::AccountsState;

const INIT_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    is_staff INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS user_permissions (
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    permission TEXT NOT NULL,
    PRIMARY KEY (user_id, permission)
);
"#;

pub struct AccountsModule;

impl AccountsModule {
    pub const fn new() -> Self {
        Self
    }
}

impl Default for AccountsModule {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Module for AccountsModule {
    fn name(&self) -> &'static str {
        "accounts"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            session_cookie = %ctx.settings.auth.session_cookie,
            "accounts module initialized"
        );
        Ok(())
    }

    fn routes(&self, ctx: &AppContext) -> Router {
        routes::router(AccountsState {
            repo: AccountsRepository::new(ctx.db.clone()),
        })
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = |description: &str| {
            json!({
                "description": description,
                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } } }
            })
        };
        let principal = json!({
            "description": "The logged-in user",
            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Principal" } } }
        });

        Some(json!({
            "paths": {
                "/login": {
                    "post": {
                        "summary": "Log in and attach the user to the session",
                        "tags": ["Accounts"],
                        "requestBody": {
                            "required": true,
                            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/LoginRequest" } } }
                        },
                        "responses": { "200": principal.clone(), "401": error("Bad credentials") }
                    }
                },
                "/logout": {
                    "post": {
                        "summary": "Discard the session",
                        "tags": ["Accounts"],
                        "responses": { "204": { "description": "Logged out" } }
                    }
                },
                "/me": {
                    "get": {
                        "summary": "The logged-in user",
                        "tags": ["Accounts"],
                        "responses": { "200": principal, "401": error("Not logged in") }
                    }
                },
                "/users": {
                    "get": {
                        "summary": "List users",
                        "tags": ["Accounts"],
                        "responses": {
                            "200": {
                                "description": "Users",
                                "content": { "application/json": { "schema": { "type": "array", "items": { "$ref": "#/components/schemas/User" } } } }
                            },
                            "403": error("Staff only")
                        }
                    },
                    "post": {
                        "summary": "Register a user",
                        "tags": ["Accounts"],
                        "requestBody": {
                            "required": true,
                            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/NewUser" } } }
                        },
                        "responses": {
                            "201": {
                                "description": "Created",
                                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/User" } } }
                            },
                            "403": error("Staff only"),
                            "409": error("Username taken"),
                            "422": error("Validation error")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "LoginRequest": {
                        "type": "object",
                        "properties": {
                            "username": { "type": "string" },
                            "password": { "type": "string" }
                        },
                        "required": ["username", "password"]
                    },
                    "Principal": {
                        "type": "object",
                        "properties": {
                            "user_id": { "type": "integer" },
                            "username": { "type": "string" },
                            "is_staff": { "type": "boolean" },
                            "permissions": { "type": "array", "items": { "type": "string" } }
                        }
                    },
                    "User": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer" },
                            "username": { "type": "string" },
                            "is_staff": { "type": "boolean" },
                            "permissions": { "type": "array", "items": { "type": "string" } },
                            "created_at": { "type": "string", "format": "date-time" }
                        }
                    },
                    "NewUser": {
                        "type": "object",
                        "properties": {
                            "username": { "type": "string", "maxLength": 150 },
                            "password": { "type": "string" },
                            "is_staff": { "type": "boolean" },
                            "permissions": { "type": "array", "items": { "type": "string" } }
                        },
                        "required": ["username", "password"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: INIT_SQL,
        }]
    }
}

pub fn create_module() -> Arc<dyn Module> {
    Arc::new(AccountsModule::new())
}
