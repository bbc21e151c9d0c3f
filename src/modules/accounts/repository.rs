//! SQLite access for user accounts and their permission grants.

use std::collections::BTreeSet;

use catalog_authz::{Permission, Principal};
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::models::User;

/// What a login attempt needs to check a password.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user_id: i64,
    pub password_hash: String,
}

#[derive(Clone)]
pub struct AccountsRepository {
    pool: SqlitePool,
}

impl AccountsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a user with its grants. A taken username surfaces as a
    /// unique-constraint violation.
    pub async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        is_staff: bool,
        permissions: &BTreeSet<Permission>,
    ) -> sqlx::Result<User> {
        let created_at = Utc::now();
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query(
            "INSERT INTO users (username, password_hash, is_staff, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(username)
        .bind(password_hash)
        .bind(is_staff)
        .bind(created_at)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        for permission in permissions {
            sqlx::query("INSERT INTO user_permissions (user_id, permission) VALUES (?, ?)")
                .bind(id)
                .bind(permission.code())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(User {
            id,
            username: username.to_string(),
            is_staff,
            permissions: permissions.clone(),
            created_at,
        })
    }

    pub async fn find_credentials(&self, username: &str) -> sqlx::Result<Option<Credentials>> {
        sqlx::query("SELECT id, password_hash FROM users WHERE username = ?")
            .bind(username)
            .try_map(|row: SqliteRow| {
                Ok(Credentials {
                    user_id: row.try_get("id")?,
                    password_hash: row.try_get("password_hash")?,
                })
            })
            .fetch_optional(&self.pool)
            .await
    }

    /// The identity stored in a session after login.
    pub async fn load_principal(&self, user_id: i64) -> sqlx::Result<Option<Principal>> {
        let Some(row) = sqlx::query("SELECT id, username, is_staff FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        Ok(Some(Principal {
            user_id: row.try_get("id")?,
            username: row.try_get("username")?,
            is_staff: row.try_get("is_staff")?,
            permissions: self.permissions_of(user_id).await?,
        }))
    }

    pub async fn list_users(&self) -> sqlx::Result<Vec<User>> {
        let rows = sqlx::query(
            "SELECT id, username, is_staff, created_at FROM users ORDER BY username",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut users = Vec::with_capacity(rows.len());
        for row in rows {
            let id: i64 = row.try_get("id")?;
            users.push(User {
                id,
                username: row.try_get("username")?,
                is_staff: row.try_get("is_staff")?,
                permissions: self.permissions_of(id).await?,
                created_at: row.try_get("created_at")?,
            });
        }
        Ok(users)
    }

    async fn permissions_of(&self, user_id: i64) -> sqlx::Result<BTreeSet<Permission>> {
        let codes: Vec<String> =
            sqlx::query_scalar("SELECT permission FROM user_permissions WHERE user_id = ?")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;

        codes
            .iter()
            .map(|code| {
                code.parse::<Permission>()
                    .map_err(|e| sqlx::Error::ColumnDecode {
                        index: "permission".to_string(),
                        source: Box::new(e),
                    })
            })
            .collect()
    }
}
