//! Session repository for database operations

use anyhow::Result;
use sqlx::{PgPool, Row};
use tracing::info;

use crate::models::{AuthUser, NewSession};

/// Session repository
#[derive(Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Create a new session repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a new session
    pub async fn create(&self, session: &NewSession) -> Result<()> {
        info!("Creating session for user: {}", session.user_id);

        sqlx::query(
            r#"
            INSERT INTO sessions (token_hash, user_id, username, is_admin, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&session.token_hash)
        .bind(session.user_id)
        .bind(&session.username)
        .bind(session.is_admin)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Resolve a token digest into an authenticated identity
    ///
    /// Joins the users table so a session whose user has been deleted is
    /// treated as invalid, not just one that has expired. Username and
    /// admin flag come from the live user row rather than the denormalized
    /// session copy.
    pub async fn resolve(&self, token_hash: &str) -> Result<Option<AuthUser>> {
        let row = sqlx::query(
            r#"
            SELECT s.user_id, u.username, u.is_admin
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token_hash = $1 AND s.expires_at > now()
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| AuthUser {
            id: row.get("user_id"),
            username: row.get("username"),
            is_admin: row.get("is_admin"),
        }))
    }

    /// Delete a session by token digest; absent sessions are a no-op
    pub async fn delete(&self, token_hash: &str) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM sessions WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Reap sessions past their expiry
    pub async fn delete_expired(&self) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM sessions WHERE expires_at <= now()
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
