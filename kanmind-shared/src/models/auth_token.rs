/// Opaque authentication tokens
///
/// Each user has at most one token. Logging in again returns the existing
/// key instead of minting a new one, so all sessions of a user share it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE auth_tokens (
///     key VARCHAR(40) PRIMARY KEY,
///     user_id BIGINT NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Token row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuthToken {
    pub key: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

impl AuthToken {
    /// Returns the user's token, inserting `candidate` if none exists yet
    ///
    /// The insert is a no-op on conflict, so two concurrent logins for the
    /// same user converge on whichever key committed first.
    pub async fn get_or_create(
        pool: &PgPool,
        user_id: i64,
        candidate: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO auth_tokens (key, user_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(candidate)
        .bind(user_id)
        .execute(pool)
        .await?;

        sqlx::query_as::<_, AuthToken>(
            "SELECT key, user_id, created_at FROM auth_tokens WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    /// Looks up the user owning a key, ignoring inactive accounts
    pub async fn resolve(pool: &PgPool, key: &str) -> Result<Option<i64>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT t.user_id
            FROM auth_tokens t
            JOIN users u ON u.id = t.user_id
            WHERE t.key = $1 AND u.is_active
            "#,
        )
        .bind(key)
        .fetch_optional(pool)
        .await
    }
}
