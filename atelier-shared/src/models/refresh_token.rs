/// Refresh token model and database operations
///
/// Refresh tokens are long-lived opaque JWTs; what we persist is a
/// SHA-256 digest of the token string, never the token itself. A token
/// is valid while its digest row exists, is unexpired, and has no
/// `revoked_at` stamp.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE refresh_tokens (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     token_digest TEXT NOT NULL,
///     expires_at TIMESTAMPTZ NOT NULL,
///     revoked_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,

    /// SHA-256 hex digest of the token string
    pub token_digest: String,

    pub expires_at: DateTime<Utc>,

    /// Set on logout; a revoked token can never be un-revoked
    pub revoked_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    /// Hashes a token string for storage and lookup.
    pub fn digest(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Records a freshly issued refresh token.
    pub async fn store(
        pool: &PgPool,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, RefreshToken>(
            "INSERT INTO refresh_tokens (user_id, token_digest, expires_at) \
             VALUES ($1, $2, $3) \
             RETURNING id, user_id, token_digest, expires_at, revoked_at, created_at",
        )
        .bind(user_id)
        .bind(Self::digest(token))
        .bind(expires_at)
        .fetch_one(pool)
        .await
    }

    /// Finds the live (unrevoked, unexpired) record for a token string.
    pub async fn find_active(pool: &PgPool, token: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, RefreshToken>(
            "SELECT id, user_id, token_digest, expires_at, revoked_at, created_at \
             FROM refresh_tokens \
             WHERE token_digest = $1 AND revoked_at IS NULL AND expires_at > NOW()",
        )
        .bind(Self::digest(token))
        .fetch_optional(pool)
        .await
    }

    /// Revokes a token by its string. Idempotent: revoking an already
    /// revoked or unknown token succeeds without effect.
    pub async fn revoke(pool: &PgPool, token: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = NOW() \
             WHERE token_digest = $1 AND revoked_at IS NULL",
        )
        .bind(Self::digest(token))
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Deletes tokens that expired more than a day ago. Returns the
    /// number of rows removed; runs periodically from a background task.
    pub async fn purge_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < NOW() - INTERVAL '1 day'")
                .execute(pool)
                .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_hex_sha256() {
        let digest = RefreshToken::digest("some.jwt.token");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_digest_is_deterministic() {
        assert_eq!(
            RefreshToken::digest("token-a"),
            RefreshToken::digest("token-a")
        );
        assert_ne!(
            RefreshToken::digest("token-a"),
            RefreshToken::digest("token-b")
        );
    }
}
