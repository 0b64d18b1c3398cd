/// User model and database operations
///
/// Admin/editor accounts for the content dashboard. Visitors never get
/// accounts; users exist only to manage content. Roles are attached via
/// the user_roles join table.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name TEXT NOT NULL,
///     email TEXT NOT NULL UNIQUE,
///     password_hash TEXT NOT NULL,
///     reset_password_token TEXT,
///     reset_password_expires TIMESTAMPTZ,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use atelier_shared::models::user::{CreateUser, User};
/// # use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(&pool, CreateUser {
///     name: "Ada".to_string(),
///     email: "ada@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// }).await?;
///
/// let found = User::find_by_email(&pool, "ada@example.com").await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, name, email, password_hash, reset_password_token, \
                            reset_password_expires, is_active, created_at, updated_at";

/// A dashboard account.
///
/// Passwords are stored as Argon2id hashes, never in plaintext. The
/// reset fields hold an opaque one-time token while a password reset is
/// pending and are cleared once it is used.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Unique login email
    pub email: String,

    /// Argon2id password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Pending password reset token (opaque random hex)
    #[serde(skip_serializing)]
    pub reset_password_token: Option<String>,

    /// When the pending reset token stops being accepted
    #[serde(skip_serializing)]
    pub reset_password_expires: Option<DateTime<Utc>>,

    /// Deactivated users keep their records but cannot log in
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,

    /// Argon2id hash, not the plaintext password
    pub password_hash: String,
}

impl User {
    /// Creates a new user account.
    ///
    /// # Errors
    ///
    /// Returns an error if the email is already taken or the database
    /// operation fails.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, password_hash) VALUES ($1, $2, $3) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(data.name)
        .bind(data.email)
        .bind(data.password_hash)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by email. Lookup is case-insensitive.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    /// Finds a user holding the given unexpired reset token.
    pub async fn find_by_reset_token(
        pool: &PgPool,
        token: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE reset_password_token = $1 AND reset_password_expires > NOW()"
        ))
        .bind(token)
        .fetch_optional(pool)
        .await
    }

    /// Stores a pending password reset token.
    pub async fn set_reset_token(
        pool: &PgPool,
        id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET reset_password_token = $2, reset_password_expires = $3, \
             updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(token)
        .bind(expires_at)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Replaces the password hash and clears any pending reset token.
    pub async fn set_password(
        pool: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, reset_password_token = NULL, \
             reset_password_expires = NULL, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts accounts created since the start of the current day.
    pub async fn count_created_today(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE created_at >= date_trunc('day', NOW())",
        )
        .fetch_one(pool)
        .await
    }

    /// Names of the roles attached to this user.
    pub async fn role_names(pool: &PgPool, id: Uuid) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT r.name FROM roles r \
             JOIN user_roles ur ON ur.role_id = r.id \
             WHERE ur.user_id = $1 ORDER BY r.name",
        )
        .bind(id)
        .fetch_all(pool)
        .await
    }

    /// Attaches a role to the user. A second grant of the same role is a
    /// no-op.
    pub async fn grant_role(pool: &PgPool, id: Uuid, role_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(id)
        .bind(role_id)
        .execute(pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensitive_fields_never_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            reset_password_token: Some("deadbeef".to_string()),
            reset_password_expires: Some(Utc::now()),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(!json.contains("deadbeef"));
        assert!(json.contains("ada@example.com"));
    }
}
