/// Session flows: register, login, refresh, logout, password reset
///
/// Login failures are indistinguishable whether the email is unknown or
/// the password is wrong; only a deactivated account with a correct
/// password gets a distinct error. Forgot-password is likewise
/// enumeration-safe: unknown emails succeed silently.

use chrono::{Duration, Utc};
use rand::RngCore;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use super::jwt::{self, Claims, JwtError, TokenType};
use super::password::{self, PasswordError};
use crate::models::refresh_token::RefreshToken;
use crate::models::role::{Role, RoleName};
use crate::models::user::{CreateUser, User};

/// How long a password reset token stays valid.
const RESET_TOKEN_LIFETIME_HOURS: i64 = 1;

/// Error type for session operations
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Unknown email or wrong password; deliberately not distinguished
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Correct credentials but the account is deactivated
    #[error("Account is deactivated")]
    AccountInactive,

    /// Refresh or reset token that is unknown, revoked, or expired
    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Email is already registered")]
    EmailTaken,

    #[error("{0}")]
    WeakPassword(String),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Jwt(#[from] JwtError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Access/refresh token pair issued at login.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Stateless handle over the pool and signing secret.
#[derive(Debug, Clone)]
pub struct AuthService {
    pool: PgPool,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(pool: PgPool, jwt_secret: String) -> Self {
        Self { pool, jwt_secret }
    }

    /// Registers a new account. Accounts without an explicit role get
    /// Admin, matching how the dashboard provisions its operators.
    ///
    /// # Errors
    ///
    /// Returns `EmailTaken` if the email is in use and `WeakPassword` if
    /// the password fails the strength rules.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        plaintext_password: &str,
        role: Option<RoleName>,
    ) -> Result<User, AuthError> {
        password::validate_password_strength(plaintext_password)
            .map_err(AuthError::WeakPassword)?;

        // Roles are lazily upserted so the very first registration on a
        // fresh database can still be granted one.
        Role::ensure_base_roles(&self.pool).await?;

        if User::find_by_email(&self.pool, email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let user = User::create(
            &self.pool,
            CreateUser {
                name: name.to_string(),
                email: email.trim().to_lowercase(),
                password_hash: password::hash_password(plaintext_password)?,
            },
        )
        .await?;

        let role = role.unwrap_or(RoleName::Admin);
        if let Some(record) = Role::find_by_name(&self.pool, role.as_str()).await? {
            User::grant_role(&self.pool, user.id, record.id).await?;
        } else {
            warn!(
                user_id = %user.id,
                role = role.as_str(),
                "Role missing; user registered without roles"
            );
        }

        info!(user_id = %user.id, role = role.as_str(), "User registered");
        Ok(user)
    }

    /// Verifies credentials and issues an access/refresh token pair.
    pub async fn login(&self, email: &str, plaintext_password: &str) -> Result<(User, TokenPair), AuthError> {
        let user = User::find_by_email(&self.pool, email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !password::verify_password(plaintext_password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        // Checked after the password so a deactivated account cannot be
        // detected without knowing its password.
        if !user.is_active {
            return Err(AuthError::AccountInactive);
        }

        let roles = User::role_names(&self.pool, user.id).await?;

        let access_claims = Claims::new(user.id, roles, TokenType::Access);
        let access_token = jwt::create_token(&access_claims, &self.jwt_secret)?;

        let refresh_claims = Claims::new(user.id, vec![], TokenType::Refresh);
        let refresh_token = jwt::create_token(&refresh_claims, &self.jwt_secret)?;

        let expires_at = Utc::now() + TokenType::Refresh.lifetime();
        RefreshToken::store(&self.pool, user.id, &refresh_token, expires_at).await?;

        info!(user_id = %user.id, "User logged in");
        Ok((user, TokenPair {
            access_token,
            refresh_token,
        }))
    }

    /// Exchanges a live refresh token for a fresh access token.
    ///
    /// The refresh token itself is not rotated; it stays valid until it
    /// expires or is revoked by logout. Roles are re-read from the
    /// database so revoked permissions take effect on the next refresh.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        let claims = jwt::validate_refresh_token(refresh_token, &self.jwt_secret)
            .map_err(|_| AuthError::InvalidToken)?;

        let record = RefreshToken::find_active(&self.pool, refresh_token)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        let user = User::find_by_id(&self.pool, record.user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;
        if !user.is_active {
            return Err(AuthError::AccountInactive);
        }

        let roles = User::role_names(&self.pool, claims.sub).await?;
        let access_claims = Claims::new(claims.sub, roles, TokenType::Access);
        Ok(jwt::create_token(&access_claims, &self.jwt_secret)?)
    }

    /// Revokes a refresh token. Idempotent; unknown tokens succeed.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        RefreshToken::revoke(&self.pool, refresh_token).await?;
        Ok(())
    }

    /// Starts a password reset, returning the plaintext token for mail
    /// delivery. Returns `Ok(None)` for unknown emails so callers respond
    /// identically either way.
    pub async fn forgot_password(&self, email: &str) -> Result<Option<String>, AuthError> {
        let Some(user) = User::find_by_email(&self.pool, email).await? else {
            return Ok(None);
        };

        let token = generate_reset_token();
        let expires_at = Utc::now() + Duration::hours(RESET_TOKEN_LIFETIME_HOURS);
        User::set_reset_token(&self.pool, user.id, &token, expires_at).await?;

        info!(user_id = %user.id, "Password reset requested");
        Ok(Some(token))
    }

    /// Completes a password reset. The token is single-use: the reset
    /// fields are cleared when the new password is stored.
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        password::validate_password_strength(new_password).map_err(AuthError::WeakPassword)?;

        let user = User::find_by_reset_token(&self.pool, token)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        let hash = password::hash_password(new_password)?;
        User::set_password(&self.pool, user.id, &hash).await?;

        info!(user_id = %user.id, "Password reset completed");
        Ok(())
    }

    /// Resolves the current role names for a user ID.
    pub async fn roles_for(&self, user_id: Uuid) -> Result<Vec<String>, AuthError> {
        Ok(User::role_names(&self.pool, user_id).await?)
    }
}

/// 32 random bytes as 64 hex characters.
fn generate_reset_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_token_shape() {
        let token = generate_reset_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_reset_tokens_are_unique() {
        assert_ne!(generate_reset_token(), generate_reset_token());
    }
}
