/// JWT token generation and validation
///
/// Tokens are signed with HS256 and carry the user's role names so
/// authorization checks need no database round trip. Two token types
/// exist: short-lived access tokens for API calls and long-lived
/// refresh tokens whose digests are tracked server-side.
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC-SHA256)
/// - **Access lifetime**: 15 minutes
/// - **Refresh lifetime**: 30 days
/// - **Validation**: signature, expiration, nbf, and issuer checks
/// - Secrets must be at least 32 bytes
///
/// # Example
///
/// ```
/// use atelier_shared::auth::jwt::{create_token, validate_access_token, Claims, TokenType};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "a-test-secret-that-is-32-bytes!!";
/// let claims = Claims::new(Uuid::new_v4(), vec!["Editor".to_string()], TokenType::Access);
/// let token = create_token(&claims, secret)?;
///
/// let validated = validate_access_token(&token, secret)?;
/// assert_eq!(validated.roles, vec!["Editor"]);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const ISSUER: &str = "atelier";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Failed to create token: {0}")]
    CreateError(String),

    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    #[error("Token has expired")]
    Expired,

    /// Access token presented where a refresh token is required, or the
    /// reverse
    #[error("Wrong token type: expected {expected}")]
    WrongTokenType { expected: &'static str },
}

/// Token type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    /// Lifetime for this token type.
    pub fn lifetime(&self) -> Duration {
        match self {
            TokenType::Access => Duration::minutes(15),
            TokenType::Refresh => Duration::days(30),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

/// JWT claims.
///
/// `roles` is populated for access tokens only; refresh tokens carry the
/// bare subject and the role set is re-read from the database when a new
/// access token is minted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: user ID
    pub sub: Uuid,

    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub nbf: i64,

    /// Role names at issue time (empty for refresh tokens)
    #[serde(default)]
    pub roles: Vec<String>,

    pub token_type: TokenType,
}

impl Claims {
    /// Creates claims expiring after the token type's standard lifetime.
    pub fn new(user_id: Uuid, roles: Vec<String>, token_type: TokenType) -> Self {
        let now = Utc::now();
        let expiration = now + token_type.lifetime();

        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            nbf: now.timestamp(),
            roles,
            token_type,
        }
    }

    /// Creates claims with a custom expiration. Used by tests to mint
    /// already-expired tokens.
    pub fn with_expiration(
        user_id: Uuid,
        roles: Vec<String>,
        token_type: TokenType,
        expires_in: Duration,
    ) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
            nbf: now.timestamp(),
            roles,
            token_type,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Signs claims into a token string.
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails.
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates signature, expiration, nbf, and issuer, returning the claims.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

/// Validates a token and requires it to be an access token.
pub fn validate_access_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let claims = validate_token(token, secret)?;

    if claims.token_type != TokenType::Access {
        return Err(JwtError::WrongTokenType { expected: "access" });
    }

    Ok(claims)
}

/// Validates a token and requires it to be a refresh token.
pub fn validate_refresh_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let claims = validate_token(token, secret)?;

    if claims.token_type != TokenType::Refresh {
        return Err(JwtError::WrongTokenType { expected: "refresh" });
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_token_lifetimes() {
        assert_eq!(TokenType::Access.lifetime(), Duration::minutes(15));
        assert_eq!(TokenType::Refresh.lifetime(), Duration::days(30));
    }

    #[test]
    fn test_create_and_validate_token() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, vec!["Admin".to_string()], TokenType::Access);
        let token = create_token(&claims, SECRET).expect("Should create token");

        let validated = validate_token(&token, SECRET).expect("Should validate token");
        assert_eq!(validated.sub, user_id);
        assert_eq!(validated.roles, vec!["Admin"]);
        assert_eq!(validated.iss, "atelier");
        assert_eq!(validated.token_type, TokenType::Access);
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let claims = Claims::new(Uuid::new_v4(), vec![], TokenType::Access);
        let token = create_token(&claims, SECRET).expect("Should create token");

        assert!(validate_token(&token, "a-different-secret-32-bytes-long").is_err());
    }

    #[test]
    fn test_validate_expired_token() {
        let claims = Claims::with_expiration(
            Uuid::new_v4(),
            vec![],
            TokenType::Access,
            Duration::seconds(-3600),
        );
        assert!(claims.is_expired());

        let token = create_token(&claims, SECRET).expect("Should create token");
        let result = validate_token(&token, SECRET);
        assert!(matches!(result, Err(JwtError::Expired)));
    }

    #[test]
    fn test_access_token_rejected_as_refresh() {
        let claims = Claims::new(Uuid::new_v4(), vec![], TokenType::Access);
        let token = create_token(&claims, SECRET).unwrap();

        assert!(validate_access_token(&token, SECRET).is_ok());
        assert!(matches!(
            validate_refresh_token(&token, SECRET),
            Err(JwtError::WrongTokenType { expected: "refresh" })
        ));
    }

    #[test]
    fn test_refresh_token_rejected_as_access() {
        let claims = Claims::new(Uuid::new_v4(), vec![], TokenType::Refresh);
        let token = create_token(&claims, SECRET).unwrap();

        assert!(validate_refresh_token(&token, SECRET).is_ok());
        assert!(validate_access_token(&token, SECRET).is_err());
    }

    #[test]
    fn test_roles_claim_defaults_to_empty() {
        // Tokens minted before the roles claim existed must still parse.
        let claims = Claims::new(Uuid::new_v4(), vec![], TokenType::Refresh);
        let token = create_token(&claims, SECRET).unwrap();
        let validated = validate_token(&token, SECRET).unwrap();
        assert!(validated.roles.is_empty());
    }
}
