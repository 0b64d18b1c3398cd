/// Route handlers
///
/// Content collections share the generic handlers in `content`; surfaces
/// with public submission paths or non-CRUD shapes (auth, inquiries,
/// applications, newsletter, SEO, uploads, activity, analytics) get
/// their own modules.

pub mod activity;
pub mod analytics;
pub mod applications;
pub mod auth;
pub mod content;
pub mod health;
pub mod inquiries;
pub mod newsletter;
pub mod seo;
pub mod uploads;

use axum::http::HeaderMap;
use axum::Extension;

use atelier_shared::auth::AuthContext;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::rate_limit::client_ip;

/// Resolves the caller's identity, rejecting anonymous requests.
pub fn require_auth(auth: Option<Extension<AuthContext>>) -> Result<AuthContext, ApiError> {
    auth.map(|Extension(ctx)| ctx)
        .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))
}

/// Resolves the caller's identity and requires one of the given roles.
pub fn require_roles(
    auth: Option<Extension<AuthContext>>,
    roles: &[&str],
) -> Result<AuthContext, ApiError> {
    let ctx = require_auth(auth)?;
    if ctx.has_any_role(roles) {
        Ok(ctx)
    } else {
        Err(ApiError::Forbidden("Insufficient permissions".to_string()))
    }
}

/// Applies the public-form rate limit, returning the caller IP.
pub fn enforce_form_limit(state: &AppState, headers: &HeaderMap) -> Result<String, ApiError> {
    let ip = client_ip(headers);
    let decision = state.form_limiter.check(&ip);

    if !decision.allowed {
        tracing::warn!(ip = %ip, "Form rate limit exceeded");
        return Err(ApiError::RateLimitExceeded {
            retry_after: decision.retry_after,
            message: format!(
                "Too many requests. Try again in {} seconds",
                decision.retry_after
            ),
        });
    }

    Ok(ip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn ctx(roles: &[&str]) -> Option<Extension<AuthContext>> {
        Some(Extension(AuthContext {
            user_id: Uuid::new_v4(),
            email: None,
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }))
    }

    #[test]
    fn test_require_auth_rejects_anonymous() {
        assert!(matches!(
            require_auth(None),
            Err(ApiError::Unauthorized(_))
        ));
        assert!(require_auth(ctx(&["Editor"])).is_ok());
    }

    #[test]
    fn test_require_roles_checks_membership() {
        assert!(require_roles(ctx(&["Editor"]), &["Editor", "Admin"]).is_ok());
        assert!(matches!(
            require_roles(ctx(&["Editor"]), &["Admin"]),
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(
            require_roles(None, &["Admin"]),
            Err(ApiError::Unauthorized(_))
        ));
    }
}
