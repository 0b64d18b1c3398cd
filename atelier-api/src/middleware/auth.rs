/// Bearer token authentication
///
/// Runs on every request. A syntactically valid, unexpired access token
/// attaches an [`AuthContext`] extension; anything else leaves the
/// request anonymous. Handlers that need authentication look for the
/// extension and check roles themselves, so public and protected
/// operations can share one router.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use atelier_shared::auth::{jwt, AuthContext};

use crate::app::AppState;

pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = bearer_token(&request) {
        match jwt::validate_access_token(&token, &state.config.jwt.secret) {
            Ok(claims) => {
                request.extensions_mut().insert(AuthContext {
                    user_id: claims.sub,
                    email: None,
                    roles: claims.roles,
                });
            }
            Err(e) => {
                // Anonymous fallthrough; protected handlers answer 401.
                tracing::debug!(error = %e, "Ignoring invalid bearer token");
            }
        }
    }

    next.run(request).await
}

fn bearer_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_bearer_token_extraction() {
        let request = Request::builder()
            .header(header::AUTHORIZATION, "Bearer abc.def.ghi")
            .body(Body::empty())
            .unwrap();
        assert_eq!(bearer_token(&request), Some("abc.def.ghi".to_string()));
    }

    #[test]
    fn test_non_bearer_schemes_are_ignored() {
        let request = Request::builder()
            .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
            .body(Body::empty())
            .unwrap();
        assert_eq!(bearer_token(&request), None);

        let request = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(bearer_token(&request), None);
    }
}
