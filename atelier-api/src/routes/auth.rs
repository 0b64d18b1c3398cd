/// Session endpoints
///
/// Register, login, refresh, logout, password reset, and the current-user
/// lookup. Register and login sit behind the auth rate limiter; the
/// password reset pair shares the public-form limiter since it is fed
/// from the same kind of unauthenticated form. Refresh and logout are
/// unlimited: refresh requires a signed token and logout is idempotent.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::from_fn_with_state,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use validator::Validate;

use atelier_shared::auth::service::{AuthError, TokenPair};
use atelier_shared::auth::AuthContext;
use atelier_shared::models::role::RoleName;
use atelier_shared::models::user::User;

use crate::app::AppState;
use crate::error::{validation_error, ApiError, ApiResult};
use crate::middleware::rate_limit::auth_rate_limit;

pub fn routes(state: AppState) -> Router<AppState> {
    let credential_routes = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .layer(from_fn_with_state(state, auth_rate_limit));

    Router::new()
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .merge(credential_routes)
}

#[derive(Debug, Deserialize, Validate)]
struct RegisterRequest {
    #[validate(length(min = 1, message = "name is required"))]
    name: String,

    #[validate(email(message = "a valid email is required"))]
    email: String,

    password: String,

    /// Optional role name; omitted means Admin
    role: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    user: User,
    tokens: TokenPair,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest {
    refresh_token: String,
}

#[derive(Debug, Deserialize)]
struct ForgotPasswordRequest {
    email: String,
}

#[derive(Debug, Deserialize)]
struct ResetPasswordRequest {
    token: String,
    password: String,
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    req.validate().map_err(validation_error)?;

    let role = match req.role.as_deref() {
        Some(name) => Some(
            RoleName::parse(name)
                .ok_or_else(|| ApiError::BadRequest(format!("Unknown role: {name}")))?,
        ),
        None => None,
    };

    let user = state
        .auth
        .register(&req.name, &req.email, &req.password, role)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let (user, tokens) = state.auth.login(&req.email, &req.password).await?;
    Ok(Json(LoginResponse { user, tokens }))
}

async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<Value>> {
    let access_token = state.auth.refresh(&req.refresh_token).await?;
    Ok(Json(json!({ "accessToken": access_token })))
}

async fn logout(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<StatusCode> {
    state.auth.logout(&req.refresh_token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Always answers with the same message so account emails cannot be
/// enumerated through this endpoint.
async fn forgot_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ForgotPasswordRequest>,
) -> ApiResult<Json<Value>> {
    super::enforce_form_limit(&state, &headers)?;

    if let Some(token) = state.auth.forgot_password(&req.email).await? {
        state.mailer.send_password_reset(&req.email, &token);
    }

    Ok(Json(json!({
        "message": "If that account exists, a reset link has been sent"
    })))
}

async fn reset_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<Json<Value>> {
    super::enforce_form_limit(&state, &headers)?;

    state
        .auth
        .reset_password(&req.token, &req.password)
        .await
        .map_err(reset_error)?;
    Ok(Json(json!({ "message": "Password has been reset" })))
}

/// An unknown or expired reset token is a bad request, not a failed
/// session: there are no credentials on this endpoint to be wrong.
fn reset_error(err: AuthError) -> ApiError {
    match err {
        AuthError::InvalidToken => {
            ApiError::BadRequest("Invalid or expired reset token".to_string())
        }
        other => other.into(),
    }
}

async fn me(
    State(state): State<AppState>,
    auth: Option<Extension<AuthContext>>,
) -> ApiResult<Json<Value>> {
    let ctx = super::require_auth(auth)?;

    let user = User::find_by_id(&state.db, ctx.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".to_string()))?;
    let roles = state.auth.roles_for(ctx.user_id).await?;

    Ok(Json(json!({ "user": user, "roles": roles })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_reset_token_is_a_bad_request() {
        assert!(matches!(
            reset_error(AuthError::InvalidToken),
            ApiError::BadRequest(_)
        ));
    }

    #[test]
    fn test_other_reset_failures_keep_their_mapping() {
        assert!(matches!(
            reset_error(AuthError::WeakPassword("too short".to_string())),
            ApiError::ValidationError(_)
        ));
    }
}
