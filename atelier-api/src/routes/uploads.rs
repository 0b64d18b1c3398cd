/// File upload endpoint
///
/// Accepts multipart uploads from the dashboard, writes each file under
/// the configured uploads directory with a UUID-prefixed name, and
/// answers with the public URLs. Files are served back by the static
/// file service mounted at `/uploads`.

use axum::extract::{Multipart, State};
use axum::http::HeaderMap;
use axum::{Extension, Json};
use serde_json::{json, Value};
use uuid::Uuid;

use atelier_shared::auth::AuthContext;
use atelier_shared::models::role::WRITE_ROLES;

use crate::app::AppState;
use crate::audit;
use crate::error::{ApiError, ApiResult};
use crate::middleware::rate_limit::client_ip;

pub async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    auth: Option<Extension<AuthContext>>,
    mut multipart: Multipart,
) -> ApiResult<Json<Value>> {
    let ctx = super::require_roles(auth, WRITE_ROLES)?;

    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        let Some(original) = field.file_name().map(sanitize_filename) else {
            continue;
        };
        let mimetype = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {e}")))?;

        if data.is_empty() {
            continue;
        }
        if data.len() > state.config.uploads.max_file_size {
            return Err(ApiError::BadRequest(format!(
                "File exceeds the maximum upload size of {} bytes",
                state.config.uploads.max_file_size
            )));
        }

        let stored_name = format!("{}-{}", Uuid::new_v4(), original);
        let path = std::path::Path::new(&state.config.uploads.dir).join(&stored_name);
        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| ApiError::InternalError(format!("Failed to store upload: {e}")))?;

        tracing::info!(file = %stored_name, size = data.len(), "Upload stored");
        files.push(json!({
            "filename": stored_name,
            "url": format!("{}/uploads/{}", state.config.site.url, stored_name),
            "size": data.len(),
            "mimetype": mimetype,
        }));
    }

    if files.is_empty() {
        return Err(ApiError::BadRequest("No files in request".to_string()));
    }

    audit::record(
        &state.db,
        "create",
        "Upload",
        None,
        &ctx,
        Some(client_ip(&headers)),
    );
    Ok(Json(json!({ "files": files })))
}

/// Reduces a client-supplied filename to a safe single path segment.
fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect();
    let trimmed = cleaned.trim_matches(|c| c == '-' || c == '.');

    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_keeps_safe_names() {
        assert_eq!(sanitize_filename("team-photo_2.png"), "team-photo_2.png");
    }

    #[test]
    fn test_sanitize_strips_path_separators() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "etc-passwd");
        assert_eq!(sanitize_filename("a b/c.png"), "a-b-c.png");
    }

    #[test]
    fn test_sanitize_never_returns_empty() {
        assert_eq!(sanitize_filename("///"), "file");
        assert_eq!(sanitize_filename(""), "file");
    }
}
