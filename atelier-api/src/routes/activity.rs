/// Activity log endpoint

use axum::extract::{Query, State};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use atelier_shared::auth::AuthContext;
use atelier_shared::models::activity::ActivityEntry;
use atelier_shared::models::role::DELETE_ROLES;
use atelier_shared::store::{pages_for, DEFAULT_LIMIT, MAX_LIMIT};

use crate::app::AppState;
use crate::error::ApiResult;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ActivityQuery {
    page: Option<i64>,
    limit: Option<i64>,
}

/// Recent content mutations, newest first. The audit trail names users
/// and IPs, so only the admin roles may read it.
pub(crate) async fn list_activity(
    State(state): State<AppState>,
    auth: Option<Extension<AuthContext>>,
    Query(query): Query<ActivityQuery>,
) -> ApiResult<Json<Value>> {
    super::require_roles(auth, DELETE_ROLES)?;

    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = (page - 1) * limit;

    let items = ActivityEntry::recent(&state.db, limit, offset).await?;
    let total = ActivityEntry::count(&state.db).await?;

    Ok(Json(json!({
        "items": items,
        "total": total,
        "page": page,
        "limit": limit,
        "pages": pages_for(total, limit),
    })))
}
