/// Generic collection endpoints
///
/// One handler set serves every content collection, instantiated per
/// entity type through [`Document`]. Reads are public and cached; writes
/// require a role from [`WRITE_ROLES`], deletes one from [`DELETE_ROLES`].
/// Every mutation invalidates the collection's cached responses and
/// appends to the activity log.
///
/// # Example
///
/// ```no_run
/// use atelier_api::routes::content::collection_routes;
/// use atelier_shared::cache::ResponseCache;
/// use atelier_shared::models::service::Service;
/// use std::{sync::Arc, time::Duration};
///
/// let cache = Arc::new(ResponseCache::new());
/// let router = collection_routes::<Service>(
///     cache,
///     Duration::from_secs(300),
///     Duration::from_secs(600),
/// );
/// ```

use axum::extract::{OriginalUri, Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use validator::Validate;

use atelier_shared::auth::AuthContext;
use atelier_shared::cache::ResponseCache;
use atelier_shared::models::role::{DELETE_ROLES, WRITE_ROLES};
use atelier_shared::store::{Collection, Document, ListQuery, Stored};

use crate::app::AppState;
use crate::audit;
use crate::error::{validation_error, ApiError, ApiResult};
use crate::middleware::cache::CacheLayer;
use crate::middleware::rate_limit::client_ip;

/// Builds the standard five-operation router for one collection.
pub fn collection_routes<T>(
    cache: Arc<ResponseCache>,
    list_ttl: Duration,
    item_ttl: Duration,
) -> Router<AppState>
where
    T: Document + Validate,
{
    Router::new()
        .route("/", get(list::<T>).post(create::<T>))
        .route(
            "/:id",
            get(get_one::<T>).put(update::<T>).delete(remove::<T>),
        )
        .layer(CacheLayer::new(cache, list_ttl, item_ttl))
}

/// Strips a trailing record id so item mutations invalidate every cached
/// response under the collection path.
fn base_path(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some((base, last)) if Uuid::parse_str(last).is_ok() => base,
        _ => path.trim_end_matches('/'),
    }
}

pub(crate) fn invalidate(state: &AppState, path: &str) {
    state.cache.clear(Some(&format!("GET:{}", base_path(path))));
}

pub async fn list<T: Document>(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Response> {
    let page = Collection::<T>::new(state.db.clone()).list(&query).await?;
    let total = page.total;

    let mut response = Json(page).into_response();
    if let Ok(value) = HeaderValue::from_str(&total.to_string()) {
        response.headers_mut().insert("X-Total-Count", value);
    }
    Ok(response)
}

pub async fn get_one<T: Document>(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Stored<T>>> {
    Ok(Json(Collection::<T>::new(state.db.clone()).get(id).await?))
}

pub async fn create<T: Document + Validate>(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    auth: Option<Extension<AuthContext>>,
    Json(doc): Json<T>,
) -> ApiResult<(StatusCode, Json<Stored<T>>)> {
    let ctx = super::require_roles(auth, WRITE_ROLES)?;
    doc.validate().map_err(validation_error)?;

    let stored = Collection::<T>::new(state.db.clone()).create(doc).await?;

    invalidate(&state, uri.path());
    audit::record(
        &state.db,
        "create",
        T::ENTITY,
        Some(stored.id),
        &ctx,
        Some(client_ip(&headers)),
    );
    Ok((StatusCode::CREATED, Json(stored)))
}

pub async fn update<T: Document + Validate>(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    auth: Option<Extension<AuthContext>>,
    Path(id): Path<Uuid>,
    Json(patch): Json<Value>,
) -> ApiResult<Json<Stored<T>>> {
    let ctx = super::require_roles(auth, WRITE_ROLES)?;
    if !patch.is_object() {
        return Err(ApiError::BadRequest("Expected a JSON object".to_string()));
    }

    let collection = Collection::<T>::new(state.db.clone());
    validate_patched(&collection, id, &patch).await?;

    let stored = collection.update(id, patch).await?;

    invalidate(&state, uri.path());
    audit::record(
        &state.db,
        "update",
        T::ENTITY,
        Some(id),
        &ctx,
        Some(client_ip(&headers)),
    );
    Ok(Json(stored))
}

pub async fn remove<T: Document>(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    auth: Option<Extension<AuthContext>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let ctx = super::require_roles(auth, DELETE_ROLES)?;

    Collection::<T>::new(state.db.clone()).remove(id).await?;

    invalidate(&state, uri.path());
    audit::record(
        &state.db,
        "delete",
        T::ENTITY,
        Some(id),
        &ctx,
        Some(client_ip(&headers)),
    );
    Ok(Json(json!({ "success": true })))
}

/// Checks field rules against the would-be merged document before any
/// write happens.
async fn validate_patched<T: Document + Validate>(
    collection: &Collection<T>,
    id: Uuid,
    patch: &Value,
) -> ApiResult<()> {
    let current = collection.get(id).await?;
    let mut merged = match serde_json::to_value(&current.doc) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            return Err(ApiError::InternalError(
                "stored document is not an object".to_string(),
            ))
        }
        Err(e) => return Err(ApiError::InternalError(e.to_string())),
    };

    if let Value::Object(fields) = patch {
        for (key, value) in fields {
            if matches!(key.as_str(), "id" | "createdAt" | "updatedAt") {
                continue;
            }
            merged.insert(key.clone(), value.clone());
        }
    }

    let candidate: T = serde_json::from_value(Value::Object(merged))
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    candidate.validate().map_err(validation_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_path_strips_trailing_id() {
        assert_eq!(
            base_path("/v1/services/4b4fe227-5c4f-4b28-9d7c-d7d16a6a6c11"),
            "/v1/services"
        );
    }

    #[test]
    fn test_base_path_keeps_collection_paths() {
        assert_eq!(base_path("/v1/services"), "/v1/services");
        assert_eq!(base_path("/v1/services/"), "/v1/services");
        assert_eq!(base_path("/v1/services/featured"), "/v1/services/featured");
    }
}
