/// Newsletter endpoints
///
/// Subscribe and unsubscribe are public and enumeration-safe: both
/// answer the same way whether or not the email was known. The
/// subscriber list, per-record updates and deletes, and the CSV export
/// are dashboard-only.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Extension, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use atelier_shared::auth::AuthContext;
use atelier_shared::models::role::{DELETE_ROLES, WRITE_ROLES};
use atelier_shared::models::subscriber::Subscriber;
use atelier_shared::models::Status;
use atelier_shared::store::{Collection, Document, ListQuery, Stored, StoreError};

use crate::app::AppState;
use crate::audit;
use crate::csv;
use crate::error::{validation_error, ApiResult};
use crate::middleware::rate_limit::client_ip;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/subscribe", post(subscribe))
        .route("/unsubscribe", post(unsubscribe))
        .route("/export/csv", get(export))
        .route("/:id", put(update).delete(remove))
}

#[derive(Debug, Deserialize, Validate)]
struct EmailRequest {
    #[validate(email(message = "a valid email is required"))]
    email: String,
}

async fn subscribe(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<EmailRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    super::enforce_form_limit(&state, &headers)?;
    req.validate().map_err(validation_error)?;

    let collection = Collection::<Subscriber>::new(state.db.clone());
    let subscriber = Subscriber {
        email: req.email.clone(),
        status: Status::Active,
    };

    match collection.create(subscriber).await {
        Ok(_) => Ok((StatusCode::CREATED, Json(json!({ "message": "Subscribed" })))),
        // Known email: reactivate instead of failing, covering the
        // subscribe-after-unsubscribe case.
        Err(StoreError::Conflict(_)) => {
            if let Some(existing) = find_by_email(&collection, &req.email).await? {
                collection
                    .update(existing.id, json!({ "status": "active" }))
                    .await?;
            }
            Ok((StatusCode::OK, Json(json!({ "message": "Subscribed" }))))
        }
        Err(e) => Err(e.into()),
    }
}

async fn unsubscribe(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<EmailRequest>,
) -> ApiResult<Json<Value>> {
    super::enforce_form_limit(&state, &headers)?;
    req.validate().map_err(validation_error)?;

    let collection = Collection::<Subscriber>::new(state.db.clone());
    if let Some(existing) = find_by_email(&collection, &req.email).await? {
        collection
            .update(existing.id, json!({ "status": "inactive" }))
            .await?;
    }

    Ok(Json(json!({ "message": "Unsubscribed" })))
}

/// Looks up a subscriber by (normalized) email.
async fn find_by_email(
    collection: &Collection<Subscriber>,
    email: &str,
) -> Result<Option<Stored<Subscriber>>, StoreError> {
    let normalized = email.trim().to_lowercase();
    let page = collection
        .list_by_field(
            "email",
            &normalized,
            &ListQuery {
                limit: Some(1),
                ..Default::default()
            },
        )
        .await?;
    Ok(page.items.into_iter().next())
}

async fn list(
    State(state): State<AppState>,
    auth: Option<Extension<AuthContext>>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Response> {
    super::require_auth(auth)?;

    let page = Collection::<Subscriber>::new(state.db.clone())
        .list(&query)
        .await?;
    let total = page.total;

    let mut response = Json(page).into_response();
    if let Ok(value) = HeaderValue::from_str(&total.to_string()) {
        response.headers_mut().insert("X-Total-Count", value);
    }
    Ok(response)
}

async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    auth: Option<Extension<AuthContext>>,
    Path(id): Path<Uuid>,
    Json(patch): Json<Value>,
) -> ApiResult<Json<Stored<Subscriber>>> {
    let ctx = super::require_roles(auth, WRITE_ROLES)?;

    let stored = Collection::<Subscriber>::new(state.db.clone())
        .update(id, patch)
        .await?;

    audit::record(
        &state.db,
        "update",
        Subscriber::ENTITY,
        Some(id),
        &ctx,
        Some(client_ip(&headers)),
    );
    Ok(Json(stored))
}

async fn remove(
    State(state): State<AppState>,
    headers: HeaderMap,
    auth: Option<Extension<AuthContext>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let ctx = super::require_roles(auth, DELETE_ROLES)?;

    Collection::<Subscriber>::new(state.db.clone())
        .remove(id)
        .await?;

    audit::record(
        &state.db,
        "delete",
        Subscriber::ENTITY,
        Some(id),
        &ctx,
        Some(client_ip(&headers)),
    );
    Ok(Json(json!({ "success": true })))
}

async fn export(
    State(state): State<AppState>,
    auth: Option<Extension<AuthContext>>,
) -> ApiResult<Response> {
    super::require_auth(auth)?;

    let records = Collection::<Subscriber>::new(state.db.clone())
        .all()
        .await?;
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|record| {
            vec![
                record.id.to_string(),
                record.doc.email.clone(),
                record.doc.status.as_str().to_string(),
                record.created_at.to_rfc3339(),
            ]
        })
        .collect();

    let body = csv::document(&["id", "email", "status", "createdAt"], &rows);
    Ok(csv::attachment("subscribers.csv", body))
}
