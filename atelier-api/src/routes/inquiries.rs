/// Inquiry endpoints
///
/// The POST is the public contact form, behind the form rate limit.
/// Everything else (triage list, detail, resolve/update, delete, CSV
/// export) is dashboard-only.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use atelier_shared::auth::AuthContext;
use atelier_shared::models::inquiry::Inquiry;
use atelier_shared::models::role::{DELETE_ROLES, WRITE_ROLES};
use atelier_shared::store::{Collection, Document, ListQuery, Stored};

use crate::app::AppState;
use crate::audit;
use crate::csv;
use crate::error::{validation_error, ApiResult};
use crate::middleware::rate_limit::client_ip;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(submit))
        .route("/export/csv", get(export))
        .route("/:id", get(get_one).put(update).delete(remove))
}

async fn submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(mut inquiry): Json<Inquiry>,
) -> ApiResult<(StatusCode, Json<Stored<Inquiry>>)> {
    super::enforce_form_limit(&state, &headers)?;
    inquiry.validate().map_err(validation_error)?;

    // Submitters cannot pre-resolve their own inquiry.
    inquiry.resolved = false;

    let stored = Collection::<Inquiry>::new(state.db.clone())
        .create(inquiry)
        .await?;
    state.mailer.notify_inquiry(&stored.doc.name, &stored.doc.email);

    Ok((StatusCode::CREATED, Json(stored)))
}

async fn list(
    State(state): State<AppState>,
    auth: Option<Extension<AuthContext>>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Response> {
    super::require_auth(auth)?;

    let page = Collection::<Inquiry>::new(state.db.clone())
        .list(&query)
        .await?;
    let total = page.total;

    let mut response = Json(page).into_response();
    if let Ok(value) = HeaderValue::from_str(&total.to_string()) {
        response.headers_mut().insert("X-Total-Count", value);
    }
    Ok(response)
}

async fn get_one(
    State(state): State<AppState>,
    auth: Option<Extension<AuthContext>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Stored<Inquiry>>> {
    super::require_auth(auth)?;
    Ok(Json(
        Collection::<Inquiry>::new(state.db.clone()).get(id).await?,
    ))
}

async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    auth: Option<Extension<AuthContext>>,
    Path(id): Path<Uuid>,
    Json(patch): Json<Value>,
) -> ApiResult<Json<Stored<Inquiry>>> {
    let ctx = super::require_roles(auth, WRITE_ROLES)?;

    let stored = Collection::<Inquiry>::new(state.db.clone())
        .update(id, patch)
        .await?;

    audit::record(
        &state.db,
        "update",
        Inquiry::ENTITY,
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

    Collection::<Inquiry>::new(state.db.clone()).remove(id).await?;

    audit::record(
        &state.db,
        "delete",
        Inquiry::ENTITY,
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

    let records = Collection::<Inquiry>::new(state.db.clone()).all().await?;
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|record| {
            let doc = serde_json::to_value(&record.doc).unwrap_or(Value::Null);
            vec![
                record.id.to_string(),
                csv::field(&doc, "type"),
                csv::field(&doc, "name"),
                csv::field(&doc, "email"),
                csv::field(&doc, "phone"),
                csv::field(&doc, "message"),
                csv::field(&doc, "resolved"),
                record.created_at.to_rfc3339(),
            ]
        })
        .collect();

    let body = csv::document(
        &["id", "type", "name", "email", "phone", "message", "resolved", "createdAt"],
        &rows,
    );
    Ok(csv::attachment("inquiries.csv", body))
}
