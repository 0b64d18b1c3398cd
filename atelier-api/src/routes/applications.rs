/// Job application endpoints
///
/// Candidates apply through the public POST, which verifies the job is
/// real and still open and sits behind the form rate limit. Review
/// operations (list with jobId filter, status updates, delete, export)
/// are dashboard-only.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use atelier_shared::auth::AuthContext;
use atelier_shared::models::job::{Application, ApplicationStatus, Job, JobStatus};
use atelier_shared::models::role::{DELETE_ROLES, WRITE_ROLES};
use atelier_shared::store::{Collection, Document, ListQuery, Stored, StoreError};

use crate::app::AppState;
use crate::audit;
use crate::csv;
use crate::error::{validation_error, ApiError, ApiResult};
use crate::middleware::rate_limit::client_ip;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(submit))
        .route("/export/csv", get(export))
        .route("/:id", get(get_one).put(update).delete(remove))
}

/// List parameters; `jobId` narrows to one opening's applications.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApplicationListQuery {
    page: Option<i64>,
    limit: Option<i64>,
    sort: Option<String>,
    status: Option<String>,
    q: Option<String>,
    job_id: Option<String>,
}

async fn submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(application): Json<Application>,
) -> ApiResult<(StatusCode, Json<Stored<Application>>)> {
    submit_application(state, headers, application).await
}

/// Nested form of the public POST; the path segment wins over any jobId
/// in the body.
pub(crate) async fn submit_for_job(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(job_id): Path<Uuid>,
    Json(mut application): Json<Application>,
) -> ApiResult<(StatusCode, Json<Stored<Application>>)> {
    application.job_id = job_id.to_string();
    submit_application(state, headers, application).await
}

async fn submit_application(
    state: AppState,
    headers: HeaderMap,
    mut application: Application,
) -> ApiResult<(StatusCode, Json<Stored<Application>>)> {
    super::enforce_form_limit(&state, &headers)?;
    application.validate().map_err(validation_error)?;

    // Applications only attach to real, still-open jobs.
    let job_id = Uuid::parse_str(&application.job_id)
        .map_err(|_| ApiError::BadRequest("jobId is not a valid id".to_string()))?;
    let job = match Collection::<Job>::new(state.db.clone()).get(job_id).await {
        Ok(job) => job,
        Err(StoreError::NotFound) => {
            return Err(ApiError::BadRequest("Unknown job".to_string()))
        }
        Err(e) => return Err(e.into()),
    };
    if job.doc.status == JobStatus::Closed {
        return Err(ApiError::Conflict(
            "This position is no longer accepting applications".to_string(),
        ));
    }

    application.status = ApplicationStatus::Pending;

    let stored = Collection::<Application>::new(state.db.clone())
        .create(application)
        .await?;
    state
        .mailer
        .notify_application(&stored.doc.name, &stored.doc.email, &stored.doc.job_id);

    Ok((StatusCode::CREATED, Json(stored)))
}

async fn list(
    State(state): State<AppState>,
    auth: Option<Extension<AuthContext>>,
    Query(query): Query<ApplicationListQuery>,
) -> ApiResult<Response> {
    super::require_auth(auth)?;
    list_applications(state, query).await
}

/// Nested review list for one opening.
pub(crate) async fn list_for_job(
    State(state): State<AppState>,
    auth: Option<Extension<AuthContext>>,
    Path(job_id): Path<Uuid>,
    Query(mut query): Query<ApplicationListQuery>,
) -> ApiResult<Response> {
    super::require_auth(auth)?;
    query.job_id = Some(job_id.to_string());
    list_applications(state, query).await
}

async fn list_applications(
    state: AppState,
    query: ApplicationListQuery,
) -> ApiResult<Response> {
    let list_query = ListQuery {
        page: query.page,
        limit: query.limit,
        sort: query.sort,
        q: query.q,
        status: query.status,
        resolved: None,
    };

    let collection = Collection::<Application>::new(state.db.clone());
    let page = match query.job_id {
        Some(ref job_id) => {
            collection
                .list_by_field("jobId", job_id, &list_query)
                .await?
        }
        None => collection.list(&list_query).await?,
    };
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
) -> ApiResult<Json<Stored<Application>>> {
    super::require_auth(auth)?;
    Ok(Json(
        Collection::<Application>::new(state.db.clone())
            .get(id)
            .await?,
    ))
}

async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    auth: Option<Extension<AuthContext>>,
    Path(id): Path<Uuid>,
    Json(patch): Json<Value>,
) -> ApiResult<Json<Stored<Application>>> {
    let ctx = super::require_roles(auth, WRITE_ROLES)?;

    let stored = Collection::<Application>::new(state.db.clone())
        .update(id, patch)
        .await?;

    audit::record(
        &state.db,
        "update",
        Application::ENTITY,
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

    Collection::<Application>::new(state.db.clone())
        .remove(id)
        .await?;

    audit::record(
        &state.db,
        "delete",
        Application::ENTITY,
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

    let records = Collection::<Application>::new(state.db.clone())
        .all()
        .await?;
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|record| {
            let doc = serde_json::to_value(&record.doc).unwrap_or(Value::Null);
            vec![
                record.id.to_string(),
                csv::field(&doc, "jobId"),
                csv::field(&doc, "name"),
                csv::field(&doc, "email"),
                csv::field(&doc, "resumeUrl"),
                csv::field(&doc, "status"),
                record.created_at.to_rfc3339(),
            ]
        })
        .collect();

    let body = csv::document(
        &["id", "jobId", "name", "email", "resumeUrl", "status", "createdAt"],
        &rows,
    );
    Ok(csv::attachment("applications.csv", body))
}
