/// Dashboard summary endpoint
///
/// One aggregate payload for the dashboard landing view: active project
/// and service counts, today's inquiries and signups, total blog posts,
/// and the newest inquiries. The aggregate is cached briefly through the
/// shared response cache from inside the handler; the router cache layer
/// cannot serve it because every request here carries an Authorization
/// header.

use axum::extract::State;
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde_json::json;
use std::time::Duration;

use atelier_shared::auth::AuthContext;
use atelier_shared::cache::CachedResponse;
use atelier_shared::models::blog::BlogPost;
use atelier_shared::models::inquiry::Inquiry;
use atelier_shared::models::portfolio::PortfolioProject;
use atelier_shared::models::role::WRITE_ROLES;
use atelier_shared::models::service::Service;
use atelier_shared::models::user::User;
use atelier_shared::store::{Collection, ListQuery};

use crate::app::AppState;
use crate::error::{ApiError, ApiResult};

const SUMMARY_CACHE_KEY: &str = "GET:/v1/analytics/summary";
const SUMMARY_TTL: Duration = Duration::from_secs(30);

/// How many recent inquiries ride along with the counts.
const LATEST_INQUIRIES: i64 = 5;

pub(crate) async fn summary(
    State(state): State<AppState>,
    auth: Option<Extension<AuthContext>>,
) -> ApiResult<Response> {
    super::require_roles(auth, WRITE_ROLES)?;

    if let Some(hit) = state.cache.get(SUMMARY_CACHE_KEY) {
        let mut response = Response::new(axum::body::Body::from(hit.body));
        if let Ok(value) = HeaderValue::from_str(&hit.content_type) {
            response.headers_mut().insert(header::CONTENT_TYPE, value);
        }
        response
            .headers_mut()
            .insert("X-Cache", HeaderValue::from_static("HIT"));
        return Ok(response);
    }

    let total_projects = Collection::<PortfolioProject>::new(state.db.clone())
        .count(Some("active"))
        .await?;
    let total_services = Collection::<Service>::new(state.db.clone())
        .count(Some("active"))
        .await?;
    let inquiries = Collection::<Inquiry>::new(state.db.clone());
    let enquiries_today = inquiries.count_created_today().await?;
    let new_users = User::count_created_today(&state.db).await?;
    let total_blog_posts = Collection::<BlogPost>::new(state.db.clone())
        .count(None)
        .await?;
    let latest_inquiries = inquiries
        .list(&ListQuery {
            limit: Some(LATEST_INQUIRIES),
            ..Default::default()
        })
        .await?
        .items;

    let body = json!({
        "totalProjects": total_projects,
        "totalServices": total_services,
        "enquiriesToday": enquiries_today,
        "newUsers": new_users,
        "totalBlogPosts": total_blog_posts,
        "latestInquiries": latest_inquiries,
    });

    let bytes =
        serde_json::to_vec(&body).map_err(|e| ApiError::InternalError(e.to_string()))?;
    state
        .cache
        .set(SUMMARY_CACHE_KEY, CachedResponse::json(bytes), SUMMARY_TTL);

    let mut response = Json(body).into_response();
    response
        .headers_mut()
        .insert("X-Cache", HeaderValue::from_static("MISS"));
    Ok(response)
}
