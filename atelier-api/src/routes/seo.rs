/// SEO surfaces: sitemap.xml, robots.txt, and the settings record
///
/// The sitemap lists the static marketing pages plus every live service,
/// published blog post, and live portfolio project by slug. robots.txt is
/// served from the settings record when one carries a custom body. Both
/// are cached at the router layer.

use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::Value;

use atelier_shared::auth::AuthContext;
use atelier_shared::models::blog::BlogPost;
use atelier_shared::models::portfolio::PortfolioProject;
use atelier_shared::models::role::WRITE_ROLES;
use atelier_shared::models::seo::SeoSettings;
use atelier_shared::models::service::Service;
use atelier_shared::store::{Collection, Document};

use crate::app::AppState;
use crate::audit;
use crate::error::{ApiError, ApiResult};
use crate::middleware::rate_limit::client_ip;

/// Marketing pages that are always present in the sitemap.
const STATIC_PAGES: &[&str] = &[
    "",
    "/about",
    "/services",
    "/portfolio",
    "/blog",
    "/pricing",
    "/careers",
    "/contact",
];

/// How many records each collection contributes to the sitemap at most.
const SITEMAP_LIMIT: i64 = 1000;

pub fn settings_routes() -> Router<AppState> {
    Router::new().route("/", get(get_settings).put(update_settings))
}

async fn get_settings(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let latest = Collection::<SeoSettings>::new(state.db.clone())
        .latest()
        .await?;

    let value = match latest {
        Some(stored) => serde_json::to_value(stored)
            .map_err(|e| ApiError::InternalError(e.to_string()))?,
        None => serde_json::to_value(SeoSettings::default())
            .map_err(|e| ApiError::InternalError(e.to_string()))?,
    };
    Ok(Json(value))
}

/// Upserts the single settings record: the first PUT creates it, later
/// PUTs patch it.
async fn update_settings(
    State(state): State<AppState>,
    headers: HeaderMap,
    auth: Option<Extension<AuthContext>>,
    Json(patch): Json<Value>,
) -> ApiResult<Json<Value>> {
    let ctx = super::require_roles(auth, WRITE_ROLES)?;
    if !patch.is_object() {
        return Err(ApiError::BadRequest("Expected a JSON object".to_string()));
    }

    let collection = Collection::<SeoSettings>::new(state.db.clone());
    let stored = match collection.latest().await? {
        Some(existing) => collection.update(existing.id, patch).await?,
        None => {
            let settings: SeoSettings = serde_json::from_value(patch)
                .map_err(|e| ApiError::BadRequest(e.to_string()))?;
            collection.create(settings).await?
        }
    };

    // A changed robots body must not keep serving from cache.
    state.cache.clear(Some("GET:/v1/seo/"));

    audit::record(
        &state.db,
        "update",
        SeoSettings::ENTITY,
        Some(stored.id),
        &ctx,
        Some(client_ip(&headers)),
    );

    let value =
        serde_json::to_value(stored).map_err(|e| ApiError::InternalError(e.to_string()))?;
    Ok(Json(value))
}

pub async fn sitemap(State(state): State<AppState>) -> ApiResult<Response> {
    let base = &state.config.site.url;
    let mut locations: Vec<String> = STATIC_PAGES
        .iter()
        .map(|page| format!("{base}{page}"))
        .collect();

    let services = Collection::<Service>::new(state.db.clone())
        .all_with_status("active", SITEMAP_LIMIT)
        .await?;
    locations.extend(
        services
            .iter()
            .filter_map(|s| s.doc.slug.as_deref())
            .map(|slug| format!("{base}/services/{slug}")),
    );

    let posts = Collection::<BlogPost>::new(state.db.clone())
        .all_with_status("published", SITEMAP_LIMIT)
        .await?;
    locations.extend(
        posts
            .iter()
            .filter_map(|p| p.doc.slug.as_deref())
            .map(|slug| format!("{base}/blog/{slug}")),
    );

    let projects = Collection::<PortfolioProject>::new(state.db.clone())
        .all_with_status("active", SITEMAP_LIMIT)
        .await?;
    locations.extend(
        projects
            .iter()
            .filter_map(|p| p.doc.slug.as_deref())
            .map(|slug| format!("{base}/portfolio/{slug}")),
    );

    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for location in &locations {
        xml.push_str("  <url><loc>");
        xml.push_str(&xml_escape(location));
        xml.push_str("</loc></url>\n");
    }
    xml.push_str("</urlset>\n");

    let mut response = xml.into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/xml; charset=utf-8"),
    );
    Ok(response)
}

pub async fn robots(State(state): State<AppState>) -> ApiResult<Response> {
    let settings = Collection::<SeoSettings>::new(state.db.clone())
        .latest()
        .await?;

    let body = settings
        .and_then(|s| s.doc.robots_txt)
        .filter(|custom| !custom.trim().is_empty())
        .unwrap_or_else(|| {
            format!(
                "User-agent: *\nAllow: /\n\nSitemap: {}/v1/seo/sitemap.xml\n",
                state.config.site.url
            )
        });

    let mut response = body.into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    Ok(response)
}

fn xml_escape(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\'' => escaped.push_str("&apos;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xml_escape() {
        assert_eq!(
            xml_escape("https://example.com/?a=1&b=2"),
            "https://example.com/?a=1&amp;b=2"
        );
        assert_eq!(xml_escape("plain-slug"), "plain-slug");
    }

    #[test]
    fn test_static_pages_include_root() {
        assert!(STATIC_PAGES.contains(&""));
        assert!(STATIC_PAGES.contains(&"/blog"));
    }
}
