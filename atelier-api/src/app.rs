/// Application state and router assembly
///
/// `AppState` is the one shared handle: pool, response cache, auth
/// service, mailer, config, and the two rate limiter scopes. The router
/// mounts every collection and the SEO surfaces under `/v1`, and the
/// uploaded files as a static directory.
///
/// Layer order (outermost first): security headers, request tracing,
/// CORS, bearer auth. Per-collection cache layers sit inside so they see
/// the Authorization header and skip authed requests.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use atelier_shared::auth::service::AuthService;
use atelier_shared::cache::ResponseCache;
use atelier_shared::models::blog::{BlogCategory, BlogPost};
use atelier_shared::models::job::Job;
use atelier_shared::models::page_content::PageContent;
use atelier_shared::models::partner::Partner;
use atelier_shared::models::portfolio::{PortfolioCategory, PortfolioProject};
use atelier_shared::models::pricing::PricingPlan;
use atelier_shared::models::service::{Service, ServiceCategory};
use atelier_shared::models::team::TeamMember;
use atelier_shared::models::tech_stack::TechStackItem;
use atelier_shared::models::testimonial::Testimonial;

use crate::config::Config;
use crate::mailer::Mailer;
use crate::middleware::auth::optional_auth;
use crate::middleware::cache::CacheLayer;
use crate::middleware::rate_limit::RateLimiter;
use crate::middleware::security::SecurityHeadersLayer;
use crate::routes::{
    activity, analytics, applications, auth, content, health, inquiries, newsletter, seo, uploads,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub cache: Arc<ResponseCache>,
    pub auth: AuthService,
    pub mailer: Arc<Mailer>,
    pub config: Arc<Config>,
    pub auth_limiter: Arc<RateLimiter>,
    pub form_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        let auth = AuthService::new(db.clone(), config.jwt.secret.clone());
        let mailer = Arc::new(Mailer::new(&config.site));

        Self {
            db,
            cache: Arc::new(ResponseCache::new()),
            auth,
            mailer,
            config: Arc::new(config),
            auth_limiter: Arc::new(RateLimiter::for_auth()),
            form_limiter: Arc::new(RateLimiter::for_forms()),
        }
    }
}

fn mins(minutes: u64) -> Duration {
    Duration::from_secs(minutes * 60)
}

/// Assembles the complete application router.
pub fn build_router(state: AppState) -> Router {
    let cache = state.cache.clone();

    let v1 = Router::new()
        .nest(
            "/services",
            content::collection_routes::<Service>(cache.clone(), mins(5), mins(10)),
        )
        .nest(
            "/service-categories",
            content::collection_routes::<ServiceCategory>(cache.clone(), mins(10), mins(10)),
        )
        .nest(
            "/blog",
            content::collection_routes::<BlogPost>(cache.clone(), mins(5), mins(15)),
        )
        .nest(
            "/blog-categories",
            content::collection_routes::<BlogCategory>(cache.clone(), mins(10), mins(10)),
        )
        .nest(
            "/portfolio",
            content::collection_routes::<PortfolioProject>(cache.clone(), mins(5), mins(10)),
        )
        .nest(
            "/portfolio-categories",
            content::collection_routes::<PortfolioCategory>(cache.clone(), mins(10), mins(10)),
        )
        .nest(
            "/testimonials",
            content::collection_routes::<Testimonial>(cache.clone(), mins(10), mins(10)),
        )
        .nest(
            "/team",
            content::collection_routes::<TeamMember>(cache.clone(), mins(10), mins(10)),
        )
        .nest(
            "/tech-stack",
            content::collection_routes::<TechStackItem>(cache.clone(), mins(10), mins(10)),
        )
        .nest(
            "/pricing",
            content::collection_routes::<PricingPlan>(cache.clone(), mins(10), mins(10)),
        )
        .nest(
            "/partners",
            content::collection_routes::<Partner>(cache.clone(), mins(10), mins(10)),
        )
        .nest(
            "/jobs",
            content::collection_routes::<Job>(cache.clone(), mins(10), mins(10)).route(
                // Candidate-facing alias on the opening itself; not cached.
                "/:id/applications",
                get(applications::list_for_job).post(applications::submit_for_job),
            ),
        )
        .nest(
            "/cms/pages",
            content::collection_routes::<PageContent>(cache.clone(), mins(10), mins(10)),
        )
        .nest("/cms/seo", seo::settings_routes())
        .nest("/applications", applications::routes())
        .nest("/inquiries", inquiries::routes())
        .nest("/newsletter", newsletter::routes())
        .nest(
            "/seo",
            Router::new()
                .route(
                    "/sitemap.xml",
                    get(seo::sitemap).layer(CacheLayer::fixed(cache.clone(), mins(30))),
                )
                .route(
                    "/robots.txt",
                    get(seo::robots).layer(CacheLayer::fixed(cache.clone(), mins(60))),
                ),
        )
        .nest("/auth", auth::routes(state.clone()))
        .route("/activity", get(activity::list_activity))
        .route("/analytics/summary", get(analytics::summary))
        .route(
            "/uploads",
            post(uploads::upload)
                .layer(DefaultBodyLimit::max(state.config.uploads.max_file_size + 64 * 1024)),
        );

    Router::new()
        .route("/health", get(health::check))
        .nest("/v1", v1)
        .nest_service("/uploads", ServeDir::new(&state.config.uploads.dir))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            optional_auth,
        ))
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    use axum::http::{HeaderValue, Method};
    use tower_http::cors::AllowOrigin;

    if config.api.cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, DatabaseConfig, JwtConfig, SiteConfig, UploadsConfig};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost/atelier_test")
            .expect("lazy pool");

        AppState::new(
            pool,
            Config {
                api: ApiConfig {
                    host: "127.0.0.1".to_string(),
                    port: 0,
                    cors_origins: vec!["*".to_string()],
                    production: false,
                },
                database: DatabaseConfig {
                    url: "postgres://postgres@localhost/atelier_test".to_string(),
                    max_connections: 1,
                },
                jwt: JwtConfig {
                    secret: "test-secret-key-at-least-32-bytes-long".to_string(),
                },
                uploads: UploadsConfig {
                    dir: "./uploads".to_string(),
                    max_file_size: 1024,
                },
                site: SiteConfig {
                    url: "https://example.com".to_string(),
                    admin_email: None,
                },
            },
        )
    }

    #[tokio::test]
    async fn test_unknown_route_is_404_with_security_headers() {
        let app = build_router(test_state());
        let response = app
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get("X-Content-Type-Options").unwrap(),
            "nosniff"
        );
    }

    #[tokio::test]
    async fn test_mutations_require_authentication() {
        let app = build_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/services")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_dashboard_reads_require_authentication() {
        let app = build_router(test_state());
        for uri in ["/v1/activity", "/v1/analytics/summary"] {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_invalid_bearer_token_stays_anonymous() {
        let app = build_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/v1/services/4b4fe227-5c4f-4b28-9d7c-d7d16a6a6c11")
                    .header("authorization", "Bearer not.a.token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
