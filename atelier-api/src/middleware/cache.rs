/// Read-through response cache for public GET endpoints
///
/// Successful GET responses are stored in the in-memory cache keyed by
/// `METHOD:uri` (query string included, so each filter combination is a
/// distinct entry). Hits are served without touching handlers or the
/// database and carry `X-Cache: HIT`; misses pass through and carry
/// `X-Cache: MISS`.
///
/// Requests with an `Authorization` header bypass the cache entirely:
/// dashboard reads always see fresh data and authed responses never leak
/// into the shared cache.
///
/// Collection routes get two TTLs: list URLs use `list_ttl` and item
/// URLs (last path segment is a UUID) use `item_ttl`. Single-document
/// routes like the sitemap use [`CacheLayer::fixed`].

use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::{header, HeaderValue, Method, StatusCode},
    response::Response,
};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tower::{Layer, Service};
use uuid::Uuid;

use atelier_shared::cache::{CachedResponse, ResponseCache};

/// Response caching layer
#[derive(Clone)]
pub struct CacheLayer {
    cache: Arc<ResponseCache>,
    list_ttl: Duration,
    item_ttl: Duration,
}

impl CacheLayer {
    /// Separate TTLs for list and item URLs.
    pub fn new(cache: Arc<ResponseCache>, list_ttl: Duration, item_ttl: Duration) -> Self {
        Self {
            cache,
            list_ttl,
            item_ttl,
        }
    }

    /// One TTL for every URL under the layer.
    pub fn fixed(cache: Arc<ResponseCache>, ttl: Duration) -> Self {
        Self::new(cache, ttl, ttl)
    }
}

impl<S> Layer<S> for CacheLayer {
    type Service = CacheMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CacheMiddleware {
            inner,
            cache: self.cache.clone(),
            list_ttl: self.list_ttl,
            item_ttl: self.item_ttl,
        }
    }
}

/// Response caching service
#[derive(Clone)]
pub struct CacheMiddleware<S> {
    inner: S,
    cache: Arc<ResponseCache>,
    list_ttl: Duration,
    item_ttl: Duration,
}

/// True when the path's last segment is a record id.
fn is_item_path(path: &str) -> bool {
    path.rsplit('/')
        .next()
        .is_some_and(|segment| Uuid::parse_str(segment).is_ok())
}

impl<S> Service<Request> for CacheMiddleware<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let cacheable =
            request.method() == Method::GET && !request.headers().contains_key(header::AUTHORIZATION);

        // poll_ready was called on `self.inner`, so the original must be
        // the one driven; the clone goes back into self.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        if !cacheable {
            return Box::pin(async move { inner.call(request).await });
        }

        let cache = self.cache.clone();
        let key = format!("{}:{}", request.method(), request.uri());
        let ttl = if is_item_path(request.uri().path()) {
            self.item_ttl
        } else {
            self.list_ttl
        };

        Box::pin(async move {
            if let Some(hit) = cache.get(&key) {
                let mut response = Response::new(Body::from(hit.body));
                if let Ok(value) = HeaderValue::from_str(&hit.content_type) {
                    response.headers_mut().insert(header::CONTENT_TYPE, value);
                }
                response
                    .headers_mut()
                    .insert("X-Cache", HeaderValue::from_static("HIT"));
                return Ok(response);
            }

            let response = inner.call(request).await?;

            if response.status() != StatusCode::OK {
                return Ok(response);
            }

            let (parts, body) = response.into_parts();
            let bytes = match to_bytes(body, usize::MAX).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to buffer response body for caching");
                    let mut response = Response::new(Body::empty());
                    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                    return Ok(response);
                }
            };

            let content_type = parts
                .headers
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("application/json")
                .to_string();

            cache.set(
                key,
                CachedResponse::new(content_type, bytes.to_vec()),
                ttl,
            );

            let mut response = Response::from_parts(parts, Body::from(bytes));
            response
                .headers_mut()
                .insert("X-Cache", HeaderValue::from_static("MISS"));
            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{response::IntoResponse, routing::get, Json, Router};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    static HITS: AtomicUsize = AtomicUsize::new(0);

    async fn counted() -> impl IntoResponse {
        HITS.fetch_add(1, Ordering::SeqCst);
        Json(json!({ "value": 42 }))
    }

    fn app(cache: Arc<ResponseCache>) -> Router {
        Router::new()
            .route("/v1/things", get(counted))
            .layer(CacheLayer::fixed(cache, Duration::from_secs(60)))
    }

    #[tokio::test]
    async fn test_second_request_is_a_hit() {
        HITS.store(0, Ordering::SeqCst);
        let cache = Arc::new(ResponseCache::new());

        let first = app(cache.clone())
            .oneshot(
                Request::builder()
                    .uri("/v1/things")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(first.headers().get("X-Cache").unwrap(), "MISS");

        let second = app(cache)
            .oneshot(
                Request::builder()
                    .uri("/v1/things")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(second.headers().get("X-Cache").unwrap(), "HIT");
        assert_eq!(HITS.load(Ordering::SeqCst), 1);

        let bytes = to_bytes(second.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["value"], 42);
    }

    #[tokio::test]
    async fn test_authorized_requests_bypass_cache() {
        HITS.store(0, Ordering::SeqCst);
        let cache = Arc::new(ResponseCache::new());

        for _ in 0..2 {
            let response = app(cache.clone())
                .oneshot(
                    Request::builder()
                        .uri("/v1/things")
                        .header(header::AUTHORIZATION, "Bearer token")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert!(response.headers().get("X-Cache").is_none());
        }

        assert_eq!(HITS.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_query_strings_are_distinct_keys() {
        HITS.store(0, Ordering::SeqCst);
        let cache = Arc::new(ResponseCache::new());

        for uri in ["/v1/things?page=1", "/v1/things?page=2"] {
            let response = app(cache.clone())
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.headers().get("X-Cache").unwrap(), "MISS");
        }

        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_item_path_detection() {
        assert!(is_item_path(
            "/v1/services/4b4fe227-5c4f-4b28-9d7c-d7d16a6a6c11"
        ));
        assert!(!is_item_path("/v1/services"));
        assert!(!is_item_path("/v1/services/featured"));
    }
}
