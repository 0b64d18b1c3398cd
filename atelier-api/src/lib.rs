/// HTTP API for the content backend
///
/// Serves the public marketing site reads and the authenticated content
/// dashboard over one REST surface. Storage, models, and auth primitives
/// live in `atelier-shared`; this crate owns HTTP concerns: routing,
/// middleware, caching, rate limiting, and error mapping.

pub mod app;
pub mod audit;
pub mod config;
pub mod csv;
pub mod error;
pub mod mailer;
pub mod middleware;
pub mod routes;
