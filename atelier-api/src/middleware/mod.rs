/// HTTP middleware
///
/// - `auth`: attaches an AuthContext for valid bearer tokens
/// - `cache`: read-through response cache for public GET endpoints
/// - `rate_limit`: per-IP token buckets for auth and form endpoints
/// - `security`: OWASP-recommended response headers

pub mod auth;
pub mod cache;
pub mod rate_limit;
pub mod security;
