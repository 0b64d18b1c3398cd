/// Configuration management for the API server
///
/// Loads configuration from environment variables into a type-safe
/// struct. A `.env` file is honored in development.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `JWT_SECRET`: Secret key for JWT signing, at least 32 bytes (required)
/// - `API_HOST`: host to bind (default 0.0.0.0)
/// - `API_PORT`: port to bind (default 8080)
/// - `CORS_ORIGINS`: comma-separated allowed origins (default `*`)
/// - `SITE_URL`: public site URL used in sitemap links (default http://localhost:8080)
/// - `ADMIN_EMAIL`: recipient for inquiry notifications
/// - `UPLOADS_DIR`: directory for uploaded files (default ./uploads)
/// - `PRODUCTION`: enables HSTS and strict CORS when "true"
/// - `RUST_LOG`: log filter (default info)
///
/// # Example
///
/// ```no_run
/// use atelier_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Listening on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub uploads: UploadsConfig,
    pub site: SiteConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `*` means permissive
    pub cors_origins: Vec<String>,

    /// Enables HSTS and other production-only behavior
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Signing secret; at least 32 bytes. Generate with
    /// `openssl rand -hex 32`.
    pub secret: String,
}

/// File upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadsConfig {
    /// Directory uploaded files are written to
    pub dir: String,

    /// Maximum accepted file size in bytes
    pub max_file_size: usize,
}

/// Public site details used by the SEO surfaces and mail notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Public base URL, no trailing slash
    pub url: String,

    /// Recipient for inquiry and application notifications
    pub admin_email: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `DATABASE_URL` or `JWT_SECRET` is missing, the
    /// secret is shorter than 32 bytes, or a numeric variable fails to
    /// parse.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        let cors_origins: Vec<String> = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let production = env::var("PRODUCTION")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let uploads_dir = env::var("UPLOADS_DIR").unwrap_or_else(|_| "./uploads".to_string());
        let max_file_size = env::var("UPLOADS_MAX_FILE_SIZE")
            .unwrap_or_else(|_| (10 * 1024 * 1024).to_string())
            .parse::<usize>()?;

        let site_url = env::var("SITE_URL")
            .unwrap_or_else(|_| "http://localhost:8080".to_string())
            .trim_end_matches('/')
            .to_string();
        let admin_email = env::var("ADMIN_EMAIL").ok();

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
                production,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig { secret: jwt_secret },
            uploads: UploadsConfig {
                dir: uploads_dir,
                max_file_size,
            },
            site: SiteConfig {
                url: site_url,
                admin_email,
            },
        })
    }

    /// Returns the server bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                cors_origins: vec!["*".to_string()],
                production: false,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/test".to_string(),
                max_connections: 10,
            },
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
            },
            uploads: UploadsConfig {
                dir: "./uploads".to_string(),
                max_file_size: 10 * 1024 * 1024,
            },
            site: SiteConfig {
                url: "https://example.com".to_string(),
                admin_email: None,
            },
        }
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(test_config().bind_address(), "127.0.0.1:8080");
    }
}
