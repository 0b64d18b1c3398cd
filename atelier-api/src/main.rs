/// API server entry point
///
/// Startup order: logging, config, database pool, migrations, base role
/// seed, uploads directory, background tasks (cache sweeper, refresh
/// token purge), then the listener.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use atelier_api::app::{self, AppState};
use atelier_api::config::Config;
use atelier_shared::cache;
use atelier_shared::db::migrations::run_migrations;
use atelier_shared::db::pool::{create_pool, DatabaseConfig};
use atelier_shared::models::refresh_token::RefreshToken;
use atelier_shared::models::role::Role;

/// How often expired refresh tokens are purged.
const TOKEN_PURGE_INTERVAL: std::time::Duration = std::time::Duration::from_secs(3600);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await
    .context("Failed to connect to the database")?;

    run_migrations(&pool)
        .await
        .context("Database migration failed")?;
    Role::ensure_base_roles(&pool)
        .await
        .context("Failed to seed base roles")?;

    tokio::fs::create_dir_all(&config.uploads.dir)
        .await
        .with_context(|| format!("Failed to create uploads directory {}", config.uploads.dir))?;

    let state = AppState::new(pool.clone(), config);

    cache::spawn_sweeper(state.cache.clone());
    spawn_token_purge(pool);

    let addr = state.config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, version = atelier_shared::VERSION, "API server listening");

    axum::serve(listener, app::build_router(state)).await?;
    Ok(())
}

/// Hourly cleanup of refresh tokens long past expiry.
fn spawn_token_purge(pool: sqlx::PgPool) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TOKEN_PURGE_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            match RefreshToken::purge_expired(&pool).await {
                Ok(purged) if purged > 0 => {
                    info!(purged, "Purged expired refresh tokens");
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "Refresh token purge failed"),
            }
        }
    });
}
