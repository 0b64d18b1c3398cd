/// Database migration runner
///
/// Runs the SQL migrations embedded from `atelier-shared/migrations/` at
/// startup. Every collection gets one physical table; content collections
/// are document-shaped (`id`, `doc` JSONB, timestamps) while the auth
/// tables are column-per-field.
///
/// # Example
///
/// ```no_run
/// use atelier_shared::db::pool::{create_pool, DatabaseConfig};
/// use atelier_shared::db::migrations::run_migrations;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// run_migrations(&pool).await?;
/// # Ok(())
/// # }
/// ```

use sqlx::postgres::PgPool;
use tracing::{info, warn};

/// Runs all pending database migrations.
///
/// # Errors
///
/// Returns an error if a migration fails to execute or the connection is
/// lost mid-run; failed migrations are rolled back where possible.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Starting database migrations");

    let migrations = sqlx::migrate!("./migrations");

    match migrations.run(pool).await {
        Ok(()) => {
            info!("All database migrations completed successfully");
            Ok(())
        }
        Err(e) => {
            warn!("Migration failed: {}", e);
            Err(e)
        }
    }
}
