/// Fire-and-forget activity logging
///
/// Content mutations append to the activity log from a spawned task so a
/// slow or failing log write never delays or fails the request. A lost
/// entry is logged and accepted.

use atelier_shared::auth::AuthContext;
use atelier_shared::models::activity::{ActivityEntry, RecordActivity};
use sqlx::PgPool;
use uuid::Uuid;

/// Queues one activity entry for the background writer.
pub fn record(
    pool: &PgPool,
    action: &str,
    entity: &str,
    entity_id: Option<Uuid>,
    auth: &AuthContext,
    ip: Option<String>,
) {
    let pool = pool.clone();
    let data = RecordActivity {
        action: action.to_string(),
        entity: entity.to_string(),
        entity_id: entity_id.map(|id| id.to_string()),
        user_id: Some(auth.user_id),
        user_email: auth.email.clone(),
        user_roles: auth.roles.clone(),
        ip,
        meta: None,
    };

    tokio::spawn(async move {
        if let Err(e) = ActivityEntry::record(&pool, data).await {
            tracing::warn!(error = %e, "Failed to record activity entry");
        }
    });
}
