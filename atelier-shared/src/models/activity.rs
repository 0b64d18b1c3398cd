/// Activity log model
///
/// An append-only audit trail of content mutations. Writes are
/// best-effort: a failed log insert is reported via tracing and never
/// fails the request that triggered it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: Uuid,

    /// What happened: "create", "update", "delete"
    pub action: String,

    /// Entity name, e.g. "BlogPost"
    pub entity: String,

    /// Id of the affected record, when one exists
    pub entity_id: Option<String>,

    pub user_id: Option<Uuid>,
    pub user_email: Option<String>,
    pub user_roles: Vec<String>,

    /// Caller IP as reported by the proxy headers
    pub ip: Option<String>,

    /// Free-form extra context
    pub meta: Option<Value>,

    pub created_at: DateTime<Utc>,
}

/// Input for recording one activity entry.
#[derive(Debug, Clone, Default)]
pub struct RecordActivity {
    pub action: String,
    pub entity: String,
    pub entity_id: Option<String>,
    pub user_id: Option<Uuid>,
    pub user_email: Option<String>,
    pub user_roles: Vec<String>,
    pub ip: Option<String>,
    pub meta: Option<Value>,
}

impl ActivityEntry {
    /// Appends one entry to the log.
    pub async fn record(pool: &PgPool, data: RecordActivity) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO activity_log \
             (action, entity, entity_id, user_id, user_email, user_roles, ip, meta) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(data.action)
        .bind(data.entity)
        .bind(data.entity_id)
        .bind(data.user_id)
        .bind(data.user_email)
        .bind(data.user_roles)
        .bind(data.ip)
        .bind(data.meta)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Most recent entries, newest first.
    pub async fn recent(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ActivityEntry>(
            "SELECT id, action, entity, entity_id, user_id, user_email, user_roles, ip, meta, \
             created_at FROM activity_log ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Total number of log entries.
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM activity_log")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}
