/// Health check endpoint

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::app::AppState;

/// Reports process liveness and database reachability. Always answers
/// 200 so load balancers distinguish "degraded" from "gone".
pub async fn check(State(state): State<AppState>) -> Json<Value> {
    let database = match atelier_shared::db::pool::health_check(&state.db).await {
        Ok(()) => "up",
        Err(e) => {
            tracing::error!(error = %e, "Database health check failed");
            "down"
        }
    };

    Json(json!({
        "status": if database == "up" { "ok" } else { "degraded" },
        "version": atelier_shared::VERSION,
        "database": database,
    }))
}
