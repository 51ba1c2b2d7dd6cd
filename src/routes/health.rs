use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::db::tables;
use crate::AppState;

/// Health check endpoint
///
/// Returns the health status of the server and storage.
/// Used by load balancers and monitoring systems.
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    // Check storage by opening the balances table under a read transaction
    let db = state.db.clone();
    let db_status = tokio::task::spawn_blocking(move || {
        let probe = db
            .begin_read()
            .map_err(crate::AppError::from)
            .and_then(|txn| txn.open_table(tables::BALANCES).map_err(Into::into));
        match probe {
            Ok(_) => "connected",
            Err(e) => {
                tracing::error!("Storage health check failed: {:?}", e);
                "disconnected"
            }
        }
    })
    .await
    .unwrap_or("error");

    Json(json!({
        "status": if db_status == "connected" { "healthy" } else { "unhealthy" },
        "database": db_status,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
