use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::models::SymbolRecord;
use crate::store::SnapshotStore;

/// Read-only API over the latest snapshot
pub fn router(store: Arc<SnapshotStore>) -> Router {
    Router::new()
        .route("/api/data", get(latest_records))
        .route("/health", get(health))
        .with_state(store)
}

/// All records of the current snapshot, ordered by symbol
async fn latest_records(State(store): State<Arc<SnapshotStore>>) -> Json<Vec<SymbolRecord>> {
    let snapshot = store.get();
    Json(snapshot.records().cloned().collect())
}

async fn health(State(store): State<Arc<SnapshotStore>>) -> Json<Value> {
    let snapshot = store.get();
    Json(json!({
        "status": "ok",
        "sequence": snapshot.sequence,
        "symbols": snapshot.len(),
        "completedAt": snapshot.completed_at,
    }))
}
