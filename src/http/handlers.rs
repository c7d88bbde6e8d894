//! Status API handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::claims::Transaction;
use crate::http::server::AppState;
use crate::store::StoreSummary;

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub uptime_secs: u64,
    pub transactions: StoreSummary,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        uptime_secs: state.started.elapsed().as_secs(),
        transactions: state.store.summary(),
    })
}

pub async fn list_transactions(State(state): State<AppState>) -> Json<Vec<Transaction>> {
    Json(state.store.list())
}

/// Transactions of one event. Unknown keys yield an empty list.
pub async fn list_event_transactions(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<Vec<Transaction>> {
    Json(state.store.list_for_event(&key))
}
