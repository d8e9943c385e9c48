/**
 * Health Routes
 * Liveness ping and a readiness check over the store backend
 */
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::state::AppState;

// Process start, for the uptime field
lazy_static::lazy_static! {
    static ref SERVER_START: Instant = Instant::now();
}

pub fn init_start_time() {
    lazy_static::initialize(&SERVER_START);
}

/// Simple health response
#[derive(Debug, Serialize, Deserialize)]
pub struct SimpleHealthResponse {
    pub status: String,
}

/// Result of probing the store backend
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreCheck {
    pub backend: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Ready check response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub uptime: u64,
    pub store: StoreCheck,
}

/// GET /health
pub async fn health_ping() -> impl IntoResponse {
    Json(SimpleHealthResponse {
        status: "ok".to_string(),
    })
}

/// GET /health/ready
///
/// The in-memory backend is always ready; Postgres must answer a round-trip.
pub async fn health_ready(State(state): State<AppState>) -> impl IntoResponse {
    let backend = state.stores.backend_name().to_string();

    let store = match state.stores.pool() {
        None => StoreCheck {
            backend,
            status: "healthy".to_string(),
            response_time: None,
            error: None,
        },
        Some(pool) => match crate::db::health_check(pool).await {
            Ok(duration) => StoreCheck {
                backend,
                status: "healthy".to_string(),
                response_time: Some(duration.as_millis() as u64),
                error: None,
            },
            Err(e) => {
                tracing::warn!("readiness probe failed: {}", e);
                StoreCheck {
                    backend,
                    status: "unhealthy".to_string(),
                    response_time: None,
                    error: Some(e.to_string()),
                }
            }
        },
    };

    let ready = store.status == "healthy";
    let response = ReadyResponse {
        status: if ready { "ready" } else { "not ready" }.to_string(),
        timestamp: Utc::now(),
        uptime: SERVER_START.elapsed().as_secs(),
        store,
    };

    let code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(response))
}
