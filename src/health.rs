//! Liveness HTTP endpoint.
//!
//! One route: `GET /health`. 200 while the bot is connected, 503 otherwise,
//! always with the same JSON shape. Every other path is a plain-text 404.
//! No authentication, no other methods.

use crate::types::{ConnectionStatus, StatusHandle};
use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use log::info;
use serde::{Deserialize, Serialize};
use std::time::Instant;

// ---------------------------------------------------------------------------
// Response body
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthBody {
    pub status: ConnectionStatus,
    /// Display name the bot joins under.
    pub bot: String,
    /// Seconds since the process started.
    pub uptime: f64,
    /// RFC 3339 timestamp of this response.
    pub timestamp: String,
}

// ---------------------------------------------------------------------------
// Server state & routes
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct HealthState {
    status: StatusHandle,
    bot_name: String,
    started: Instant,
}

impl HealthState {
    pub fn new(status: StatusHandle, bot_name: impl Into<String>) -> Self {
        Self {
            status,
            bot_name: bot_name.into(),
            started: Instant::now(),
        }
    }
}

pub fn router(state: HealthState) -> Router {
    Router::new()
        .route("/health", get(health))
        .fallback(not_found)
        .with_state(state)
}

async fn health(State(state): State<HealthState>) -> impl IntoResponse {
    let status = state.status.get();
    let code = if status.is_connected() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = HealthBody {
        status,
        bot: state.bot_name.clone(),
        uptime: state.started.elapsed().as_secs_f64(),
        timestamp: Utc::now().to_rfc3339(),
    };

    (code, Json(body))
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}

// ---------------------------------------------------------------------------
// Serve
// ---------------------------------------------------------------------------

/// Bind and serve until the task is cancelled.
pub async fn serve(port: u16, state: HealthState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Health check server listening on port {}", port);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
