//! API handlers for the push endpoint

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::alerting::MessageHandler;
use crate::models::Delivery;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<MessageHandler>,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Push endpoint response
#[derive(Debug, Serialize)]
pub struct PushResponse {
    /// Outcome text, absent when the message was acknowledged without one
    pub outcome: Option<String>,
}

/// Receive a Pub/Sub push delivery
///
/// Any 2xx acknowledges the message; a 500 asks Pub/Sub to redeliver.
pub async fn receive_push(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PushResponse>, (StatusCode, String)> {
    let delivery = match Delivery::from_body(&body) {
        Ok(delivery) => delivery,
        Err(e) => {
            warn!(
                error = %e,
                body = %String::from_utf8_lossy(&body),
                "Dropping undecodable push delivery"
            );
            return Ok(Json(PushResponse { outcome: None }));
        }
    };

    debug!(message_id = ?delivery.message_id, "Received budget alert");

    let outcome = state
        .handler
        .handle(&delivery.payload)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(PushResponse {
        outcome: outcome.map(|outcome| outcome.to_string()),
    }))
}
