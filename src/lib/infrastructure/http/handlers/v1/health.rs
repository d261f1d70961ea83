//! Health handler

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{domain::communication::emails::EmailService, infrastructure::http::state::AppState};

/// The health response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Always `true`
    pub success: bool,

    /// Always "Email service is running"
    #[schema(example = "Email service is running")]
    pub message: String,

    /// When the response was produced
    pub timestamp: DateTime<Utc>,

    /// The service version
    #[schema(example = "1.0.0")]
    pub version: String,

    /// The uptime of the application in seconds
    #[schema(example = 123)]
    pub uptime: i64,
}

/// Report that the service is alive, without touching the transport
#[utoipa::path(
    get,
    operation_id = "health",
    tag = "Email",
    path = "/api/v1/email/health",
    responses(
        (status = StatusCode::OK, description = "Service is running", body = HealthResponse),
    )
)]
pub async fn handler<E: EmailService>(State(state): State<AppState<E>>) -> Json<HealthResponse> {
    let now = Utc::now();

    Json(HealthResponse {
        success: true,
        message: "Email service is running".to_string(),
        timestamp: now,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: now.timestamp() - state.start_time.timestamp(),
    })
}
