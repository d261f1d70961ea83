//! Service metadata handlers

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{domain::communication::emails::EmailService, infrastructure::http::state::AppState};

/// Where each part of the service lives
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ServiceEndpoints {
    /// API documentation
    #[schema(example = "/api-docs")]
    pub swagger: String,

    /// Base path of the email routes
    #[schema(example = "/api/v1/email")]
    pub email: String,

    /// Liveness endpoint
    #[schema(example = "/api/v1/email/health")]
    pub health: String,

    /// Transport self-test endpoint
    #[schema(example = "/api/v1/email/test")]
    pub test: String,
}

/// Service metadata
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfoResponse {
    /// Always `true`
    pub success: bool,

    /// Always "Email service is running"
    #[schema(example = "Email service is running")]
    pub message: String,

    /// The service version
    #[schema(example = "1.0.0")]
    pub version: String,

    /// When the response was produced
    pub timestamp: DateTime<Utc>,

    /// The endpoint map
    pub endpoints: ServiceEndpoints,
}

/// The email endpoints, as `METHOD path`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiEndpoints {
    /// Send an email
    #[schema(example = "POST /api/v1/email/send")]
    pub send_email: String,

    /// Check the transport connection
    #[schema(example = "GET /api/v1/email/test")]
    pub test_connection: String,

    /// Health check
    #[schema(example = "GET /api/v1/email/health")]
    pub health_check: String,
}

/// API information
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiInfoResponse {
    /// Always `true`
    pub success: bool,

    /// Always "Email service API"
    #[schema(example = "Email service API")]
    pub message: String,

    /// The API version
    #[schema(example = "v1")]
    pub version: String,

    /// Where the API documentation is served
    #[schema(example = "/api-docs")]
    pub documentation: String,

    /// The email endpoints
    pub endpoints: ApiEndpoints,
}

fn email_base<E: EmailService>(state: &AppState<E>) -> String {
    format!("/api/{}/email", state.config.api_version)
}

/// Describe the service
#[utoipa::path(
    get,
    operation_id = "service_info",
    tag = "System",
    path = "/",
    responses(
        (status = StatusCode::OK, description = "Service metadata", body = ServiceInfoResponse),
    )
)]
pub async fn service_info<E: EmailService>(
    State(state): State<AppState<E>>,
) -> Json<ServiceInfoResponse> {
    let base = email_base(&state);

    Json(ServiceInfoResponse {
        success: true,
        message: "Email service is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        endpoints: ServiceEndpoints {
            swagger: "/api-docs".to_string(),
            health: format!("{base}/health"),
            test: format!("{base}/test"),
            email: base,
        },
    })
}

/// Describe the API
#[utoipa::path(
    get,
    operation_id = "api_info",
    tag = "System",
    path = "/api",
    responses(
        (status = StatusCode::OK, description = "API information", body = ApiInfoResponse),
    )
)]
pub async fn api_info<E: EmailService>(State(state): State<AppState<E>>) -> Json<ApiInfoResponse> {
    let base = email_base(&state);

    Json(ApiInfoResponse {
        success: true,
        message: "Email service API".to_string(),
        version: state.config.api_version.clone(),
        documentation: "/api-docs".to_string(),
        endpoints: ApiEndpoints {
            send_email: format!("POST {base}/send"),
            test_connection: format!("GET {base}/test"),
            health_check: format!("GET {base}/health"),
        },
    })
}
