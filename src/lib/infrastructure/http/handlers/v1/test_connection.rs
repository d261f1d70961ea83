//! Connection test handler

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    domain::communication::emails::{ConnectionCheck, EmailService},
    infrastructure::http::state::AppState,
};

/// Ask the email provider whether it will accept connections
#[utoipa::path(
    get,
    operation_id = "test_connection",
    tag = "Email",
    path = "/api/v1/email/test",
    responses(
        (status = StatusCode::OK, description = "Connection is working", body = ConnectionCheck),
        (status = StatusCode::SERVICE_UNAVAILABLE, description = "Connection failed", body = ConnectionCheck, example = json!({"success": false, "message": "Email service connection failed: Email transporter not initialized"})),
    )
)]
pub async fn handler<E: EmailService>(
    State(state): State<AppState<E>>,
) -> (StatusCode, Json<ConnectionCheck>) {
    let check = state.emails.test_connection().await;

    let status = if check.success {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(check))
}
