//! Send email handler

use axum::{extract::State, Json};

use crate::{
    domain::communication::emails::{EmailService, SendResult},
    infrastructure::http::{
        errors::ApiError,
        state::AppState,
        validation::{SendEmailBody, ValidatedJson},
    },
};

/// Send an email
#[utoipa::path(
    post,
    operation_id = "send_email",
    tag = "Email",
    path = "/api/v1/email/send",
    request_body = SendEmailBody,
    responses(
        (status = StatusCode::OK, description = "Email sent", body = SendResult),
        (status = StatusCode::BAD_REQUEST, description = "Validation failed", body = ErrorResponse, example = json!({"success": false, "message": "Validation failed", "errors": ["Recipients are required"]})),
        (status = StatusCode::SERVICE_UNAVAILABLE, description = "Email service unavailable", body = ErrorResponse, example = json!({"success": false, "message": "Email service unavailable", "error": "Email transporter not initialized"})),
        (status = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal server error", body = ErrorResponse),
    )
)]
pub async fn handler<E: EmailService>(
    State(state): State<AppState<E>>,
    ValidatedJson(body): ValidatedJson<SendEmailBody>,
) -> Result<Json<SendResult>, ApiError> {
    let sent = state
        .emails
        .send_email(body.into())
        .await
        .map_err(|err| ApiError::from(err).for_mode(state.config.mode))?;

    Ok(Json(SendResult::sent(sent)))
}
