//! API error-handling module

use std::fmt;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use utoipa::ToSchema;

use crate::domain::communication::{
    emails::{SendEmailError, SEND_FAILURE_MESSAGE},
    mailer::MailerError,
};

use super::RunMode;

/// Summary returned for schema violations
pub const VALIDATION_FAILED_MESSAGE: &str = "Validation failed";

/// Summary returned when the mail transport cannot be used
pub const SERVICE_UNAVAILABLE_MESSAGE: &str = "Email service unavailable";

/// Summary returned for anything unexpected
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// An error response
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Always `false`
    #[schema(example = false)]
    pub success: bool,

    /// A short summary
    #[schema(example = "Validation failed")]
    pub message: String,

    /// Details of a single failure
    #[schema(example = "Validation failed: Subject is required")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Every schema violation
    #[schema(example = json!(["Recipients are required", "Subject is required"]))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

/// An error raised in the API
#[derive(Debug)]
pub struct ApiError {
    /// The status code
    pub status: StatusCode,

    /// The summary message
    pub message: String,

    /// Details of the failure
    pub detail: Option<String>,

    /// Individual schema violations
    pub errors: Option<Vec<String>>,
}

impl ApiError {
    /// Create a new API error
    pub fn new(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            message: message.to_string(),
            detail: None,
            errors: None,
        }
    }

    /// Create a schema validation error listing every violation
    pub fn new_400(errors: Vec<String>) -> Self {
        Self {
            errors: Some(errors),
            ..Self::new(StatusCode::BAD_REQUEST, VALIDATION_FAILED_MESSAGE)
        }
    }

    /// Create new internal server error
    pub fn new_500(detail: &str) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE).with_detail(detail)
    }

    /// Create a new service unavailable error
    pub fn new_503(detail: &str) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, SERVICE_UNAVAILABLE_MESSAGE)
            .with_detail(detail)
    }

    /// Attach details of the failure
    pub fn with_detail(mut self, detail: &str) -> Self {
        self.detail = Some(detail.to_string());
        self
    }

    /// Drops server-side details unless `mode` allows returning them.
    pub fn for_mode(mut self, mode: RunMode) -> Self {
        if self.status.is_server_error() && !mode.exposes_error_details() {
            self.detail = None;
        }

        self
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{}: {}", self.message, detail),
            None => write!(f, "{}", self.message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                success: false,
                message: self.message,
                error: self.detail,
                errors: self.errors,
            }),
        )
            .into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        error!("Unexpected error: {err:?}");

        ApiError::new_500(&err.to_string())
    }
}

impl From<MailerError> for ApiError {
    fn from(err: MailerError) -> Self {
        if err.is_unavailable() {
            error!("Mail transport unavailable: {err}");

            return ApiError::new_503(&err.to_string());
        }

        match err {
            MailerError::InvalidAddress(_) | MailerError::InvalidMessage(_) => {
                ApiError::new(StatusCode::BAD_REQUEST, SEND_FAILURE_MESSAGE)
                    .with_detail(&err.to_string())
            }
            MailerError::UnknownError(err) => ApiError::from(err),
            other => ApiError::new_500(&other.to_string()),
        }
    }
}

impl From<SendEmailError> for ApiError {
    fn from(err: SendEmailError) -> Self {
        debug!("SendEmailError -> ApiError");

        match err {
            SendEmailError::Validation(_) => {
                ApiError::new(StatusCode::BAD_REQUEST, SEND_FAILURE_MESSAGE)
                    .with_detail(&err.to_string())
            }
            SendEmailError::Mailer(err) => ApiError::from(err),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!("JsonRejection -> ApiError: {rejection}");

        ApiError::new_400(vec![rejection.body_text()])
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use axum::{body::to_bytes, http::StatusCode, response::IntoResponse};
    use testresult::TestResult;

    use super::*;

    #[tokio::test]
    async fn test_error_response() -> TestResult {
        let error = ApiError::new_500("socket closed");

        let response = error.into_response();
        let body = to_bytes(response.into_body(), usize::MAX).await?;

        assert_eq!(
            body,
            r#"{"success":false,"message":"Internal server error","error":"socket closed"}"#
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_validation_response_lists_errors() -> TestResult {
        let error = ApiError::new_400(vec!["Subject is required".to_string()]);

        let response = error.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await?;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            r#"{"success":false,"message":"Validation failed","errors":["Subject is required"]}"#
        );

        Ok(())
    }

    #[test]
    fn test_api_error_from_error() {
        let error = anyhow!("Internal server error");
        let api_error = ApiError::from(error);

        assert_eq!(api_error.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api_error.detail.as_deref(), Some("Internal server error"));
    }

    #[test]
    fn test_production_mode_hides_server_details() {
        let unavailable = ApiError::new_503("connection refused").for_mode(RunMode::Production);
        let bad_request = ApiError::from(SendEmailError::Validation(vec!["x".to_string()]))
            .for_mode(RunMode::Production);

        assert_eq!(unavailable.detail, None);
        assert_eq!(bad_request.detail.as_deref(), Some("Validation failed: x"));
    }

    #[test]
    fn test_development_mode_keeps_server_details() {
        let unavailable = ApiError::new_503("connection refused").for_mode(RunMode::Development);

        assert_eq!(unavailable.detail.as_deref(), Some("connection refused"));
    }

    #[test]
    fn test_send_error_classification() {
        let cases = [
            (
                SendEmailError::Validation(vec!["Subject is required".to_string()]),
                StatusCode::BAD_REQUEST,
                "Failed to send email",
            ),
            (
                SendEmailError::Mailer(MailerError::NotInitialized),
                StatusCode::SERVICE_UNAVAILABLE,
                "Email service unavailable",
            ),
            (
                SendEmailError::Mailer(MailerError::SendFailed("554 rejected".to_string())),
                StatusCode::SERVICE_UNAVAILABLE,
                "Email service unavailable",
            ),
            (
                SendEmailError::Mailer(MailerError::Timeout(30)),
                StatusCode::SERVICE_UNAVAILABLE,
                "Email service unavailable",
            ),
            (
                SendEmailError::Mailer(MailerError::InvalidAddress("x".to_string())),
                StatusCode::BAD_REQUEST,
                "Failed to send email",
            ),
            (
                SendEmailError::Mailer(MailerError::UnknownError(anyhow!("boom"))),
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
            ),
        ];

        for (err, status, message) in cases {
            let api_error = ApiError::from(err);

            assert_eq!(api_error.status, status);
            assert_eq!(api_error.message, message);
        }
    }
}
