//! API handler modules

use std::any::Any;

use axum::{
    body::Body,
    extract::OriginalUri,
    http::{Method, Response, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use super::errors::{ErrorResponse, INTERNAL_ERROR_MESSAGE};

pub mod docs;
pub mod root;
pub mod v1;

/// Returned for any route that does not exist
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NotFoundResponse {
    /// Always `false`
    #[schema(example = false)]
    pub success: bool,

    /// Always "Endpoint not found"
    #[schema(example = "Endpoint not found")]
    pub message: String,

    /// The requested path, including any query string
    #[schema(example = "/api/v1/email/unknown")]
    pub path: String,

    /// The request method
    #[schema(example = "GET")]
    pub method: String,
}

/// Answer unknown routes with a 404 envelope
pub async fn not_found(method: Method, OriginalUri(uri): OriginalUri) -> impl IntoResponse {
    let path = uri
        .path_and_query()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    (
        StatusCode::NOT_FOUND,
        Json(NotFoundResponse {
            success: false,
            message: "Endpoint not found".to_string(),
            path,
            method: method.to_string(),
        }),
    )
}

/// Catch panics and return a 500 error
pub fn panic_handler(err: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let details = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    error!("handler panicked: {details}");

    let error = ErrorResponse {
        success: false,
        message: INTERNAL_ERROR_MESSAGE.to_string(),
        error: None,
        errors: None,
    };

    (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
}
