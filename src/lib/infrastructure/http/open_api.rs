//! OpenAPI module

use utoipa::OpenApi;

use crate::{
    domain::communication::{
        emails::{ConnectionCheck, SendResult, SentEmail},
        mailer::AttachmentContent,
    },
    infrastructure::http::{
        errors::ErrorResponse,
        handlers::{root, v1::*, NotFoundResponse},
        validation::{AttachmentBody, SendEmailBody},
    },
};

#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "Email Relay API"),
    paths(
        send_email::handler,
        test_connection::handler,
        health::handler,
        root::service_info,
        root::api_info
    ),
    components(schemas(
        SendEmailBody,
        AttachmentBody,
        AttachmentContent,
        SendResult,
        SentEmail,
        ConnectionCheck,
        health::HealthResponse,
        root::ServiceInfoResponse,
        root::ServiceEndpoints,
        root::ApiInfoResponse,
        root::ApiEndpoints,
        NotFoundResponse,
        ErrorResponse,
    ))
)]
pub struct ApiDocs;
