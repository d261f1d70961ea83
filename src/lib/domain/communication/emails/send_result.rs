//! Result envelopes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::SendEmailError;

/// Envelope message for a sent email
pub const SEND_SUCCESS_MESSAGE: &str = "Email sent successfully";

/// Envelope message for any email that was not sent
pub const SEND_FAILURE_MESSAGE: &str = "Failed to send email";

/// Envelope message for a successful connection check
pub const CONNECTION_OK_MESSAGE: &str = "Email service connection is working";

/// Details of a sent email
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SentEmail {
    /// The provider-facing message ID
    #[schema(example = "<0190f5c4-7d1e-7c61-a1c4-5a2b9b8e1f00@example.com>")]
    pub message_id: String,

    /// The recipients, as given
    #[schema(example = json!(["recipient@example.com"]))]
    pub to: Vec<String>,

    /// The subject, as given
    #[schema(example = "Test Email Subject")]
    pub subject: String,

    /// When the transport acknowledged the message
    pub sent_at: DateTime<Utc>,
}

/// The uniform `{success, message, data | error}` outcome of a send
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SendResult {
    /// Whether the email was sent
    #[schema(example = true)]
    pub success: bool,

    /// A fixed human-readable summary
    #[schema(example = "Email sent successfully")]
    pub message: String,

    /// Present on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<SentEmail>,

    /// Present on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SendResult {
    /// A successful send
    pub fn sent(data: SentEmail) -> Self {
        Self {
            success: true,
            message: SEND_SUCCESS_MESSAGE.to_string(),
            data: Some(data),
            error: None,
        }
    }

    /// A failed send, with `error` as the detail
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: SEND_FAILURE_MESSAGE.to_string(),
            data: None,
            error: Some(error.into()),
        }
    }
}

impl From<Result<SentEmail, SendEmailError>> for SendResult {
    fn from(result: Result<SentEmail, SendEmailError>) -> Self {
        match result {
            Ok(data) => SendResult::sent(data),
            Err(err) => SendResult::failed(err.to_string()),
        }
    }
}

/// Outcome of a connectivity self-test
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ConnectionCheck {
    /// Whether the provider answered
    pub success: bool,

    /// What happened
    #[schema(example = "Email service connection is working")]
    pub message: String,
}
