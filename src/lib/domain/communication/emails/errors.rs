//! Send-email errors

use thiserror::Error;
use tracing::debug;

use crate::domain::communication::mailer::MailerError;

/// Why an email was not sent
#[derive(Debug, Error)]
pub enum SendEmailError {
    /// The message failed one or more checks; nothing was handed to the transport
    #[error("Validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),

    /// The transport failed
    #[error(transparent)]
    Mailer(MailerError),
}

impl From<MailerError> for SendEmailError {
    fn from(err: MailerError) -> Self {
        debug!("MailerError -> SendEmailError");

        SendEmailError::Mailer(err)
    }
}
