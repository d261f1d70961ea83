//! Mailer errors

use thiserror::Error;

use crate::domain::communication::email_addresses::EmailAddressError;

/// Mailer errors
#[derive(Debug, Error)]
pub enum MailerError {
    /// No SMTP transport was configured
    #[error("Email transporter not initialized")]
    NotInitialized,

    /// An address could not be turned into a mailbox
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// The message could not be assembled
    #[error("Could not build email: {0}")]
    InvalidMessage(String),

    /// The provider refused the message or the connection dropped mid-send
    #[error("Email sending failed: {0}")]
    SendFailed(String),

    /// The provider could not be reached or refused our credentials
    #[error("Email service connection failed: {0}")]
    ConnectionFailed(String),

    /// The provider did not answer in time
    #[error("SMTP request timed out after {0} seconds")]
    Timeout(u64),

    /// Unknown error
    #[error(transparent)]
    UnknownError(anyhow::Error),
}

impl MailerError {
    /// Whether the error means the provider is unusable right now, as opposed to the
    /// message being at fault.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::NotInitialized
                | Self::SendFailed(_)
                | Self::ConnectionFailed(_)
                | Self::Timeout(_)
        )
    }
}

impl From<anyhow::Error> for MailerError {
    fn from(err: anyhow::Error) -> Self {
        MailerError::UnknownError(err)
    }
}

impl From<EmailAddressError> for MailerError {
    fn from(err: EmailAddressError) -> Self {
        MailerError::InvalidAddress(err.to_string())
    }
}
