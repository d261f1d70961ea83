//! Mailer port: the transport the send operation hands validated messages to

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg(test)]
use mockall::mock;

mod errors;
mod message;

pub use errors::MailerError;
pub use message::{
    Attachment, AttachmentContent, EmailFields, EmailMessage, Validation, MAX_SUBJECT_LENGTH,
};

/// The transport's acknowledgement of a sent message
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    /// The `Message-ID` header of the sent message
    pub message_id: String,

    /// The provider's final response line(s)
    pub response: String,

    /// Recipients the provider accepted
    pub accepted: Vec<String>,

    /// Recipients the provider rejected
    pub rejected: Vec<String>,
}

/// Email transport
#[async_trait]
pub trait Mailer: Clone + Send + Sync + 'static {
    /// Send an email
    ///
    /// # Arguments
    /// * `message` - The [`EmailMessage`] to send. Callers are expected to have validated it.
    ///
    /// # Returns
    /// A [`Receipt`] from the provider, or a [`MailerError`] if the transport is not
    /// initialised or the provider refused the message.
    async fn send(&self, message: &EmailMessage) -> Result<Receipt, MailerError>;

    /// Checks that the provider is reachable and accepts our credentials.
    async fn verify(&self) -> Result<(), MailerError>;
}

#[cfg(test)]
mock! {
    pub Mailer {}

    impl Clone for Mailer {
        fn clone(&self) -> Self;
    }

    #[async_trait]
    impl Mailer for Mailer {
        async fn send(&self, message: &EmailMessage) -> Result<Receipt, MailerError>;
        async fn verify(&self) -> Result<(), MailerError>;
    }
}

#[cfg(test)]
pub mod tests {
    pub use super::MockMailer;
}
