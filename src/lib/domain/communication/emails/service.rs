//! Email service

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, error, info, warn};

#[cfg(test)]
use mockall::mock;

use crate::domain::communication::mailer::{EmailFields, EmailMessage, Mailer, MailerError};

use super::{ConnectionCheck, SendEmailError, SendResult, SentEmail, CONNECTION_OK_MESSAGE};

/// Email service
#[async_trait]
pub trait EmailService: Clone + Send + Sync + 'static {
    /// Validates and sends an email.
    ///
    /// # Arguments
    /// * `fields` - The raw [`EmailFields`] supplied by the caller.
    ///
    /// # Returns
    /// - [`Ok`] with the [`SentEmail`] details once the transport has accepted the message.
    /// - [`Err`] with [`SendEmailError::Validation`] listing every failed check; the
    ///   transport is not contacted in that case.
    /// - [`Err`] with [`SendEmailError::Mailer`] if the transport failed.
    async fn send_email(&self, fields: EmailFields) -> Result<SentEmail, SendEmailError>;

    /// Sends an email and folds the outcome into a [`SendResult`] envelope. Never fails.
    async fn execute(&self, fields: EmailFields) -> SendResult {
        self.send_email(fields).await.into()
    }

    /// Asks the transport to verify its connection, capturing any failure.
    async fn test_connection(&self) -> ConnectionCheck;
}

#[cfg(test)]
mock! {
    pub EmailService {}

    impl Clone for EmailService {
        fn clone(&self) -> Self;
    }

    #[async_trait]
    impl EmailService for EmailService {
        async fn send_email(&self, fields: EmailFields) -> Result<SentEmail, SendEmailError>;
        async fn execute(&self, fields: EmailFields) -> SendResult;
        async fn test_connection(&self) -> ConnectionCheck;
    }
}

/// Email service implementation
#[derive(Debug, Clone)]
pub struct EmailServiceImpl<M>
where
    M: Mailer,
{
    mailer: Arc<M>,
}

impl<M> EmailServiceImpl<M>
where
    M: Mailer,
{
    /// Creates a new email service sending through `mailer`.
    pub fn new(mailer: Arc<M>) -> Self {
        Self { mailer }
    }
}

#[async_trait]
impl<M> EmailService for EmailServiceImpl<M>
where
    M: Mailer,
{
    async fn send_email(&self, fields: EmailFields) -> Result<SentEmail, SendEmailError> {
        let message = EmailMessage::new(fields);

        let validation = message.validate();

        if !validation.is_valid {
            debug!(errors = ?validation.errors, "email failed validation");

            return Err(SendEmailError::Validation(validation.errors));
        }

        let receipt = self.mailer.send(&message).await.map_err(|err| {
            error!("Failed to send email: {err}");
            err
        })?;

        info!(
            message_id = %receipt.message_id,
            recipients = message.to().len(),
            "email sent"
        );

        Ok(SentEmail {
            message_id: receipt.message_id,
            to: message.to().to_vec(),
            subject: message.subject().to_string(),
            sent_at: Utc::now(),
        })
    }

    async fn test_connection(&self) -> ConnectionCheck {
        match self.mailer.verify().await {
            Ok(()) => ConnectionCheck {
                success: true,
                message: CONNECTION_OK_MESSAGE.to_string(),
            },
            Err(err) => {
                warn!("Email service connection check failed: {err}");

                let detail = match err {
                    MailerError::ConnectionFailed(detail) => detail,
                    other => other.to_string(),
                };

                ConnectionCheck {
                    success: false,
                    message: format!("Email service connection failed: {detail}"),
                }
            }
        }
    }
}
