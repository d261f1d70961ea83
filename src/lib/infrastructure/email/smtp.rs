//! SMTP email service implementation

use std::{fmt, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{ArgAction, Parser};
use lettre::{
    message::{
        header::ContentType, Attachment as MailAttachment, Mailbox, MultiPart, SinglePart,
    },
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tokio::{task::JoinHandle, time::timeout};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::communication::{
    email_addresses::EmailAddress,
    mailer::{EmailMessage, Mailer, MailerError, Receipt},
};

const DEFAULT_ATTACHMENT_TYPE: &str = "application/octet-stream";

/// SMTP configuration
#[derive(Clone, Debug, PartialEq, Eq, Parser)]
pub struct SmtpConfig {
    /// The SMTP host
    #[arg(
        id = "email_host",
        long = "email-host",
        env = "EMAIL_HOST",
        default_value = "smtp.gmail.com"
    )]
    pub host: String,

    /// The SMTP port
    #[arg(
        id = "email_port",
        long = "email-port",
        env = "EMAIL_PORT",
        default_value = "587"
    )]
    pub port: u16,

    /// Connect over TLS straight away instead of upgrading with STARTTLS
    #[arg(
        id = "email_secure",
        long = "email-secure",
        env = "EMAIL_SECURE",
        default_value = "false",
        action = ArgAction::Set
    )]
    pub secure: bool,

    /// The SMTP username, also the default sender. No transport is built without it.
    #[arg(id = "email_user", long = "email-user", env = "EMAIL_USER")]
    pub user: Option<String>,

    /// The SMTP password
    #[arg(id = "email_pass", long = "email-pass", env = "EMAIL_PASS")]
    pub pass: Option<String>,

    /// Verify the provider's TLS certificate
    #[arg(
        id = "email_verify_tls",
        long = "email-verify-tls",
        env = "EMAIL_VERIFY_TLS",
        default_value = "true",
        action = ArgAction::Set
    )]
    pub verify_tls: bool,

    /// Upper bound on a single send or verify, in seconds
    #[arg(
        id = "email_timeout_secs",
        long = "email-timeout-secs",
        env = "EMAIL_TIMEOUT_SECS",
        default_value = "30"
    )]
    pub timeout_secs: u64,
}

/// SMTP mailer
#[derive(Clone)]
pub struct SmtpMailer {
    transport: Option<Arc<AsyncSmtpTransport<Tokio1Executor>>>,
    sender: Option<String>,
    timeout: Duration,
}

impl SmtpMailer {
    /// Creates a new SMTP mailer without touching the network.
    ///
    /// When no user is configured the mailer is created uninitialised: every send and
    /// verify fails with [`MailerError::NotInitialized`].
    pub fn new(config: SmtpConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);

        let Some(user) = config.user.clone() else {
            warn!("EMAIL_USER is not set, email sending is disabled");

            return Ok(Self {
                transport: None,
                sender: None,
                timeout,
            });
        };

        let tls_parameters = TlsParameters::builder(config.host.clone())
            .dangerous_accept_invalid_certs(!config.verify_tls)
            .build()
            .context("failed to build SMTP TLS parameters")?;

        let tls = if config.secure {
            Tls::Wrapper(tls_parameters)
        } else {
            Tls::Opportunistic(tls_parameters)
        };

        let creds = Credentials::new(user.clone(), config.pass.clone().unwrap_or_default());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
            .port(config.port)
            .tls(tls)
            .credentials(creds)
            .timeout(Some(timeout))
            .build();

        debug!(
            "SMTP transport configured for {}:{} as {}",
            config.host, config.port, user
        );

        Ok(Self {
            transport: Some(Arc::new(transport)),
            sender: Some(user),
            timeout,
        })
    }

    /// Creates a new SMTP mailer and verifies the connection in the background.
    ///
    /// Verification failures are only logged; must be called within a tokio runtime.
    pub fn connect(config: SmtpConfig) -> Result<Self> {
        let mailer = Self::new(config)?;

        mailer.spawn_verification();

        Ok(mailer)
    }

    /// Verifies the connection on a background task, logging the outcome.
    pub fn spawn_verification(&self) -> JoinHandle<()> {
        let mailer = self.clone();

        tokio::spawn(async move {
            match mailer.verify().await {
                Ok(()) => info!("Email transporter is ready to send messages"),
                Err(err) => warn!("Email transporter verification failed: {err}"),
            }
        })
    }

    fn transport(&self) -> Result<&AsyncSmtpTransport<Tokio1Executor>, MailerError> {
        self.transport
            .as_deref()
            .ok_or(MailerError::NotInitialized)
    }

    /// Builds the wire message, returning it with its generated `Message-ID`.
    fn build_message(&self, message: &EmailMessage) -> Result<(Message, String), MailerError> {
        let sender = message
            .from()
            .or(self.sender.as_deref())
            .ok_or(MailerError::NotInitialized)?;
        let sender = EmailAddress::new(sender)?;

        let message_id = format!("<{}@{}>", Uuid::now_v7(), sender.domain());

        let mut builder = Message::builder()
            .from(mailbox(&sender)?)
            .subject(message.subject())
            .message_id(Some(message_id.clone()));

        for to in message.to() {
            builder = builder.to(mailbox(&EmailAddress::new(to)?)?);
        }

        for cc in message.cc() {
            builder = builder.cc(mailbox(&EmailAddress::new(cc)?)?);
        }

        for bcc in message.bcc() {
            builder = builder.bcc(mailbox(&EmailAddress::new(bcc)?)?);
        }

        let content = match (message.text(), message.html()) {
            (Some(text), Some(html)) => Content::Multi(MultiPart::alternative_plain_html(
                text.to_string(),
                html.to_string(),
            )),
            (Some(text), None) => Content::Single(SinglePart::plain(text.to_string())),
            (None, Some(html)) => Content::Single(SinglePart::html(html.to_string())),
            (None, None) => {
                return Err(MailerError::InvalidMessage(
                    "email has neither text nor html content".to_string(),
                ))
            }
        };

        let email = if message.attachments().is_empty() {
            match content {
                Content::Single(part) => builder.singlepart(part),
                Content::Multi(part) => builder.multipart(part),
            }
        } else {
            let mut mixed = match content {
                Content::Single(part) => MultiPart::mixed().singlepart(part),
                Content::Multi(part) => MultiPart::mixed().multipart(part),
            };

            for attachment in message.attachments() {
                let raw_type = attachment
                    .content_type
                    .as_deref()
                    .unwrap_or(DEFAULT_ATTACHMENT_TYPE);

                let content_type = ContentType::parse(raw_type).map_err(|e| {
                    MailerError::InvalidMessage(format!(
                        "attachment \"{}\" has invalid content type \"{raw_type}\": {e}",
                        attachment.filename
                    ))
                })?;

                mixed = mixed.singlepart(
                    MailAttachment::new(attachment.filename.clone())
                        .body(attachment.decoded_content()?, content_type),
                );
            }

            builder.multipart(mixed)
        };

        let email = email.map_err(|e| MailerError::InvalidMessage(e.to_string()))?;

        Ok((email, message_id))
    }
}

impl fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("initialized", &self.transport.is_some())
            .field("sender", &self.sender)
            .field("timeout", &self.timeout)
            .finish()
    }
}

enum Content {
    Single(SinglePart),
    Multi(MultiPart),
}

fn mailbox(address: &EmailAddress) -> Result<Mailbox, MailerError> {
    address
        .as_ref()
        .parse()
        .map_err(|e| MailerError::InvalidAddress(format!("\"{address}\": {e}")))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<Receipt, MailerError> {
        let transport = self.transport()?;

        let (email, message_id) = self.build_message(message)?;

        let accepted = email
            .envelope()
            .to()
            .iter()
            .map(ToString::to_string)
            .collect();

        let response = timeout(self.timeout, transport.send(email))
            .await
            .map_err(|_| MailerError::Timeout(self.timeout.as_secs()))?
            .map_err(|e| MailerError::SendFailed(e.to_string()))?;

        Ok(Receipt {
            message_id,
            response: format!(
                "{} {}",
                response.code(),
                response.message().collect::<Vec<_>>().join(" ")
            ),
            accepted,
            rejected: vec![],
        })
    }

    async fn verify(&self) -> Result<(), MailerError> {
        let transport = self.transport()?;

        let connected = timeout(self.timeout, transport.test_connection())
            .await
            .map_err(|_| MailerError::Timeout(self.timeout.as_secs()))?
            .map_err(|e| MailerError::ConnectionFailed(e.to_string()))?;

        if connected {
            Ok(())
        } else {
            Err(MailerError::ConnectionFailed(
                "server did not answer NOOP".to_string(),
            ))
        }
    }
}
