#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    missing_docs,
    rustdoc::broken_intra_doc_links,
    rustdoc::missing_crate_level_docs
)]

//! Email relay REST API

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use email_relay::{
    domain::communication::emails::EmailServiceImpl,
    infrastructure::{
        email::smtp::{SmtpConfig, SmtpMailer},
        http::{HttpServer, HttpServerConfig},
    },
};
use tracing::{debug, info};

/// Command-line arguments / environment variables
#[derive(Debug, Parser)]
pub struct Args {
    /// The HTTP server configuration
    #[clap(flatten)]
    pub server: HttpServerConfig,

    /// The SMTP connection details
    #[clap(flatten)]
    pub email: SmtpConfig,
}

#[mutants::skip]
#[tokio::main]
async fn main() -> Result<()> {
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    if let Err(e) = dotenv {
        debug!("No .env file loaded: {e}");
    }

    let args = Args::parse();

    info!(
        host = %args.email.host,
        port = args.email.port,
        user = args.email.user.as_deref().unwrap_or("Not configured"),
        "Email configuration"
    );
    info!(
        port = args.server.port,
        mode = ?args.server.mode,
        api_version = %args.server.api_version,
        "Starting email relay"
    );

    let mailer = SmtpMailer::connect(args.email)?;
    let emails = EmailServiceImpl::new(Arc::new(mailer));

    HttpServer::new(emails, args.server).await?.run().await
}
