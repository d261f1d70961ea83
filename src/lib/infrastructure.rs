//! Adapters: the SMTP mailer and the HTTP surface

pub mod email;
pub mod http;
