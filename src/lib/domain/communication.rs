//! Outbound email: addresses, messages, the mailer port and the send operation

pub mod email_addresses;
pub mod emails;
pub mod mailer;
