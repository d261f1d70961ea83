//! The send-email operation and its result envelope

mod errors;
mod send_result;
mod service;

pub use errors::SendEmailError;
pub use send_result::{
    ConnectionCheck, SendResult, SentEmail, CONNECTION_OK_MESSAGE, SEND_FAILURE_MESSAGE,
    SEND_SUCCESS_MESSAGE,
};
pub use service::{EmailService, EmailServiceImpl};
