//! Application state module

use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};

use crate::domain::communication::emails::EmailService;

use super::RunMode;

/// Application configuration
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// The API version segment of the email routes
    pub api_version: String,

    /// The runtime mode
    pub mode: RunMode,
}

/// Global application state
#[derive(Clone)]
pub struct AppState<E: EmailService> {
    /// The time the server started
    pub start_time: DateTime<Utc>,

    /// The application configuration
    pub config: AppConfig,

    /// Email service
    pub emails: Arc<E>,
}

impl<E> AppState<E>
where
    E: EmailService,
{
    /// Create a new application state
    pub fn new(config: AppConfig, emails: E) -> Self {
        Self {
            start_time: Utc::now(),
            config,
            emails: Arc::new(emails),
        }
    }
}

impl<E> fmt::Debug for AppState<E>
where
    E: EmailService,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("start_time", &self.start_time)
            .field("config", &self.config)
            .field("emails", &"EmailService")
            .finish()
    }
}

#[cfg(test)]
use crate::domain::communication::emails::tests::MockEmailService;

/// State for router tests, in development mode on `v1`
#[cfg(test)]
pub fn test_state(emails: Option<MockEmailService>) -> AppState<MockEmailService> {
    let config = AppConfig {
        api_version: "v1".to_string(),
        mode: RunMode::Development,
    };

    AppState::new(config, emails.unwrap_or_else(MockEmailService::new))
}
