//! Reports about every registry mutation, successful or not.

use crate::prefix::AddressRange;
use crate::registry::RequestMethod;
use crate::utils::now_iso;
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum NotifyError {
    /// The notification channel itself cannot be reached; treated as misconfiguration
    #[error("Unable to reach notification transport: {0}")]
    Unreachable(String),

    #[error("Failed to send notification: {0}")]
    SendFailed(String),
}

/// What happened to one registry object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Rendered object (or diff, for updates)
    pub object_text: String,
    pub method: RequestMethod,
    pub range: AddressRange,
    pub username: String,
    pub status_code: u16,
    pub errors: Vec<String>,
    pub created_at: String,
}

impl Notification {
    pub fn new(
        object_text: String,
        method: RequestMethod,
        range: AddressRange,
        username: impl Into<String>,
        status_code: u16,
        errors: Vec<String>,
    ) -> Self {
        Self {
            object_text,
            method,
            range,
            username: username.into(),
            status_code,
            errors,
            created_at: now_iso(),
        }
    }

    pub fn succeeded(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// One-line summary, e.g. `POST 2001:db8::/48 has succeeded`
    pub fn subject(&self) -> String {
        format!(
            "{} {} has {}",
            self.method,
            self.range,
            if self.succeeded() { "succeeded" } else { "failed" }
        )
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Notifier that writes reports to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        if notification.succeeded() {
            info!(
                user = %notification.username,
                status = notification.status_code,
                errors = ?notification.errors,
                "{}\n{}",
                notification.subject(),
                notification.object_text
            );
        } else {
            warn!(
                user = %notification.username,
                status = notification.status_code,
                errors = ?notification.errors,
                "{}\n{}",
                notification.subject(),
                notification.object_text
            );
        }
        Ok(())
    }
}
