//! Reconciliation of one webhook event against the registry.

mod context;
mod outcome;
mod reconciler;

pub use context::ReconciliationContext;
pub use outcome::{SkipReason, SyncAction, SyncOutcome, SyncReport};
pub use reconciler::{Collaborators, Reconciler, OVERLAP_RETRIES};

use crate::config::ConfigError;
use crate::event::EventError;
use crate::ipam::IpamError;
use crate::overlap::OverlapError;
use crate::prefix::PrefixError;
use crate::registry::RegistryError;
use crate::template::TemplateError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("{0}")]
    TooSmallRange(PrefixError),

    #[error("{0}")]
    NonRoutableRange(PrefixError),

    #[error("Missing required field: {0}")]
    MissingRequiredField(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Registry request failed: {0}")]
    RegistryRequestError(String),

    #[error("Registry query failed: {0}")]
    RegistryQueryError(String),

    #[error("IPAM lookup failed: {0}")]
    IpamLookupError(#[from] IpamError),
}

impl SyncError {
    /// Benign conditions reported upstream as skips, not failures
    pub fn is_skip(&self) -> bool {
        matches!(self, SyncError::TooSmallRange(_) | SyncError::NonRoutableRange(_))
    }

    /// HTTP-equivalent status reported upstream
    pub fn status_code(&self) -> u16 {
        match self {
            SyncError::TooSmallRange(_) | SyncError::NonRoutableRange(_) => 200,
            SyncError::MissingRequiredField(_) => 400,
            _ => 500,
        }
    }

    /// The skip reason, for benign conditions
    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            SyncError::TooSmallRange(e) => Some(SkipReason::TooSmall(e.to_string())),
            SyncError::NonRoutableRange(e) => Some(SkipReason::NotRoutable(e.to_string())),
            _ => None,
        }
    }
}

impl From<PrefixError> for SyncError {
    fn from(e: PrefixError) -> Self {
        match e {
            PrefixError::TooSmall { .. } => SyncError::TooSmallRange(e),
            PrefixError::NotRoutable(_) => SyncError::NonRoutableRange(e),
            PrefixError::InvalidRange(_) | PrefixError::HostBitsSet(_) => {
                SyncError::MissingRequiredField(format!("data.prefix: {}", e))
            }
        }
    }
}

impl From<EventError> for SyncError {
    fn from(e: EventError) -> Self {
        SyncError::MissingRequiredField(e.to_string())
    }
}

impl From<TemplateError> for SyncError {
    fn from(e: TemplateError) -> Self {
        SyncError::ConfigurationError(e.to_string())
    }
}

impl From<ConfigError> for SyncError {
    fn from(e: ConfigError) -> Self {
        SyncError::ConfigurationError(e.to_string())
    }
}

impl From<RegistryError> for SyncError {
    fn from(e: RegistryError) -> Self {
        SyncError::RegistryRequestError(e.to_string())
    }
}

impl From<OverlapError> for SyncError {
    fn from(e: OverlapError) -> Self {
        match e {
            OverlapError::Ipam(e) => SyncError::IpamLookupError(e),
            other => SyncError::RegistryQueryError(other.to_string()),
        }
    }
}
