use crate::prefix::AddressRange;
use std::fmt;

/// Why an event was skipped without touching the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    TooSmall(String),
    NotRoutable(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::TooSmall(msg) => write!(f, "ErrorSmallPrefix, skipping request: {}", msg),
            SkipReason::NotRoutable(msg) => write!(f, "NotRoutedNetwork, skipping request: {}", msg),
        }
    }
}

/// What was done to the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Created,
    Updated,
    Deleted,
    /// Delete requested but the object did not exist
    AlreadyAbsent,
}

/// Result of a completed reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub action: SyncAction,
    pub range: AddressRange,
    pub status_code: u16,
    pub errors: Vec<String>,
    /// Overlapping object removed before the create could succeed
    pub deleted_overlap: Option<AddressRange>,
}

/// Non-failing outcomes of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Completed(SyncReport),
    Skipped(SkipReason),
}

impl SyncOutcome {
    /// HTTP-equivalent status reported upstream
    pub fn status_code(&self) -> u16 {
        match self {
            SyncOutcome::Completed(_) => 204,
            SyncOutcome::Skipped(_) => 200,
        }
    }
}
