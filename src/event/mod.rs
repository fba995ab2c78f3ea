//! The IPAM webhook payload, parsed and checked once at the boundary.

mod types;

pub use types::{CustomFields, EventAction, EventData, Labeled, PrefixEvent, Site, WebhookEvent};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EventError {
    #[error("Request payload must be application/json: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Not a valid IPAM request. Key not found: {0}")]
    MissingField(&'static str),

    #[error("Only prefixes are supported (got model '{0}')")]
    UnsupportedModel(String),
}
