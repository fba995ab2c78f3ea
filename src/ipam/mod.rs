//! Lookups against the IP address management system.

mod inventory;

pub use inventory::{Inventory, InventoryAggregate, InventoryIpam, LIR_ORG_FILE};

use crate::prefix::AddressRange;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IpamError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Malformed IPAM inventory: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Template error: {0}")]
    TemplateError(#[from] crate::template::TemplateError),
}

/// The IPAM collaborator used to enrich and guard registry objects
#[async_trait]
pub trait IpamClient: Send + Sync {
    /// Registry organisation responsible for the range, derived from its aggregate's LIR
    async fn lookup_org(&self, range: &AddressRange) -> Result<Option<String>, IpamError>;

    /// ISO 3166 alpha-2 country of a site
    async fn lookup_country(&self, site: &str) -> Result<Option<String>, IpamError>;

    /// Whether the range is registered as an active prefix or an aggregate
    async fn is_known_prefix_or_aggregate(&self, range: &AddressRange)
        -> Result<bool, IpamError>;
}
