//! Detection of existing registry objects that overlap the target range.

use crate::ipam::{IpamClient, IpamError};
use crate::prefix::{AddressRange, PrefixError};
use crate::registry::{RegistryError, RegistryTransport, WhoisResponse};
use crate::sync::ReconciliationContext;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum OverlapError {
    #[error("Could not query registry for {range}: status {status}")]
    Query { range: AddressRange, status: u16 },

    #[error("Could not reach registry: {0}")]
    Transport(#[from] RegistryError),

    #[error("Unreadable search result for {range}: {reason}")]
    Unreadable { range: AddressRange, reason: String },

    #[error("IPAM lookup failed: {0}")]
    Ipam(#[from] IpamError),
}

/// Finds a conflicting object for a failed create and decides whether it may go
#[derive(Clone)]
pub struct OverlapResolver {
    transport: Arc<dyn RegistryTransport>,
    ipam: Arc<dyn IpamClient>,
}

impl OverlapResolver {
    pub fn new(transport: Arc<dyn RegistryTransport>, ipam: Arc<dyn IpamClient>) -> Self {
        Self { transport, ipam }
    }

    /// Search the registry for an object of the same type intersecting the
    /// context's range. Returns the candidate only if it differs from the range.
    pub async fn find_overlap(
        &self,
        ctx: &ReconciliationContext,
    ) -> Result<Option<AddressRange>, OverlapError> {
        let range = ctx.range;
        let response = self
            .transport
            .search(ctx.object_type, &range.to_string())
            .await?;

        if response.is_not_found() {
            info!(prefix = %range, "No overlapping prefix found");
            return Ok(None);
        }

        if !response.is_success() {
            return Err(OverlapError::Query {
                range,
                status: response.status,
            });
        }

        let unreadable = |reason: String| OverlapError::Unreadable { range, reason };

        let document: WhoisResponse =
            serde_json::from_str(&response.body).map_err(|e| unreadable(e.to_string()))?;
        let key = document
            .first_primary_key()
            .ok_or_else(|| unreadable("no primary key in search result".to_string()))?;

        let candidate = parse_primary_key(&range, key).map_err(|e| unreadable(e.to_string()))?;
        debug!(prefix = %range, candidate = %candidate, "Search returned candidate");

        if candidate != range {
            info!(prefix = %range, candidate = %candidate, "May overlap with existing object");
            Ok(Some(candidate))
        } else {
            Ok(None)
        }
    }

    /// A candidate may be deleted only if the IPAM knows it neither as prefix nor aggregate
    pub async fn authorize_delete(&self, candidate: &AddressRange) -> Result<bool, OverlapError> {
        if self.ipam.is_known_prefix_or_aggregate(candidate).await? {
            warn!(candidate = %candidate, "Overlapping object is known to the IPAM, not deleting it");
            Ok(false)
        } else {
            info!(
                candidate = %candidate,
                "Overlapping object is neither prefix nor aggregate, authorized to delete it"
            );
            Ok(true)
        }
    }
}

/// Primary keys are CIDR for inet6num and `low - high` for inetnum
fn parse_primary_key(range: &AddressRange, key: &str) -> Result<AddressRange, PrefixError> {
    if range.is_v6() {
        AddressRange::parse(key)
    } else {
        AddressRange::from_legacy_range(key)
    }
}
