use super::{IpamClient, IpamError};
use crate::event::Labeled;
use crate::prefix::AddressRange;
use crate::template::TemplateStore;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info, warn};

/// Template-store document mapping LIR labels to registry organisations
pub const LIR_ORG_FILE: &str = "lir_org.json";

#[derive(Debug, Clone, Deserialize)]
pub struct InventoryAggregate {
    pub prefix: AddressRange,
    #[serde(default)]
    pub lir: Option<Labeled>,
}

/// Exported IPAM state: aggregates with their LIR, active prefixes, site countries
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub aggregates: Vec<InventoryAggregate>,
    #[serde(default)]
    pub prefixes: Vec<AddressRange>,
    /// Site slug -> ISO 3166 alpha-2 country
    #[serde(default)]
    pub sites: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct LirOrgDocument {
    templates: LirOrgTemplates,
}

#[derive(Debug, Deserialize)]
struct LirOrgTemplates {
    lir_org: HashMap<String, String>,
}

/// IPAM client answering from an exported inventory file
pub struct InventoryIpam {
    inventory: Inventory,
    templates: Arc<dyn TemplateStore>,
}

impl InventoryIpam {
    pub fn new(inventory: Inventory, templates: Arc<dyn TemplateStore>) -> Self {
        Self {
            inventory,
            templates,
        }
    }

    /// Load the inventory from a JSON file
    pub async fn load(path: &Path, templates: Arc<dyn TemplateStore>) -> Result<Self, IpamError> {
        let content = fs::read_to_string(path).await?;
        let inventory: Inventory = serde_json::from_str(&content)?;
        info!(
            aggregates = inventory.aggregates.len(),
            prefixes = inventory.prefixes.len(),
            sites = inventory.sites.len(),
            "Loaded IPAM inventory"
        );
        Ok(Self::new(inventory, templates))
    }

    /// Most specific aggregate covering `range`
    fn aggregate_for(&self, range: &AddressRange) -> Option<&InventoryAggregate> {
        self.inventory
            .aggregates
            .iter()
            .filter(|a| a.prefix.contains(range))
            .max_by_key(|a| a.prefix.prefix_len())
    }
}

#[async_trait]
impl IpamClient for InventoryIpam {
    async fn lookup_org(&self, range: &AddressRange) -> Result<Option<String>, IpamError> {
        let Some(aggregate) = self.aggregate_for(range) else {
            warn!(prefix = %range, "No aggregate covers prefix");
            return Ok(None);
        };
        let Some(lir) = aggregate.lir.as_ref().map(|l| l.as_str().to_lowercase()) else {
            warn!(aggregate = %aggregate.prefix, "Aggregate has no LIR");
            return Ok(None);
        };

        let document = self.templates.read(LIR_ORG_FILE).await?;
        let document: LirOrgDocument = serde_json::from_value(document)?;

        let org = document
            .templates
            .lir_org
            .into_iter()
            .find(|(name, _)| name.to_lowercase() == lir)
            .map(|(_, org)| org);

        debug!(prefix = %range, lir = %lir, org = ?org, "Resolved organisation");
        Ok(org)
    }

    async fn lookup_country(&self, site: &str) -> Result<Option<String>, IpamError> {
        let country = self.inventory.sites.get(site).map(|c| c.to_uppercase());
        debug!(site = %site, country = ?country, "Resolved country");
        Ok(country)
    }

    async fn is_known_prefix_or_aggregate(
        &self,
        range: &AddressRange,
    ) -> Result<bool, IpamError> {
        let is_prefix = self.inventory.prefixes.iter().any(|p| p == range);
        let is_aggregate = self.inventory.aggregates.iter().any(|a| &a.prefix == range);
        debug!(prefix = %range, is_prefix, is_aggregate, "Searched IPAM");
        Ok(is_prefix || is_aggregate)
    }
}
