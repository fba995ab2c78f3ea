use super::store::TemplateStore;
use super::types::{MasterTemplate, ResolvedTemplate, TemplateDocument};
use super::TemplateError;
use std::sync::Arc;
use tracing::info;

/// Name of the template index document inside the template store
pub const TEMPLATES_FILE: &str = "templates.json";

/// Loads a named template and the master template it inherits from.
#[derive(Clone)]
pub struct TemplateResolver {
    store: Arc<dyn TemplateStore>,
}

impl TemplateResolver {
    pub fn new(store: Arc<dyn TemplateStore>) -> Self {
        Self { store }
    }

    /// Resolve `name` into its own attributes and its master's attributes.
    pub async fn resolve(&self, name: &str) -> Result<ResolvedTemplate, TemplateError> {
        info!(template = %name, file = TEMPLATES_FILE, "Reading template");
        let document = self.store.read(TEMPLATES_FILE).await?;
        let document: TemplateDocument =
            serde_json::from_value(document).map_err(|source| TemplateError::Malformed {
                path: TEMPLATES_FILE.to_string(),
                source,
            })?;

        let definition = document
            .templates
            .get(name)
            .ok_or_else(|| TemplateError::TemplateNotFound(name.to_string()))?;

        info!(template = %name, master = %definition.inherit, "Reading master template");
        let master = self.store.read(&definition.inherit).await?;
        let master: MasterTemplate =
            serde_json::from_value(master).map_err(|source| TemplateError::Malformed {
                path: definition.inherit.clone(),
                source,
            })?;

        Ok(ResolvedTemplate {
            name: name.to_string(),
            attributes: definition.attributes.clone(),
            master: master.attributes,
        })
    }
}
