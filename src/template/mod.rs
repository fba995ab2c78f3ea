mod resolver;
mod store;
mod types;

pub use resolver::{TemplateResolver, TEMPLATES_FILE};
pub use store::{FsTemplateStore, TemplateStore};
pub use types::{
    Attribute, AttributeList, MasterTemplate, ResolvedTemplate, TemplateDefinition,
    TemplateDocument,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("No template file {0}")]
    FileNotFound(String),

    #[error("Malformed template file {path}: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Template '{0}' not found")]
    TemplateNotFound(String),
}
