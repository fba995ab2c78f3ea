use super::TemplateError;
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, error};

/// Read-only access to template documents.
///
/// Documents are re-read on every call so operators can edit templates while
/// the service is running.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Read and parse the JSON document at `path` (relative to the store root).
    async fn read(&self, path: &str) -> Result<Value, TemplateError>;
}

/// Template store backed by a directory on disk
#[derive(Debug, Clone)]
pub struct FsTemplateStore {
    root: PathBuf,
}

impl FsTemplateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl TemplateStore for FsTemplateStore {
    async fn read(&self, path: &str) -> Result<Value, TemplateError> {
        let file = self.root.join(path);
        let shown = file.to_string_lossy().to_string();

        if !file.exists() {
            error!(file = %shown, "No template file");
            return Err(TemplateError::FileNotFound(shown));
        }

        debug!(file = %shown, "Reading template file");
        let content = fs::read_to_string(&file).await?;
        serde_json::from_str(&content).map_err(|source| TemplateError::Malformed {
            path: shown,
            source,
        })
    }
}
