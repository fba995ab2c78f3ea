use super::BackupError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Where raw registry objects are saved before they are changed
#[async_trait]
pub trait BackupStore: Send + Sync {
    async fn put(&self, key: &str, content: &[u8]) -> Result<(), BackupError>;

    async fn get(&self, key: &str) -> Result<Vec<u8>, BackupError>;

    /// All stored keys, sorted
    async fn list(&self) -> Result<Vec<String>, BackupError>;
}

/// Backups as files in a local directory
#[derive(Debug, Clone)]
pub struct FsBackupStore {
    root: PathBuf,
}

impl FsBackupStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, BackupError> {
        if key.is_empty() || key.contains('/') || key.contains('\\') || key.starts_with('.') {
            return Err(BackupError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl BackupStore for FsBackupStore {
    async fn put(&self, key: &str, content: &[u8]) -> Result<(), BackupError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.root).await?;

        // Write atomically using temp file + rename
        let temp_path = self.root.join(format!(".{}.tmp", key));
        fs::write(&temp_path, content).await?;
        fs::rename(&temp_path, &path).await?;

        info!(key = %key, "Saved backup");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, BackupError> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Err(BackupError::NotFound(key.to_string()));
        }
        Ok(fs::read(&path).await?)
    }

    async fn list(&self) -> Result<Vec<String>, BackupError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut keys: Vec<String> = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| e.file_name().to_str().map(str::to_string))
            .filter(|name| !name.starts_with('.'))
            .collect();
        keys.sort();

        debug!(count = keys.len(), "Listed backups");
        Ok(keys)
    }
}

/// Backup store used when backups are switched off: accepts and forgets everything
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledBackupStore;

#[async_trait]
impl BackupStore for DisabledBackupStore {
    async fn put(&self, key: &str, _content: &[u8]) -> Result<(), BackupError> {
        debug!(key = %key, "Backups disabled, not saving");
        Ok(())
    }

    async fn get(&self, _key: &str) -> Result<Vec<u8>, BackupError> {
        Ok(Vec::new())
    }

    async fn list(&self) -> Result<Vec<String>, BackupError> {
        Ok(Vec::new())
    }
}
