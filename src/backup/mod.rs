//! Storage for the previous state of registry objects, written before every mutation.

mod store;

pub use store::{BackupStore, DisabledBackupStore, FsBackupStore};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Backup not found: {0}")]
    NotFound(String),

    #[error("Invalid backup key: {0}")]
    InvalidKey(String),
}
