/// File name prefix for object backups
pub const BACKUP_PREFIX: &str = "prefix_";

/// Extension of backup documents
pub const BACKUP_EXTENSION: &str = "json";

/// Get current timestamp in ISO 8601 format
pub fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Build a filesystem-safe backup key for a prefix (`2001:db8::/32` -> `prefix_2001:db8::_32.json`)
pub fn backup_key(prefix: &str) -> String {
    format!(
        "{}{}.{}",
        BACKUP_PREFIX,
        prefix.replace('/', "_"),
        BACKUP_EXTENSION
    )
}
