use crate::prefix::{IpVersion, DEFAULT_SMALLEST_PREFIX_V4, DEFAULT_SMALLEST_PREFIX_V6};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Please set RIPE_DB to RIPE or TEST (got '{0}')")]
    InvalidEnvironment(String),

    #[error("Default country must be in ISO 3166 alpha-2 format (got '{0}')")]
    InvalidDefaultCountry(String),
}

/// Which registry database objects are written to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    /// The production database (`RIPE`)
    Production,
    /// The test database (`TEST`), where maintainers, contacts and orgs are substituted
    Sandbox,
}

impl Environment {
    /// Source identifier of the database
    pub fn id(&self) -> &'static str {
        match self {
            Environment::Production => "RIPE",
            Environment::Sandbox => "TEST",
        }
    }

    /// Base URL of the object REST API
    pub fn rest_base(&self) -> &'static str {
        match self {
            Environment::Production => "https://rest.db.ripe.net/ripe",
            Environment::Sandbox => "https://rest-test.db.ripe.net/test",
        }
    }

    /// Base URL of the search API
    pub fn search_base(&self) -> &'static str {
        match self {
            Environment::Production => "https://rest.db.ripe.net/search",
            Environment::Sandbox => "https://rest-test.db.ripe.net/search",
        }
    }

    pub fn is_sandbox(&self) -> bool {
        matches!(self, Environment::Sandbox)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "RIPE" => Ok(Environment::Production),
            "TEST" => Ok(Environment::Sandbox),
            other => Err(ConfigError::InvalidEnvironment(other.to_string())),
        }
    }
}

/// Values forced onto objects written to the sandbox database, where the
/// production maintainers, contacts and organisations do not exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxOverrides {
    pub org: String,
    pub maintainer: String,
    pub contact: String,
    pub status_v4: String,
    pub status_v6: String,
}

impl SandboxOverrides {
    pub fn status_for(&self, version: IpVersion) -> &str {
        match version {
            IpVersion::V4 => &self.status_v4,
            IpVersion::V6 => &self.status_v6,
        }
    }
}

impl Default for SandboxOverrides {
    fn default() -> Self {
        Self {
            org: "ORG-EIPB1-TEST".to_string(),
            maintainer: "TEST-DBM-MNT".to_string(),
            contact: "AA1-TEST".to_string(),
            status_v4: "ALLOCATED PA".to_string(),
            status_v6: "ALLOCATED PA".to_string(),
        }
    }
}

/// Runtime configuration, built once at startup and passed down by reference
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub environment: Environment,
    /// Maintainer password sent with every mutation
    pub maintainer_password: Option<String>,
    pub sandbox: SandboxOverrides,
    pub smallest_prefix_v4: u8,
    pub smallest_prefix_v6: u8,
    pub templates_dir: PathBuf,
    /// Country used when the IPAM cannot resolve one for the site
    pub default_country: Option<String>,
    /// Backup directory; backups are disabled when unset
    pub backup_dir: Option<PathBuf>,
    pub ipam_inventory: Option<PathBuf>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Sandbox,
            maintainer_password: None,
            sandbox: SandboxOverrides::default(),
            smallest_prefix_v4: DEFAULT_SMALLEST_PREFIX_V4,
            smallest_prefix_v6: DEFAULT_SMALLEST_PREFIX_V6,
            templates_dir: PathBuf::from("/opt/ripeupdater/templates"),
            default_country: None,
            backup_dir: None,
            ipam_inventory: None,
        }
    }
}

impl SyncConfig {
    /// Upper-cased default country, checked to look like an alpha-2 code
    pub fn default_country(&self) -> Result<Option<String>, ConfigError> {
        match &self.default_country {
            None => Ok(None),
            Some(country) => {
                let country = country.trim().to_uppercase();
                if country.len() == 2 && country.chars().all(|c| c.is_ascii_alphabetic()) {
                    Ok(Some(country))
                } else {
                    Err(ConfigError::InvalidDefaultCountry(country))
                }
            }
        }
    }
}
