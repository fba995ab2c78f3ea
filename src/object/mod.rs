//! Registry objects: the attribute merge engine that builds them and the text
//! rendering used in notifications.

mod format;
mod merge;

pub use format::{format_attributes, line_diff};
pub use merge::{MergeEngine, COUNTRY_POSITION, DESCR_POSITION};

use crate::prefix::{AddressRange, IpVersion};
use crate::template::AttributeList;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of new inetnum objects in the production database
pub const STATUS_INETNUM: &str = "ASSIGNED PA";

/// Status of new inet6num objects in the production database
pub const STATUS_INET6NUM: &str = "ASSIGNED";

/// Registry object class of an address range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    Inetnum,
    Inet6num,
}

impl ObjectType {
    pub fn for_range(range: &AddressRange) -> Self {
        match range.version() {
            IpVersion::V4 => ObjectType::Inetnum,
            IpVersion::V6 => ObjectType::Inet6num,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Inetnum => "inetnum",
            ObjectType::Inet6num => "inet6num",
        }
    }

    /// Status written to production objects of this class
    pub fn default_status(&self) -> &'static str {
        match self {
            ObjectType::Inetnum => STATUS_INETNUM,
            ObjectType::Inet6num => STATUS_INET6NUM,
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directory object: the database it lives in plus its ordered attributes.
///
/// Used both for the current state read from the registry and the desired
/// state written to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryObject {
    pub source: Option<String>,
    pub attributes: AttributeList,
}

impl RegistryObject {
    pub fn new(source: impl Into<String>, attributes: AttributeList) -> Self {
        Self {
            source: Some(source.into()),
            attributes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// One `name:\t\tvalue` line per attribute, each prefixed with `line_prefix`
    pub fn format(&self, line_prefix: &str) -> String {
        format_attributes(&self.attributes, line_prefix)
    }
}
