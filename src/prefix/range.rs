use super::PrefixError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// Address family of a range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    /// Number of bits in an address of this family
    pub fn bits(&self) -> u8 {
        match self {
            IpVersion::V4 => 32,
            IpVersion::V6 => 128,
        }
    }
}

/// A CIDR network, either IPv4 or IPv6.
///
/// The network address never has host bits set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddressRange {
    network: IpAddr,
    prefix_len: u8,
}

impl AddressRange {
    /// Parse `addr/len` (or a bare address, taken as a host route).
    pub fn parse(s: &str) -> Result<Self, PrefixError> {
        let s = s.trim();
        let (addr_part, len_part) = match s.split_once('/') {
            Some((addr, len)) => (addr, Some(len)),
            None => (s, None),
        };

        let addr: IpAddr = addr_part
            .parse()
            .map_err(|_| PrefixError::InvalidRange(s.to_string()))?;
        let version = version_of(&addr);

        let prefix_len = match len_part {
            Some(len) => len
                .parse::<u8>()
                .map_err(|_| PrefixError::InvalidRange(s.to_string()))?,
            None => version.bits(),
        };

        if prefix_len > version.bits() {
            return Err(PrefixError::InvalidRange(s.to_string()));
        }

        let value = to_u128(&addr);
        if value & host_mask(version, prefix_len) != 0 {
            return Err(PrefixError::HostBitsSet(s.to_string()));
        }

        Ok(Self {
            network: addr,
            prefix_len,
        })
    }

    /// Parse the legacy `low - high` notation used by inetnum objects.
    ///
    /// When the pair does not describe a single CIDR block, the first block of
    /// the summarized range is returned.
    pub fn from_legacy_range(s: &str) -> Result<Self, PrefixError> {
        let (low, high) = s
            .split_once('-')
            .ok_or_else(|| PrefixError::InvalidRange(s.to_string()))?;

        let low: IpAddr = low
            .trim()
            .parse()
            .map_err(|_| PrefixError::InvalidRange(s.to_string()))?;
        let high: IpAddr = high
            .trim()
            .parse()
            .map_err(|_| PrefixError::InvalidRange(s.to_string()))?;

        let version = version_of(&low);
        if version != version_of(&high) {
            return Err(PrefixError::InvalidRange(s.to_string()));
        }

        let (low_value, high_value) = (to_u128(&low), to_u128(&high));
        if low_value > high_value {
            return Err(PrefixError::InvalidRange(s.to_string()));
        }

        let bits = version.bits();
        let mut prefix_len = bits - (low_value.trailing_zeros().min(bits as u32) as u8);
        while low_value.saturating_add(host_mask(version, prefix_len)) > high_value {
            prefix_len += 1;
        }

        Ok(Self {
            network: low,
            prefix_len,
        })
    }

    pub fn version(&self) -> IpVersion {
        version_of(&self.network)
    }

    pub fn is_v6(&self) -> bool {
        self.version() == IpVersion::V6
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// First address of the range
    pub fn network(&self) -> IpAddr {
        self.network
    }

    /// Last address of the range
    pub fn last(&self) -> IpAddr {
        let version = self.version();
        let value = to_u128(&self.network) | host_mask(version, self.prefix_len);
        from_u128(value, version)
    }

    /// Legacy `low - high` notation (`198.51.100.0 - 198.51.100.255`)
    pub fn format_cidr(&self) -> String {
        format!("{} - {}", self.network, self.last())
    }

    /// Value of the primary key attribute: legacy pair for IPv4, CIDR for IPv6
    pub fn registry_key(&self) -> String {
        if self.is_v6() {
            self.to_string()
        } else {
            self.format_cidr()
        }
    }

    /// Whether `other` lies entirely inside this range
    pub fn contains(&self, other: &AddressRange) -> bool {
        self.version() == other.version()
            && self.prefix_len <= other.prefix_len
            && self.contains_addr(&other.network)
    }

    /// Whether `addr` lies inside this range
    pub fn contains_addr(&self, addr: &IpAddr) -> bool {
        let version = self.version();
        if version_of(addr) != version {
            return false;
        }
        let mask = !host_mask(version, self.prefix_len) & full_mask(version);
        to_u128(addr) & mask == to_u128(&self.network)
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}

impl FromStr for AddressRange {
    type Err = PrefixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for AddressRange {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AddressRange {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

fn version_of(addr: &IpAddr) -> IpVersion {
    match addr {
        IpAddr::V4(_) => IpVersion::V4,
        IpAddr::V6(_) => IpVersion::V6,
    }
}

pub(crate) fn to_u128(addr: &IpAddr) -> u128 {
    match addr {
        IpAddr::V4(v4) => u32::from(*v4) as u128,
        IpAddr::V6(v6) => u128::from(*v6),
    }
}

fn from_u128(value: u128, version: IpVersion) -> IpAddr {
    match version {
        IpVersion::V4 => IpAddr::V4(Ipv4Addr::from(value as u32)),
        IpVersion::V6 => IpAddr::V6(Ipv6Addr::from(value)),
    }
}

fn full_mask(version: IpVersion) -> u128 {
    match version {
        IpVersion::V4 => u32::MAX as u128,
        IpVersion::V6 => u128::MAX,
    }
}

/// Mask covering the host part of a `prefix_len` network
pub(crate) fn host_mask(version: IpVersion, prefix_len: u8) -> u128 {
    let host_bits = (version.bits() - prefix_len) as u32;
    if host_bits >= 128 {
        u128::MAX
    } else {
        (1u128 << host_bits) - 1
    }
}
