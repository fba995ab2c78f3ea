use super::range::{host_mask, to_u128, AddressRange, IpVersion};
use super::PrefixError;
use std::net::IpAddr;
use tracing::debug;

/// Longest IPv4 prefix that is still pushed to the registry
pub const DEFAULT_SMALLEST_PREFIX_V4: u8 = 31;

/// Longest IPv6 prefix that is still pushed to the registry
pub const DEFAULT_SMALLEST_PREFIX_V6: u8 = 127;

/// Result of classifying a range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    /// Prefix length is longer than the configured maximum
    TooSmall { max: u8 },
    /// Range is loopback, reserved, private, multicast or otherwise not global
    NotRoutable,
}

/// A special-purpose block as (network, prefix length)
type Block = (u128, u8);

const V4_LOOPBACK: &[Block] = &[(0x7f00_0000, 8)];

const V4_RESERVED: &[Block] = &[(0xf000_0000, 4)];

const V4_MULTICAST: &[Block] = &[(0xe000_0000, 4)];

const V4_PRIVATE: &[Block] = &[
    (0x0000_0000, 8),
    (0x0a00_0000, 8),
    (0x7f00_0000, 8),
    (0xa9fe_0000, 16),
    (0xac10_0000, 12),
    (0xc000_0000, 29),
    (0xc000_00aa, 31),
    (0xc000_0200, 24),
    (0xc0a8_0000, 16),
    (0xc612_0000, 15),
    (0xc633_6400, 24),
    (0xcb00_7100, 24),
    (0xf000_0000, 4),
    (0xffff_ffff, 32),
];

const V6_LOOPBACK: &[Block] = &[(1, 128)];

const V6_MULTICAST: &[Block] = &[(0xff00 << 112, 8)];

const V6_LINK_LOCAL: &[Block] = &[(0xfe80 << 112, 10)];

const V6_RESERVED: &[Block] = &[
    (0x0000 << 112, 8),
    (0x0100 << 112, 8),
    (0x0200 << 112, 7),
    (0x0400 << 112, 6),
    (0x0800 << 112, 5),
    (0x1000 << 112, 4),
    (0x4000 << 112, 3),
    (0x6000 << 112, 3),
    (0x8000 << 112, 3),
    (0xa000 << 112, 3),
    (0xc000 << 112, 3),
    (0xe000 << 112, 4),
    (0xf000 << 112, 5),
    (0xf800 << 112, 6),
    (0xfe00 << 112, 9),
];

const V6_PRIVATE: &[Block] = &[
    (1, 128),
    (0, 128),
    (0xffff << 32, 96),
    ((0x0064 << 112) | (0xff9b << 96) | (0x0001 << 80), 48),
    (0x0100 << 112, 64),
    (0x2001 << 112, 23),
    ((0x2001 << 112) | (0x0db8 << 96), 32),
    ((0x2001 << 112) | (0x0010 << 96), 28),
    (0xfc00 << 112, 7),
    (0xfe80 << 112, 10),
];

/// Classifies ranges against the configured size limits and special-purpose blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixValidator {
    pub smallest_prefix_v4: u8,
    pub smallest_prefix_v6: u8,
}

impl Default for PrefixValidator {
    fn default() -> Self {
        Self {
            smallest_prefix_v4: DEFAULT_SMALLEST_PREFIX_V4,
            smallest_prefix_v6: DEFAULT_SMALLEST_PREFIX_V6,
        }
    }
}

impl PrefixValidator {
    pub fn new(smallest_prefix_v4: u8, smallest_prefix_v6: u8) -> Self {
        Self {
            smallest_prefix_v4,
            smallest_prefix_v6,
        }
    }

    /// Classify a range without failing
    pub fn classify(&self, range: &AddressRange) -> Eligibility {
        debug!(prefix = %range, "Validating prefix");

        match range.version() {
            IpVersion::V6 => {
                if range.prefix_len() > self.smallest_prefix_v6 {
                    return Eligibility::TooSmall {
                        max: self.smallest_prefix_v6,
                    };
                }

                if covered_by(range, V6_LOOPBACK)
                    || covered_by(range, V6_RESERVED)
                    || covered_by(range, V6_PRIVATE)
                    || covered_by(range, V6_MULTICAST)
                    || covered_by(range, V6_LINK_LOCAL)
                {
                    return Eligibility::NotRoutable;
                }
            }
            IpVersion::V4 => {
                if range.prefix_len() > self.smallest_prefix_v4 {
                    return Eligibility::TooSmall {
                        max: self.smallest_prefix_v4,
                    };
                }

                if covered_by(range, V4_LOOPBACK)
                    || covered_by(range, V4_RESERVED)
                    || covered_by(range, V4_PRIVATE)
                    || covered_by(range, V4_MULTICAST)
                {
                    return Eligibility::NotRoutable;
                }
            }
        }

        Eligibility::Eligible
    }

    /// Validate that a range may be pushed to the registry
    pub fn validate(&self, range: &AddressRange) -> Result<(), PrefixError> {
        match self.classify(range) {
            Eligibility::Eligible => Ok(()),
            Eligibility::TooSmall { max } => Err(PrefixError::TooSmall {
                prefix_len: range.prefix_len(),
                max,
            }),
            Eligibility::NotRoutable => Err(PrefixError::NotRoutable(range.to_string())),
        }
    }
}

/// A range falls in a class when both its first and last address do
fn covered_by(range: &AddressRange, blocks: &[Block]) -> bool {
    let version = range.version();
    in_any(&range.network(), version, blocks) && in_any(&range.last(), version, blocks)
}

fn in_any(addr: &IpAddr, version: IpVersion, blocks: &[Block]) -> bool {
    let value = to_u128(addr);
    blocks.iter().any(|(network, prefix_len)| {
        value & !host_mask(version, *prefix_len) == *network
    })
}
