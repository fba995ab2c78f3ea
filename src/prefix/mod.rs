//! Address ranges and the eligibility check applied before any registry I/O.

mod range;
mod validate;

pub use range::{AddressRange, IpVersion};
pub use validate::{Eligibility, PrefixValidator, DEFAULT_SMALLEST_PREFIX_V4, DEFAULT_SMALLEST_PREFIX_V6};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrefixError {
    #[error("Invalid address range: {0}")]
    InvalidRange(String),

    #[error("Address range has host bits set: {0}")]
    HostBitsSet(String),

    #[error("This prefix is too small, update only /{max} or bigger (got /{prefix_len})")]
    TooSmall { prefix_len: u8, max: u8 },

    #[error("{0} is not a routed prefix, it will be ignored")]
    NotRoutable(String),
}
