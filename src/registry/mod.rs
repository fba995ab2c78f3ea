//! Access to the registry's REST directory: wire types, the transport seam and
//! the classification of its responses.

mod classify;
mod http;
mod transport;
mod types;

pub use classify::{classify, Classified};
pub use http::{HttpRegistry, ACCEPT_HEADER};
pub use transport::{RawResponse, RegistryTransport, RequestMethod};
pub use types::{
    ErrorMessage, ErrorMessages, Source, WhoisAttribute, WhoisAttributes, WhoisObject,
    WhoisObjects, WhoisResponse,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid registry URL {0}")]
    InvalidUrl(String),
}
