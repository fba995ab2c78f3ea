use super::types::WhoisResponse;
use super::RegistryError;
use crate::object::ObjectType;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// HTTP method of a registry request, reported in notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl RequestMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Post => "POST",
            RequestMethod::Put => "PUT",
            RequestMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registry response before classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub method: RequestMethod,
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(method: RequestMethod, status: u16, body: impl Into<String>) -> Self {
        Self {
            method,
            status,
            body: body.into(),
        }
    }

    /// 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    pub fn is_bad_request(&self) -> bool {
        self.status == 400
    }
}

/// The registry REST directory.
///
/// Implementations only move bytes; status interpretation happens in the caller.
/// An `Err` means the registry could not be reached at all.
#[async_trait]
pub trait RegistryTransport: Send + Sync {
    /// `GET {base}/{type}/{key}?unfiltered`
    async fn fetch(&self, object_type: ObjectType, key: &str)
        -> Result<RawResponse, RegistryError>;

    /// `POST {base}/{type}`
    async fn create(
        &self,
        object_type: ObjectType,
        document: &WhoisResponse,
    ) -> Result<RawResponse, RegistryError>;

    /// `PUT {base}/{type}/{key}`
    async fn update(
        &self,
        object_type: ObjectType,
        key: &str,
        document: &WhoisResponse,
    ) -> Result<RawResponse, RegistryError>;

    /// `DELETE {base}/{type}/{key}`
    async fn delete(&self, object_type: ObjectType, key: &str)
        -> Result<RawResponse, RegistryError>;

    /// `GET {searchBase}?source&type-filter&flags&query-string`
    async fn search(
        &self,
        object_type: ObjectType,
        query: &str,
    ) -> Result<RawResponse, RegistryError>;
}
