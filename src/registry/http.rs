use super::transport::{RawResponse, RegistryTransport, RequestMethod};
use super::types::WhoisResponse;
use super::RegistryError;
use crate::config::Environment;
use crate::object::ObjectType;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Url};
use tracing::debug;

/// `Accept` header sent with every request
pub const ACCEPT_HEADER: &str = "application/json; charset=utf-8";

/// Registry transport over the RIPE database REST API
#[derive(Debug, Clone)]
pub struct HttpRegistry {
    client: Client,
    rest_base: String,
    search_base: String,
    source: String,
    password: Option<String>,
}

impl HttpRegistry {
    /// Transport for the database of `environment`
    pub fn new(environment: Environment, password: Option<String>) -> Result<Self, RegistryError> {
        Self::with_base_urls(
            environment.rest_base(),
            environment.search_base(),
            environment.id(),
            password,
        )
    }

    /// Transport with explicit endpoints, e.g. a local mirror
    pub fn with_base_urls(
        rest_base: impl Into<String>,
        search_base: impl Into<String>,
        source: impl Into<String>,
        password: Option<String>,
    ) -> Result<Self, RegistryError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HEADER));

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            rest_base: rest_base.into().trim_end_matches('/').to_string(),
            search_base: search_base.into(),
            source: source.into(),
            password,
        })
    }

    fn object_url(&self, object_type: ObjectType, key: Option<&str>) -> Result<Url, RegistryError> {
        let url = match key {
            Some(key) => format!("{}/{}/{}", self.rest_base, object_type, key),
            None => format!("{}/{}", self.rest_base, object_type),
        };
        Url::parse(&url).map_err(|_| RegistryError::InvalidUrl(url))
    }

    /// Add the maintainer password to a mutating request
    fn authenticated(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.password {
            Some(password) => request.query(&[("password", password.as_str())]),
            None => request,
        }
    }

    async fn send(
        &self,
        method: RequestMethod,
        request: RequestBuilder,
    ) -> Result<RawResponse, RegistryError> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(method = %method, status, "Registry responded");
        Ok(RawResponse::new(method, status, body))
    }
}

#[async_trait]
impl RegistryTransport for HttpRegistry {
    async fn fetch(
        &self,
        object_type: ObjectType,
        key: &str,
    ) -> Result<RawResponse, RegistryError> {
        let mut url = self.object_url(object_type, Some(key))?;
        url.set_query(Some("unfiltered"));
        self.send(RequestMethod::Get, self.client.get(url)).await
    }

    async fn create(
        &self,
        object_type: ObjectType,
        document: &WhoisResponse,
    ) -> Result<RawResponse, RegistryError> {
        let url = self.object_url(object_type, None)?;
        let request = self.authenticated(self.client.post(url).json(document));
        self.send(RequestMethod::Post, request).await
    }

    async fn update(
        &self,
        object_type: ObjectType,
        key: &str,
        document: &WhoisResponse,
    ) -> Result<RawResponse, RegistryError> {
        let url = self.object_url(object_type, Some(key))?;
        let request = self.authenticated(self.client.put(url).json(document));
        self.send(RequestMethod::Put, request).await
    }

    async fn delete(
        &self,
        object_type: ObjectType,
        key: &str,
    ) -> Result<RawResponse, RegistryError> {
        let url = self.object_url(object_type, Some(key))?;
        let request = self.authenticated(self.client.delete(url));
        self.send(RequestMethod::Delete, request).await
    }

    async fn search(
        &self,
        object_type: ObjectType,
        query: &str,
    ) -> Result<RawResponse, RegistryError> {
        let request = self.client.get(&self.search_base).query(&[
            ("source", self.source.as_str()),
            ("type-filter", object_type.as_str()),
            ("flags", "no-referenced"),
            ("query-string", query),
        ]);
        self.send(RequestMethod::Get, request).await
    }
}
