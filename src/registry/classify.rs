use super::transport::RawResponse;
use super::types::WhoisResponse;
use crate::object::RegistryObject;
use tracing::{debug, warn};

/// Payload and outcome extracted from a registry response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classified {
    /// First object of the response, empty when there is none
    pub object: RegistryObject,
    pub errors: Vec<String>,
    /// Mirrors the HTTP status (2xx), independent of the payload
    pub success: bool,
}

/// Extract the primary object and error messages from a response
pub fn classify(response: &RawResponse) -> Classified {
    let parsed = if response.body.trim().is_empty() {
        WhoisResponse::default()
    } else {
        match serde_json::from_str::<WhoisResponse>(&response.body) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(status = response.status, error = %e, "Registry response is not a whois document");
                WhoisResponse::default()
            }
        }
    };

    let classified = Classified {
        object: parsed
            .first_object()
            .map(RegistryObject::from)
            .unwrap_or_default(),
        errors: parsed.error_texts(),
        success: response.is_success(),
    };

    debug!(
        method = %response.method,
        status = response.status,
        errors = ?classified.errors,
        "Classified registry response"
    );
    classified
}
