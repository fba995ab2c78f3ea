use crate::object::RegistryObject;
use crate::template::{Attribute, AttributeList};
use serde::{Deserialize, Serialize};

/// Top-level document exchanged with the registry, for requests and responses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WhoisResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objects: Option<WhoisObjects>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errormessages: Option<ErrorMessages>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WhoisObjects {
    #[serde(default)]
    pub object: Vec<WhoisObject>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WhoisObject {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    #[serde(rename = "primary-key", default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<WhoisAttributes>,
    #[serde(default)]
    pub attributes: WhoisAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WhoisAttributes {
    #[serde(default)]
    pub attribute: Vec<WhoisAttribute>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhoisAttribute {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorMessages {
    #[serde(default)]
    pub errormessage: Vec<ErrorMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl WhoisResponse {
    /// Request document carrying a single object
    pub fn from_object(object: &RegistryObject) -> Self {
        Self {
            objects: Some(WhoisObjects {
                object: vec![WhoisObject::from(object)],
            }),
            errormessages: None,
        }
    }

    pub fn first_object(&self) -> Option<&WhoisObject> {
        self.objects.as_ref().and_then(|o| o.object.first())
    }

    /// Value of the first primary-key attribute of the first object
    pub fn first_primary_key(&self) -> Option<&str> {
        self.first_object()
            .and_then(|o| o.primary_key.as_ref())
            .and_then(|pk| pk.attribute.first())
            .and_then(|a| a.value.as_deref())
    }

    /// Texts of all error messages, in order
    pub fn error_texts(&self) -> Vec<String> {
        self.errormessages
            .as_ref()
            .map(|m| {
                m.errormessage
                    .iter()
                    .filter_map(|e| e.text.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl From<&RegistryObject> for WhoisObject {
    fn from(object: &RegistryObject) -> Self {
        Self {
            object_type: None,
            source: object.source.as_ref().map(|id| Source { id: id.clone() }),
            primary_key: None,
            attributes: WhoisAttributes {
                attribute: object
                    .attributes
                    .iter()
                    .map(|a| WhoisAttribute {
                        name: a.name.clone(),
                        value: Some(a.value.clone()),
                    })
                    .collect(),
            },
        }
    }
}

impl From<&WhoisObject> for RegistryObject {
    fn from(object: &WhoisObject) -> Self {
        Self {
            source: object.source.as_ref().map(|s| s.id.clone()),
            attributes: object
                .attributes
                .attribute
                .iter()
                .map(|a| Attribute::new(a.name.clone(), a.value.clone().unwrap_or_default()))
                .collect::<AttributeList>(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_document_shape() {
        let object = RegistryObject::new(
            "TEST",
            vec![
                Attribute::new("inet6num", "2001:db8::/48"),
                Attribute::new("netname", "POOL"),
            ]
            .into(),
        );
        let document = serde_json::to_value(WhoisResponse::from_object(&object)).unwrap();
        assert_eq!(
            document,
            json!({
                "objects": {"object": [{
                    "source": {"id": "TEST"},
                    "attributes": {"attribute": [
                        {"name": "inet6num", "value": "2001:db8::/48"},
                        {"name": "netname", "value": "POOL"}
                    ]}
                }]}
            })
        );
    }

    #[test]
    fn test_primary_key_and_errors() {
        let response: WhoisResponse = serde_json::from_value(json!({
            "objects": {"object": [{
                "type": "inetnum",
                "primary-key": {"attribute": [{"name": "inetnum", "value": "192.0.2.0 - 192.0.2.255"}]},
                "attributes": {"attribute": []}
            }]},
            "errormessages": {"errormessage": [
                {"severity": "Error", "text": "Overlap"},
                {"severity": "Warning"}
            ]}
        }))
        .unwrap();
        assert_eq!(response.first_primary_key(), Some("192.0.2.0 - 192.0.2.255"));
        assert_eq!(response.error_texts(), vec!["Overlap".to_string()]);
    }
}
