use super::EventError;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{info, warn};

/// A choice field: plain string, or `{"value": ..., "label": ...}` from older IPAM APIs
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Labeled {
    Plain(String),
    Choice { label: String },
}

impl Labeled {
    pub fn as_str(&self) -> &str {
        match self {
            Labeled::Plain(s) => s,
            Labeled::Choice { label } => label,
        }
    }
}

/// Raw webhook document as sent by the IPAM
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookEvent {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub data: Option<EventData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventData {
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub site: Option<Site>,
    #[serde(default)]
    pub custom_fields: Option<CustomFields>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Site {
    #[serde(default)]
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomFields {
    /// `Some(Value::Null)` when the field is present but empty, `None` when absent
    #[serde(default, deserialize_with = "present")]
    pub ripe_report: Option<Value>,
    #[serde(default)]
    pub ripe_template: Option<Labeled>,
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

/// Lifecycle event type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventAction {
    Created,
    Updated,
    Deleted,
    Other(String),
}

impl From<&str> for EventAction {
    fn from(s: &str) -> Self {
        match s {
            "created" => EventAction::Created,
            "updated" => EventAction::Updated,
            "deleted" => EventAction::Deleted,
            other => EventAction::Other(other.to_string()),
        }
    }
}

/// A validated prefix event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixEvent {
    pub action: EventAction,
    pub username: String,
    pub prefix: String,
    pub site: Option<String>,
    /// Whether the prefix should be present in the registry
    pub report: bool,
    /// Upper-cased template name; only set when reporting
    pub template: Option<String>,
}

impl PrefixEvent {
    /// Whether the event removes the object from the registry
    pub fn is_delete(&self) -> bool {
        !self.report || self.action == EventAction::Deleted
    }
}

impl WebhookEvent {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, EventError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Check the required fields and extract a [`PrefixEvent`]
    pub fn validate(&self) -> Result<PrefixEvent, EventError> {
        let model = self.model.as_deref().ok_or(EventError::MissingField("model"))?;
        if model != "prefix" {
            return Err(EventError::UnsupportedModel(model.to_string()));
        }

        let data = self.data.as_ref().ok_or(EventError::MissingField("data"))?;
        let custom_fields = data
            .custom_fields
            .as_ref()
            .ok_or(EventError::MissingField("data.custom_fields"))?;
        let report = custom_fields
            .ripe_report
            .as_ref()
            .ok_or(EventError::MissingField("data.custom_fields.ripe_report"))?;
        let report = matches!(report, Value::Bool(true));

        let prefix = data
            .prefix
            .clone()
            .ok_or(EventError::MissingField("data.prefix"))?;

        let username = match &self.username {
            Some(username) => username.clone(),
            None => {
                warn!("No user given in webhook, a username is expected");
                "None".to_string()
            }
        };

        let template = if report {
            let template = custom_fields
                .ripe_template
                .as_ref()
                .ok_or(EventError::MissingField("data.custom_fields.ripe_template"))?;
            Some(template.as_str().to_uppercase())
        } else {
            None
        };

        let event = PrefixEvent {
            action: EventAction::from(self.event.as_deref().unwrap_or_default()),
            username,
            prefix,
            site: data.site.as_ref().and_then(|s| s.slug.clone()),
            report,
            template,
        };

        info!(
            prefix = %event.prefix,
            user = %event.username,
            report = event.report,
            template = ?event.template,
            "Parsed prefix event"
        );
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Result<PrefixEvent, EventError> {
        WebhookEvent::from_slice(value.to_string().as_bytes())?.validate()
    }

    #[test]
    fn test_reporting_event() {
        let event = parse(json!({
            "model": "prefix",
            "event": "updated",
            "username": "jdoe",
            "data": {
                "prefix": "2001:1234:4567::/64",
                "site": {"slug": "myslug"},
                "custom_fields": {"ripe_report": true, "ripe_template": "cloud-pool"}
            }
        }))
        .unwrap();
        assert_eq!(event.action, EventAction::Updated);
        assert_eq!(event.template.as_deref(), Some("CLOUD-POOL"));
        assert_eq!(event.site.as_deref(), Some("myslug"));
        assert!(!event.is_delete());
    }

    #[test]
    fn test_template_label_form() {
        let event = parse(json!({
            "model": "prefix",
            "event": "created",
            "username": "jdoe",
            "data": {
                "prefix": "192.0.2.0/24",
                "custom_fields": {"ripe_report": true, "ripe_template": {"value": "pool", "label": "Pool"}}
            }
        }))
        .unwrap();
        assert_eq!(event.template.as_deref(), Some("POOL"));
        assert_eq!(event.site, None);
    }

    #[test]
    fn test_report_false_or_null_deletes() {
        for report in [json!(false), Value::Null, json!("yes")] {
            let event = parse(json!({
                "model": "prefix",
                "event": "updated",
                "data": {"prefix": "192.0.2.0/24", "custom_fields": {"ripe_report": report}}
            }))
            .unwrap();
            assert!(event.is_delete());
            assert_eq!(event.template, None);
            assert_eq!(event.username, "None");
        }
    }

    #[test]
    fn test_deleted_event_deletes() {
        let event = parse(json!({
            "model": "prefix",
            "event": "deleted",
            "username": "jdoe",
            "data": {"prefix": "192.0.2.0/24", "custom_fields": {"ripe_report": true, "ripe_template": "POOL"}}
        }))
        .unwrap();
        assert!(event.is_delete());
    }

    #[test]
    fn test_missing_fields() {
        assert!(matches!(
            parse(json!({"event": "created"})),
            Err(EventError::MissingField("model"))
        ));
        assert!(matches!(
            parse(json!({"model": "prefix", "data": {"prefix": "192.0.2.0/24", "custom_fields": {}}})),
            Err(EventError::MissingField("data.custom_fields.ripe_report"))
        ));
        assert!(matches!(
            parse(json!({"model": "prefix", "data": {"prefix": "192.0.2.0/24", "custom_fields": {"ripe_report": true}}})),
            Err(EventError::MissingField("data.custom_fields.ripe_template"))
        ));
        assert!(matches!(
            parse(json!({"model": "prefix", "data": {"custom_fields": {"ripe_report": false}}})),
            Err(EventError::MissingField("data.prefix"))
        ));
    }

    #[test]
    fn test_unsupported_model() {
        assert!(matches!(
            parse(json!({"model": "aggregate", "data": {}})),
            Err(EventError::UnsupportedModel(_))
        ));
    }
}
