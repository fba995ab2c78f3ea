use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A single `name: value` pair of a registry object.
///
/// An empty value means "not set"; such attributes never reach the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.value)
    }
}

/// Ordered attributes of a registry object. Order is significant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeList(Vec<Attribute>);

impl AttributeList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, attribute: Attribute) {
        self.0.push(attribute);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attribute> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First value of the named attribute
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// All values of the named attribute, in order
    pub fn values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Attribute names in order
    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|a| a.name.as_str()).collect()
    }

    pub fn into_vec(self) -> Vec<Attribute> {
        self.0
    }
}

impl From<Vec<Attribute>> for AttributeList {
    fn from(attributes: Vec<Attribute>) -> Self {
        Self(attributes)
    }
}

impl FromIterator<Attribute> for AttributeList {
    fn from_iter<I: IntoIterator<Item = Attribute>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a AttributeList {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// The template index document (`templates.json`)
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateDocument {
    pub templates: HashMap<String, TemplateDefinition>,
}

/// One named template: its own attributes plus the master file it inherits from
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateDefinition {
    pub inherit: String,
    #[serde(default, deserialize_with = "deserialize_attribute_entries")]
    pub attributes: Vec<Attribute>,
}

/// A master template file: schema defaults for one object type
#[derive(Debug, Clone, Deserialize)]
pub struct MasterTemplate {
    #[serde(deserialize_with = "deserialize_attribute_entries")]
    pub attributes: Vec<Attribute>,
}

/// A template together with the attributes of its master
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTemplate {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub master: Vec<Attribute>,
}

/// Template files write attributes as a list of one-key objects:
/// `[{"descr": "Pool"}, {"org": ""}, {"remarks": null}]`.
/// Keys are kept in document order; `null` reads as an empty value.
fn deserialize_attribute_entries<'de, D>(deserializer: D) -> Result<Vec<Attribute>, D::Error>
where
    D: Deserializer<'de>,
{
    struct EntriesVisitor;

    impl<'de> Visitor<'de> for EntriesVisitor {
        type Value = Vec<Attribute>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a list of {\"name\": \"value\"} objects")
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut attributes = Vec::new();
            while let Some(entry) = seq.next_element::<AttributeEntry>()? {
                attributes.extend(entry.0);
            }
            Ok(attributes)
        }
    }

    deserializer.deserialize_seq(EntriesVisitor)
}

struct AttributeEntry(Vec<Attribute>);

impl<'de> Deserialize<'de> for AttributeEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntryVisitor;

        impl<'de> Visitor<'de> for EntryVisitor {
            type Value = AttributeEntry;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping attribute names to string values")
            }

            fn visit_map<M: MapAccess<'de>>(self, mut map: M) -> Result<Self::Value, M::Error> {
                let mut attributes = Vec::new();
                while let Some((name, value)) = map.next_entry::<String, Option<String>>()? {
                    if name.is_empty() {
                        return Err(de::Error::custom("attribute name must not be empty"));
                    }
                    attributes.push(Attribute::new(name, value.unwrap_or_default()));
                }
                Ok(AttributeEntry(attributes))
            }
        }

        deserializer.deserialize_map(EntryVisitor)
    }
}
