//! Contact records on both sides of the sync.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// A contact as returned by the source API.
///
/// The source schema is not stable across API versions: the same concept may
/// arrive as `first_name` or `firstName`, and emails/addresses may be nested.
/// The record is therefore kept as a raw JSON object and interpreted by the
/// mapper.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceContact(Map<String, Value>);

impl SourceContact {
    /// Wraps an already-decoded JSON object.
    #[must_use]
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Builds a contact from an arbitrary JSON value, which must be an object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(Error::NotAnObject(json_kind(&other))),
        }
    }

    /// Returns the raw value of a top-level field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Returns the underlying JSON object.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for SourceContact {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A scalar attribute value accepted by the target API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Number(Number),
    Text(String),
}

impl AttributeValue {
    /// Converts a JSON value into an attribute, trimming text.
    ///
    /// Returns `None` for null, blank strings, arrays and objects.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => Some(Self::Number(n.clone())),
            Value::String(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| Self::Text(trimmed.to_string()))
            }
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Returns true for blank text.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Text(s) if s.trim().is_empty())
    }

    /// Returns the text content, if this is a text attribute.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for AttributeValue {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// A contact in the target schema.
///
/// The email is never empty and no attribute is ever blank: the target must
/// not receive values that would overwrite existing data with nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMappedContact")]
pub struct MappedContact {
    email: String,
    attributes: BTreeMap<String, AttributeValue>,
}

#[derive(Deserialize)]
struct RawMappedContact {
    email: String,
    #[serde(default)]
    attributes: BTreeMap<String, AttributeValue>,
}

impl TryFrom<RawMappedContact> for MappedContact {
    type Error = Error;

    fn try_from(raw: RawMappedContact) -> Result<Self> {
        let mut contact = MappedContact::new(raw.email)?;
        for (name, value) in raw.attributes {
            contact.insert_attribute(name, value);
        }
        Ok(contact)
    }
}

impl MappedContact {
    /// Creates a contact with no attributes. The email is trimmed.
    pub fn new(email: impl Into<String>) -> Result<Self> {
        let email = email.into().trim().to_string();
        if email.is_empty() {
            return Err(Error::EmptyEmail);
        }
        Ok(Self {
            email,
            attributes: BTreeMap::new(),
        })
    }

    /// The join key on the target side.
    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn attributes(&self) -> &BTreeMap<String, AttributeValue> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// Sets an attribute. Blank values are ignored and `false` is returned.
    pub fn insert_attribute(&mut self, name: impl Into<String>, value: AttributeValue) -> bool {
        if value.is_empty() {
            return false;
        }
        self.attributes.insert(name.into(), value);
        true
    }
}
