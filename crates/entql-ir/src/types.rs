//! Value types carried by conditions, records and parameters

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// A typed attribute value as the remote service understands it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum AttributeValue {
    /// Explicit null marker; distinct from an absent attribute.
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Decimal(Decimal),
    Money(Decimal),
    Double(f64),
    String(String),
    Guid(Uuid),
    DateTime(DateTime<Utc>),
    OptionSet(i32),
    EntityReference {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        logical_name: Option<String>,
        id: Uuid,
    },
}

impl AttributeValue {
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    /// Short kind name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            AttributeValue::Null => "null",
            AttributeValue::Boolean(_) => "boolean",
            AttributeValue::Int32(_) => "int32",
            AttributeValue::Int64(_) => "int64",
            AttributeValue::Decimal(_) => "decimal",
            AttributeValue::Money(_) => "money",
            AttributeValue::Double(_) => "double",
            AttributeValue::String(_) => "string",
            AttributeValue::Guid(_) => "guid",
            AttributeValue::DateTime(_) => "datetime",
            AttributeValue::OptionSet(_) => "optionset",
            AttributeValue::EntityReference { .. } => "entityreference",
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Null => write!(f, "null"),
            AttributeValue::Boolean(b) => write!(f, "{}", b),
            AttributeValue::Int32(i) => write!(f, "{}", i),
            AttributeValue::Int64(i) => write!(f, "{}", i),
            AttributeValue::Decimal(d) | AttributeValue::Money(d) => write!(f, "{}", d),
            AttributeValue::Double(d) => write!(f, "{}", d),
            AttributeValue::String(s) => write!(f, "'{}'", s),
            AttributeValue::Guid(g) => write!(f, "{}", g),
            AttributeValue::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            AttributeValue::OptionSet(v) => write!(f, "option({})", v),
            AttributeValue::EntityReference { logical_name, id } => match logical_name {
                Some(name) => write!(f, "{}({})", name, id),
                None => write!(f, "ref({})", id),
            },
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        AttributeValue::Int32(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Boolean(value)
    }
}

impl From<Uuid> for AttributeValue {
    fn from(value: Uuid) -> Self {
        AttributeValue::Guid(value)
    }
}

impl From<Decimal> for AttributeValue {
    fn from(value: Decimal) -> Self {
        AttributeValue::Decimal(value)
    }
}

/// An entity-like record: the payload of a create request and the shape of
/// every row the remote service returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub logical_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl Entity {
    pub fn new(logical_name: impl Into<String>) -> Self {
        Self {
            logical_name: logical_name.into(),
            id: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }
}
