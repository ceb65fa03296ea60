//! Entity metadata and the provider contract used at translation and
//! result-assembly time

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MetadataError {
    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    #[error("Metadata provider error: {0}")]
    Provider(String),
}

/// Attribute kinds exposed by the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeType {
    BigInt,
    Boolean,
    CalendarRules,
    Customer,
    DateTime,
    Decimal,
    Double,
    EntityName,
    Integer,
    Lookup,
    ManagedProperty,
    Memo,
    Money,
    Owner,
    PartyList,
    Picklist,
    State,
    Status,
    String,
    Uniqueidentifier,
    Virtual,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeMetadata {
    pub logical_name: String,
    pub attribute_type: AttributeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    /// Entities a lookup attribute may reference.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<String>,
}

impl AttributeMetadata {
    pub fn new(logical_name: impl Into<String>, attribute_type: AttributeType) -> Self {
        Self {
            logical_name: logical_name.into(),
            attribute_type,
            precision: None,
            scale: None,
            length: None,
            targets: Vec::new(),
        }
    }

    pub fn with_precision(mut self, precision: u32, scale: u32) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    pub fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.targets = targets.into_iter().map(Into::into).collect();
        self
    }

    // Booleans report a fixed single-digit shape regardless of what the
    // service declares.

    pub fn numeric_precision(&self) -> Option<u32> {
        match self.attribute_type {
            AttributeType::Boolean => Some(1),
            _ => self.precision,
        }
    }

    pub fn numeric_scale(&self) -> Option<u32> {
        match self.attribute_type {
            AttributeType::Boolean => Some(0),
            _ => self.scale,
        }
    }

    pub fn length(&self) -> u32 {
        match self.attribute_type {
            AttributeType::Boolean => 1,
            _ => self.length.unwrap_or(0),
        }
    }
}

/// Attributes of one entity, in the provider's declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMetadata {
    pub logical_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_id_attribute: Option<String>,
    pub attributes: Vec<AttributeMetadata>,
}

impl EntityMetadata {
    pub fn new(logical_name: impl Into<String>, attributes: Vec<AttributeMetadata>) -> Self {
        Self {
            logical_name: logical_name.into(),
            primary_id_attribute: None,
            attributes,
        }
    }

    /// Name of the attribute holding the record identifier (`<entity>id` unless declared).
    pub fn primary_id_attribute(&self) -> String {
        self.primary_id_attribute
            .clone()
            .unwrap_or_else(|| format!("{}id", self.logical_name))
    }

    pub fn attribute(&self, logical_name: &str) -> Option<&AttributeMetadata> {
        self.attributes
            .iter()
            .find(|a| a.logical_name.eq_ignore_ascii_case(logical_name))
    }
}

/// Trait for resolving entity metadata by logical name
///
/// Implementations must be deterministic for the duration of a command.
pub trait MetadataProvider {
    fn get_entity_metadata(&self, logical_name: &str) -> Result<EntityMetadata, MetadataError>;
}

/// In-memory metadata catalog
#[derive(Debug, Clone, Default)]
pub struct StaticMetadataProvider {
    entities: HashMap<String, EntityMetadata>,
}

impl StaticMetadataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entities(entities: impl IntoIterator<Item = EntityMetadata>) -> Self {
        let mut provider = Self::new();
        for entity in entities {
            provider.add_entity(entity);
        }
        provider
    }

    pub fn add_entity(&mut self, entity: EntityMetadata) {
        self.entities
            .insert(entity.logical_name.to_lowercase(), entity);
    }

    /// Entity names in the catalog, sorted.
    pub fn entity_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entities.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl MetadataProvider for StaticMetadataProvider {
    fn get_entity_metadata(&self, logical_name: &str) -> Result<EntityMetadata, MetadataError> {
        self.entities
            .get(&logical_name.to_lowercase())
            .cloned()
            .ok_or_else(|| MetadataError::UnknownEntity(logical_name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boolean_attribute_shape() {
        let attribute = AttributeMetadata::new("donotemail", AttributeType::Boolean).with_length(40);

        assert_eq!(attribute.numeric_precision(), Some(1));
        assert_eq!(attribute.numeric_scale(), Some(0));
        assert_eq!(attribute.length(), 1);
    }

    #[test]
    fn test_static_provider_lookup_is_case_insensitive() {
        let provider = StaticMetadataProvider::from_entities([EntityMetadata::new(
            "contact",
            vec![AttributeMetadata::new("contactid", AttributeType::Uniqueidentifier)],
        )]);

        let entity = provider.get_entity_metadata("Contact").unwrap();
        assert_eq!(entity.primary_id_attribute(), "contactid");
        assert!(entity.attribute("ContactId").is_some());

        assert_eq!(
            provider.get_entity_metadata("lead"),
            Err(MetadataError::UnknownEntity("lead".to_string()))
        );
    }
}
