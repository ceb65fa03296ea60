use entql_ir::metadata::{AttributeMetadata, AttributeType};
use entql_ir::{Entity, Request};
use serde::{Deserialize, Serialize};

/// Describes one column of a result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    pub logical_name: String,
    pub entity_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_alias: Option<String>,
    pub attribute_type: AttributeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
    pub length: u32,
}

impl ColumnMetadata {
    pub fn new(entity_name: &str, attribute: &AttributeMetadata, entity_alias: Option<&str>) -> Self {
        Self {
            logical_name: attribute.logical_name.clone(),
            entity_name: entity_name.to_string(),
            entity_alias: entity_alias.map(str::to_string),
            attribute_type: attribute.attribute_type,
            precision: attribute.numeric_precision(),
            scale: attribute.numeric_scale(),
            length: attribute.length(),
        }
    }

    /// Name a consumer sees: `alias.attribute` for linked entities with an alias.
    pub fn column_name(&self) -> String {
        match &self.entity_alias {
            Some(alias) => format!("{}.{}", alias, self.logical_name),
            None => self.logical_name.clone(),
        }
    }
}

/// Rows of a completed command plus the metadata describing their columns.
///
/// `column_metadata` is `None` when no metadata provider was configured.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub rows: Vec<Entity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_metadata: Option<Vec<ColumnMetadata>>,
}

impl ResultSet {
    pub fn result_count(&self) -> usize {
        self.rows.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperationResult {
    pub request: Request,
    pub result_set: ResultSet,
    pub use_result_count_as_return_value: bool,
}

impl OperationResult {
    /// Affected row count for writes, -1 otherwise.
    pub fn return_value(&self) -> i32 {
        if self.use_result_count_as_return_value {
            i32::try_from(self.result_set.result_count()).unwrap_or(i32::MAX)
        } else {
            -1
        }
    }
}
