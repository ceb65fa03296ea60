//! Command envelope: what to run plus its bound parameters

use entql_ast::Statement;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::AttributeValue;

/// Prefix marking a placeholder in command text.
pub const PARAMETER_PREFIX: char = '@';

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub kind: CommandKind,
    #[serde(default)]
    pub parameters: Parameters,
}

impl Command {
    pub fn text(statement: Statement) -> Self {
        Self {
            kind: CommandKind::Text(statement),
            parameters: Parameters::default(),
        }
    }

    pub fn table_direct(entity_name: impl Into<String>) -> Self {
        Self {
            kind: CommandKind::TableDirect(entity_name.into()),
            parameters: Parameters::default(),
        }
    }

    pub fn with_parameter(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.parameters.insert(name, value);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CommandKind {
    /// A parsed SQL statement.
    Text(Statement),
    /// Bare entity name: every column, no filter.
    TableDirect(String),
    StoredProcedure(String),
}

/// Bound parameter values, keyed by name without the placeholder prefix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, AttributeValue>",
    into = "BTreeMap<String, AttributeValue>"
)]
pub struct Parameters {
    values: BTreeMap<String, AttributeValue>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: impl Into<AttributeValue>) {
        self.values.insert(normalize(name), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.values.get(&normalize(name))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn normalize(name: &str) -> String {
    name.trim_start_matches(PARAMETER_PREFIX).to_string()
}

impl From<BTreeMap<String, AttributeValue>> for Parameters {
    fn from(values: BTreeMap<String, AttributeValue>) -> Self {
        let mut parameters = Parameters::new();
        for (name, value) in values {
            parameters.insert(&name, value);
        }
        parameters
    }
}

impl From<Parameters> for BTreeMap<String, AttributeValue> {
    fn from(parameters: Parameters) -> Self {
        parameters.values
    }
}
