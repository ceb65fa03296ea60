use entql_ast::JoinKind;
use thiserror::Error;

use crate::metadata::{AttributeType, MetadataError};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TranslateError {
    #[error("Unsupported command: {0}")]
    UnsupportedCommand(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("The select statement must include a FROM clause")]
    MissingSource,

    #[error("The select statement must select from a single entity, found {0} sources")]
    MultipleSourcesUnsupported(usize),

    #[error("Sub-query sources are not supported")]
    SubquerySourceUnsupported,

    #[error("The select statement must select at least one attribute")]
    EmptyProjection,

    #[error("Unsupported projection: {0}")]
    UnsupportedProjection(String),

    #[error("Column aliases are not supported ({column} AS {alias})")]
    UnsupportedColumnAlias { column: String, alias: String },

    #[error("Unsupported join kind: {0:?}")]
    UnsupportedJoinKind(JoinKind),

    #[error("Unsupported join condition: {0}")]
    UnsupportedJoinCondition(String),

    #[error("Could not perform join, '{0}' is an unknown entity")]
    UnknownJoinSource(String),

    #[error("Filter refers to an unknown entity or alias '{0}'")]
    UnknownFilterSource(String),

    #[error("Column refers to an unknown entity or alias '{0}'")]
    UnknownColumnSource(String),

    #[error("Unsupported filter: {0}")]
    UnsupportedFilter(String),

    #[error("Unsupported literal: {0}")]
    UnsupportedLiteral(String),

    #[error("Missing parameter value for parameter named: {0}")]
    MissingParameterValue(String),

    #[error("Invalid insert target: {0}")]
    InvalidInsertTarget(String),

    #[error("Mismatch between the number of columns ({columns}) and values ({values})")]
    ColumnValueCountMismatch { columns: usize, values: usize },

    #[error("Insert values must be a list of literals or parameters")]
    UnsupportedInsertSource,

    #[error("Unsupported insert value: {0}")]
    UnsupportedInsertValue(String),

    #[error("Entity '{entity}' has no attribute '{attribute}'")]
    UnknownAttribute { entity: String, attribute: String },

    #[error("Cannot coerce {value} to {expected:?} for attribute '{attribute}'")]
    TypeCoercion {
        attribute: String,
        expected: AttributeType,
        value: String,
    },

    #[error("Table-direct command text must be a single entity name, got '{0}'")]
    InvalidTableDirectName(String),

    #[error("Nesting deeper than {limit} levels")]
    NestingTooDeep { limit: usize },

    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),
}
