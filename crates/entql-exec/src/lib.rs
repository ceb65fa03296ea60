//! Command executor for the remote entity service
//!
//! Translates a command, dispatches the request through an
//! [`OrganizationService`] and assembles the result set consumers read,
//! including the column metadata describing it.

use entql_ir::metadata::MetadataError;
use entql_ir::translate::TranslateError;
use thiserror::Error;

mod columns;
mod executor;
mod mock;
mod result;
mod service;

pub use columns::{created_columns, query_columns};
pub use executor::{CommandExecutor, CommandStage};
pub use mock::MockOrganizationService;
pub use result::{ColumnMetadata, OperationResult, ResultSet};
pub use service::{Fault, OrganizationService, Response};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("Translation error: {0}")]
    Translate(#[from] TranslateError),

    #[error("Remote service fault: {0}")]
    RemoteFault(Fault),

    #[error("Unexpected {response} response to a {request} request")]
    UnexpectedResponse {
        request: &'static str,
        response: &'static str,
    },

    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Unsupported command: {0}")]
    UnsupportedCommand(String),
}
