use entql_ir::metadata::MetadataProvider;
use entql_ir::translate::{RequestTranslator, TranslateOptions};
use entql_ir::{AttributeValue, Command, Entity, Request};
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

use crate::columns::{created_columns, query_columns};
use crate::result::{OperationResult, ResultSet};
use crate::service::{OrganizationService, Response};
use crate::ExecutionError;

/// Lifecycle of one command execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStage {
    Received,
    Translated,
    Dispatched,
    Succeeded,
    Failed,
}

impl CommandStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandStage::Received => "received",
            CommandStage::Translated => "translated",
            CommandStage::Dispatched => "dispatched",
            CommandStage::Succeeded => "succeeded",
            CommandStage::Failed => "failed",
        }
    }
}

/// Runs commands against a remote service
///
/// Every execution translates from scratch and fetches the metadata it
/// needs; nothing is cached between commands.
pub struct CommandExecutor<'a> {
    service: &'a dyn OrganizationService,
    metadata: Option<&'a dyn MetadataProvider>,
    options: TranslateOptions,
}

impl<'a> CommandExecutor<'a> {
    pub fn new(service: &'a dyn OrganizationService) -> Self {
        Self {
            service,
            metadata: None,
            options: TranslateOptions::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: &'a dyn MetadataProvider) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_options(mut self, options: TranslateOptions) -> Self {
        self.options = options;
        self
    }

    pub fn execute(&self, command: &Command) -> Result<ResultSet, ExecutionError> {
        self.execute_operation(command).map(|operation| operation.result_set)
    }

    /// Number of affected rows. Only creates have row-count semantics.
    pub fn execute_non_query(&self, command: &Command) -> Result<i32, ExecutionError> {
        self.run(command, true).map(|operation| operation.return_value())
    }

    pub fn execute_operation(&self, command: &Command) -> Result<OperationResult, ExecutionError> {
        self.run(command, false)
    }

    fn run(&self, command: &Command, non_query: bool) -> Result<OperationResult, ExecutionError> {
        let span = info_span!("command", id = %Uuid::new_v4(), non_query);
        let _guard = span.enter();
        debug!(stage = CommandStage::Received.as_str(), "Command received");

        let result = self.translate(command).and_then(|request| {
            if non_query && !matches!(request, Request::Create { .. }) {
                return Err(ExecutionError::UnsupportedCommand(format!(
                    "non-query execution of a {} request",
                    request_kind(&request)
                )));
            }
            debug!(
                stage = CommandStage::Translated.as_str(),
                request = request_kind(&request),
                fingerprint = %request.fingerprint(),
                "Command translated"
            );
            self.dispatch(request)
        });

        match &result {
            Ok(operation) => info!(
                stage = CommandStage::Succeeded.as_str(),
                rows = operation.result_set.result_count(),
                "Command succeeded"
            ),
            Err(e) => warn!(stage = CommandStage::Failed.as_str(), error = %e, "Command failed"),
        }
        result
    }

    fn translate(&self, command: &Command) -> Result<Request, ExecutionError> {
        let translator = match self.metadata {
            Some(metadata) => RequestTranslator::new(metadata),
            None => RequestTranslator::without_metadata(),
        };
        Ok(translator
            .with_options(self.options.clone())
            .translate(command)?)
    }

    fn dispatch(&self, request: Request) -> Result<OperationResult, ExecutionError> {
        debug!(stage = CommandStage::Dispatched.as_str(), "Dispatching request");
        let response = self
            .service
            .execute(&request)
            .map_err(ExecutionError::RemoteFault)?;

        let (result_set, use_result_count_as_return_value) = match (&request, response) {
            (Request::RetrieveMany { query }, Response::EntityCollection(rows)) => {
                let column_metadata = self
                    .metadata
                    .map(|provider| query_columns(query, provider))
                    .transpose()?;
                (ResultSet { rows, column_metadata }, false)
            }
            (Request::Create { target }, Response::CreatedId(id)) => {
                let id_attribute = format!("{}id", target.logical_name);
                let mut row = Entity::new(target.logical_name.as_str());
                row.id = Some(id);
                row.set(id_attribute.as_str(), AttributeValue::Guid(id));

                let column_metadata = self
                    .metadata
                    .map(|provider| created_columns(&target.logical_name, &id_attribute, provider))
                    .transpose()?;
                (
                    ResultSet {
                        rows: vec![row],
                        column_metadata,
                    },
                    true,
                )
            }
            (request, response) => {
                return Err(ExecutionError::UnexpectedResponse {
                    request: request_kind(request),
                    response: response.kind(),
                })
            }
        };

        Ok(OperationResult {
            request,
            result_set,
            use_result_count_as_return_value,
        })
    }
}

fn request_kind(request: &Request) -> &'static str {
    match request {
        Request::RetrieveMany { .. } => "retrieve",
        Request::Create { .. } => "create",
    }
}
