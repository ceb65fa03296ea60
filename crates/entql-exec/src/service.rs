use entql_ir::{Entity, Request};
use thiserror::Error;
use uuid::Uuid;

/// What the remote service sends back for a successful request.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    EntityCollection(Vec<Entity>),
    CreatedId(Uuid),
}

impl Response {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Response::EntityCollection(_) => "entity collection",
            Response::CreatedId(_) => "created id",
        }
    }
}

/// An error reported by the remote service, surfaced unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct Fault {
    pub code: Option<i32>,
    pub message: String,
}

impl Fault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(mut self, code: i32) -> Self {
        self.code = Some(code);
        self
    }
}

/// The remote entity service
///
/// One synchronous round trip per request. Timeouts and cancellation belong
/// to the implementation and are reported as a [`Fault`].
pub trait OrganizationService {
    fn execute(&self, request: &Request) -> Result<Response, Fault>;
}
