use entql_ir::Request;
use std::cell::RefCell;
use std::collections::VecDeque;
use uuid::Uuid;

use crate::service::{Fault, OrganizationService, Response};

/// In-memory stand-in for the remote service
///
/// Records every request it receives and answers with scripted responses in
/// order. Once the script runs out, retrieves return no rows and creates
/// return a fresh identifier.
#[derive(Debug, Default)]
pub struct MockOrganizationService {
    responses: RefCell<VecDeque<Result<Response, Fault>>>,
    requests: RefCell<Vec<Request>>,
}

impl MockOrganizationService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond_with(&self, response: Response) {
        self.responses.borrow_mut().push_back(Ok(response));
    }

    pub fn fail_with(&self, fault: Fault) {
        self.responses.borrow_mut().push_back(Err(fault));
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<Request> {
        self.requests.borrow().clone()
    }
}

impl OrganizationService for MockOrganizationService {
    fn execute(&self, request: &Request) -> Result<Response, Fault> {
        self.requests.borrow_mut().push(request.clone());

        if let Some(scripted) = self.responses.borrow_mut().pop_front() {
            return scripted;
        }
        Ok(match request {
            Request::RetrieveMany { .. } => Response::EntityCollection(Vec::new()),
            Request::Create { .. } => Response::CreatedId(Uuid::new_v4()),
        })
    }
}
