//! Backend calls as values.
//!
//! A [`PendingCall`] is produced by the state machine, run against a
//! [`QueryBackend`] (inline or on a spawned task), and its [`CallOutcome`]
//! is handed back to [`WorkflowState::apply`](super::WorkflowState::apply).

use std::fmt;
use std::time::Instant;
use tracing::{info, warn};

use crate::backend::{ExecuteRequest, GenerateRequest, QueryBackend, ResultSet};
use crate::error::Result;

/// Sequence number identifying one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    /// Returns the ticket following this one.
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The request a call will send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallRequest {
    Generate(GenerateRequest),
    Execute(ExecuteRequest),
}

/// A call that has been started by the state machine but not yet sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCall {
    pub ticket: Ticket,
    pub request: CallRequest,
}

impl PendingCall {
    pub fn new(ticket: Ticket, request: CallRequest) -> Self {
        Self { ticket, request }
    }

    /// Sends the request and captures the result.
    ///
    /// Never fails: backend errors are carried inside the outcome.
    pub async fn run(self, backend: &dyn QueryBackend) -> CallOutcome {
        let started = Instant::now();

        let result = match &self.request {
            CallRequest::Generate(request) => {
                info!(
                    "Generating SQL {} (feedback: {})",
                    self.ticket,
                    request.has_feedback()
                );
                CallResult::Generated(backend.generate(request).await)
            }
            CallRequest::Execute(request) => {
                info!("Executing query {}", self.ticket);
                CallResult::Executed(backend.execute(request).await)
            }
        };

        match result.error_text() {
            Some(error) => warn!(
                "Call {} failed after {}ms: {}",
                self.ticket,
                started.elapsed().as_millis(),
                error
            ),
            None => info!(
                "Call {} completed in {}ms",
                self.ticket,
                started.elapsed().as_millis()
            ),
        }

        CallOutcome::new(self.ticket, result)
    }
}

/// What a finished call produced.
#[derive(Debug, Clone, PartialEq)]
pub enum CallResult {
    Generated(Result<String>),
    Executed(Result<ResultSet>),
}

impl CallResult {
    fn error_text(&self) -> Option<String> {
        match self {
            Self::Generated(Err(e)) | Self::Executed(Err(e)) => Some(e.to_string()),
            _ => None,
        }
    }
}

/// A finished call, tagged with the ticket it was started under.
#[derive(Debug, Clone, PartialEq)]
pub struct CallOutcome {
    pub ticket: Ticket,
    pub result: CallResult,
}

impl CallOutcome {
    pub fn new(ticket: Ticket, result: CallResult) -> Self {
        Self { ticket, result }
    }
}
