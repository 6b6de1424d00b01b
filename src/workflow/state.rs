//! The ask → generate → edit → execute → view state machine.
//!
//! Pure and synchronous: `begin_*` methods mutate state and hand back a
//! [`PendingCall`] describing the request to send; [`WorkflowState::apply`]
//! folds the finished call back in. Nothing here touches the network.

use crate::backend::{ExecuteRequest, GenerateRequest, ResultSet};
use crate::workflow::call::{CallOutcome, CallRequest, CallResult, PendingCall, Ticket};
use std::fmt;
use tracing::debug;

/// Shown when a generate call fails without a backend detail.
pub const GENERATION_FALLBACK: &str = "An error occurred during generation";

/// Shown when an execute call fails without a backend detail.
pub const EXECUTION_FALLBACK: &str = "An error occurred during execution";

/// Which backend call a phase or failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Generate,
    Execute,
}

impl CallKind {
    /// Generic message used when the backend gives no detail.
    pub fn fallback_message(self) -> &'static str {
        match self {
            Self::Generate => GENERATION_FALLBACK,
            Self::Execute => EXECUTION_FALLBACK,
        }
    }
}

/// Where the workflow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Generating,
    AwaitingEdit,
    Executing,
    ShowingResults,
    ShowingError(CallKind),
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "Idle",
            Self::Generating => "Generating",
            Self::AwaitingEdit => "AwaitingEdit",
            Self::Executing => "Executing",
            Self::ShowingResults => "ShowingResults",
            Self::ShowingError(CallKind::Generate) => "ShowingError(Generate)",
            Self::ShowingError(CallKind::Execute) => "ShowingError(Execute)",
        };
        f.write_str(name)
    }
}

/// Options for a question submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmitOptions {
    /// Attach the current error and query as `previous_error`/`previous_query`.
    pub include_error_feedback: bool,
}

impl SubmitOptions {
    /// Options for a retry with error feedback.
    pub fn with_feedback() -> Self {
        Self {
            include_error_feedback: true,
        }
    }
}

/// View state of the query workflow.
#[derive(Debug, Clone, Default)]
pub struct WorkflowState {
    question: String,
    generated_query: Option<String>,
    editable_query: String,
    results: Option<ResultSet>,
    error_message: String,
    feedback_loop: bool,
    loading: bool,
    phase: Phase,
    /// Ticket of the most recently started call.
    latest_ticket: Ticket,
}

impl WorkflowState {
    /// Creates an idle workflow.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    /// SQL exactly as the backend last generated it.
    pub fn generated_query(&self) -> Option<&str> {
        self.generated_query.as_deref()
    }

    /// SQL as the user has edited it; this is what gets executed.
    pub fn editable_query(&self) -> &str {
        &self.editable_query
    }

    pub fn results(&self) -> Option<&ResultSet> {
        self.results.as_ref()
    }

    /// Last failure text, empty when there is none.
    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    pub fn has_error(&self) -> bool {
        !self.error_message.is_empty()
    }

    /// True while the retry-with-feedback action is on offer.
    pub fn feedback_loop(&self) -> bool {
        self.feedback_loop
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Replaces the question text. Called on every keystroke.
    pub fn set_question(&mut self, question: impl Into<String>) {
        self.question = question.into();
    }

    /// Overwrites the editable query. Never talks to the backend.
    pub fn edit_query(&mut self, text: impl Into<String>) {
        self.editable_query = text.into();
    }

    /// Whether a question can be submitted right now.
    pub fn can_generate(&self) -> bool {
        !self.loading
    }

    /// Whether the editable query can be executed right now.
    pub fn can_execute(&self) -> bool {
        !self.loading && !self.editable_query.is_empty()
    }

    /// Whether retry with error feedback is on offer right now.
    pub fn can_retry(&self) -> bool {
        !self.loading && self.feedback_loop
    }

    /// Starts a generate call for the current question.
    ///
    /// With `include_error_feedback`, the error message and editable query as
    /// they are at this moment are attached; an empty value is sent as absent.
    /// Returns `None` while another call is in flight.
    pub fn begin_generate(&mut self, options: SubmitOptions) -> Option<PendingCall> {
        if !self.can_generate() {
            return None;
        }

        let mut request = GenerateRequest::new(self.question.clone());
        if options.include_error_feedback {
            request = request.with_feedback(
                non_empty(&self.error_message),
                non_empty(&self.editable_query),
            );
        }

        self.start_call(Phase::Generating);
        Some(PendingCall::new(
            self.latest_ticket,
            CallRequest::Generate(request),
        ))
    }

    /// Starts a generate call that carries the failing context.
    ///
    /// Returns `None` unless the feedback loop is active.
    pub fn begin_retry(&mut self) -> Option<PendingCall> {
        if !self.can_retry() {
            return None;
        }
        self.begin_generate(SubmitOptions::with_feedback())
    }

    /// Starts an execute call for the current editable query.
    ///
    /// Returns `None` while loading or when there is nothing to execute.
    pub fn begin_execute(&mut self) -> Option<PendingCall> {
        if !self.can_execute() {
            return None;
        }

        let request = ExecuteRequest {
            query: self.editable_query.clone(),
        };

        self.start_call(Phase::Executing);
        Some(PendingCall::new(
            self.latest_ticket,
            CallRequest::Execute(request),
        ))
    }

    /// Folds a finished call back into state.
    ///
    /// Outcomes from anything but the most recent call are discarded.
    /// Returns true if the outcome was applied.
    pub fn apply(&mut self, outcome: CallOutcome) -> bool {
        if outcome.ticket != self.latest_ticket {
            debug!(
                "Discarding stale outcome {} (latest is {})",
                outcome.ticket, self.latest_ticket
            );
            return false;
        }

        self.loading = false;

        match outcome.result {
            CallResult::Generated(Ok(sql)) => {
                self.generated_query = Some(sql.clone());
                self.editable_query = sql;
                self.clear_error();
                self.phase = Phase::AwaitingEdit;
            }
            CallResult::Executed(Ok(results)) => {
                self.results = Some(results);
                self.clear_error();
                self.phase = Phase::ShowingResults;
            }
            CallResult::Generated(Err(error)) => {
                self.fail(CallKind::Generate, error.detail());
            }
            CallResult::Executed(Err(error)) => {
                self.fail(CallKind::Execute, error.detail());
            }
        }

        true
    }

    /// Common bookkeeping for a call that is starting.
    fn start_call(&mut self, phase: Phase) {
        self.latest_ticket = self.latest_ticket.next();
        self.loading = true;
        self.results = None;
        self.clear_error();
        self.phase = phase;
    }

    fn fail(&mut self, kind: CallKind, detail: Option<&str>) {
        self.error_message = match detail {
            Some(d) if !d.is_empty() => d.to_string(),
            _ => kind.fallback_message().to_string(),
        };
        self.feedback_loop = true;
        self.phase = Phase::ShowingError(kind);
    }

    fn clear_error(&mut self) {
        self.error_message.clear();
        self.feedback_loop = false;
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
