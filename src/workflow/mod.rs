//! The query workflow: question → SQL → edit → execute → results, with a
//! manual retry that feeds the last error back to the backend.

pub mod call;
pub mod state;

pub use call::{CallOutcome, CallRequest, CallResult, PendingCall, Ticket};
pub use state::{
    CallKind, Phase, SubmitOptions, WorkflowState, EXECUTION_FALLBACK, GENERATION_FALLBACK,
};

use std::sync::Arc;

use crate::backend::QueryBackend;

/// Drives a [`WorkflowState`] against a backend, awaiting each call inline.
///
/// The terminal UI spawns calls instead; library callers and tests use this.
pub struct Workflow {
    backend: Arc<dyn QueryBackend>,
    state: WorkflowState,
}

impl Workflow {
    /// Creates an idle workflow bound to `backend`.
    pub fn new(backend: Arc<dyn QueryBackend>) -> Self {
        Self {
            backend,
            state: WorkflowState::new(),
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// Submits `question` and waits for the generated SQL.
    ///
    /// Returns false if nothing was sent (a call was already in flight).
    pub async fn submit_question(
        &mut self,
        question: impl Into<String>,
        options: SubmitOptions,
    ) -> bool {
        self.state.set_question(question);
        let call = self.state.begin_generate(options);
        self.drive(call).await
    }

    /// Overwrites the editable query.
    pub fn edit_query(&mut self, text: impl Into<String>) {
        self.state.edit_query(text);
    }

    /// Executes the editable query and waits for the rows.
    pub async fn execute_query(&mut self) -> bool {
        let call = self.state.begin_execute();
        self.drive(call).await
    }

    /// Resubmits the current question with the last error and query attached.
    pub async fn retry_with_feedback(&mut self) -> bool {
        let call = self.state.begin_retry();
        self.drive(call).await
    }

    async fn drive(&mut self, call: Option<PendingCall>) -> bool {
        let Some(call) = call else {
            return false;
        };
        let outcome = call.run(self.backend.as_ref()).await;
        self.state.apply(outcome)
    }
}
