//! Application state for the TUI.
//!
//! Wraps a [`WorkflowState`] with the editing buffers, focus and scroll
//! position the terminal view needs. Key handling is synchronous: anything
//! that must reach the backend comes back as [`AppAction::Dispatch`].

use super::text::TextBuffer;
use super::widgets::spinner::Spinner;
use super::Event;
use crate::workflow::{CallOutcome, PendingCall, Phase, SubmitOptions, WorkflowState};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Rows moved by PageUp/PageDown in the results panel.
const PAGE_SIZE: usize = 10;

/// Which panel currently has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Question,
    Query,
    Results,
}

/// What the event loop should do after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    None,
    /// Send this call to the backend and feed the outcome back.
    Dispatch(PendingCall),
    Quit,
}

/// Main application state.
pub struct App {
    /// Whether the application is still running.
    pub running: bool,
    /// Current focus panel.
    pub focus: Focus,
    question: TextBuffer,
    query: TextBuffer,
    workflow: WorkflowState,
    /// First visible result row.
    pub results_scroll: usize,
    /// Backend address for the header.
    pub backend_info: String,
    /// Active while a call is in flight.
    pub spinner: Option<Spinner>,
}

impl App {
    /// Creates a new App instance.
    pub fn new(backend_info: impl Into<String>) -> Self {
        Self {
            running: true,
            focus: Focus::default(),
            question: TextBuffer::single_line(),
            query: TextBuffer::multi_line(),
            workflow: WorkflowState::new(),
            results_scroll: 0,
            backend_info: backend_info.into(),
            spinner: None,
        }
    }

    pub fn workflow(&self) -> &WorkflowState {
        &self.workflow
    }

    pub fn question(&self) -> &TextBuffer {
        &self.question
    }

    pub fn query(&self) -> &TextBuffer {
        &self.query
    }

    /// The query editor is shown once something has been generated or typed.
    pub fn query_visible(&self) -> bool {
        self.workflow.generated_query().is_some() || !self.query.is_empty()
    }

    pub fn results_visible(&self) -> bool {
        self.workflow.results().is_some()
    }

    /// Handles an event and updates application state.
    pub fn handle_event(&mut self, event: Event) -> AppAction {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Resize(_, _) | Event::Tick => AppAction::None,
        }
    }

    /// Handles a key press.
    pub fn handle_key(&mut self, key: KeyEvent) -> AppAction {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') if ctrl => {
                self.running = false;
                return AppAction::Quit;
            }
            KeyCode::Char('e') if ctrl => return self.execute(),
            KeyCode::F(5) => return self.execute(),
            KeyCode::Char('r') if ctrl => return self.retry(),
            KeyCode::Tab => {
                self.cycle_focus(true);
                return AppAction::None;
            }
            KeyCode::BackTab => {
                self.cycle_focus(false);
                return AppAction::None;
            }
            _ => {}
        }

        match self.focus {
            Focus::Question => {
                if key.code == KeyCode::Enter {
                    return self.submit();
                }
                if edit_buffer(&mut self.question, key) {
                    self.workflow.set_question(self.question.text());
                }
            }
            Focus::Query => {
                if key.code == KeyCode::Enter {
                    self.query.newline();
                    self.workflow.edit_query(self.query.text());
                } else if edit_buffer(&mut self.query, key) {
                    self.workflow.edit_query(self.query.text());
                }
            }
            Focus::Results => self.scroll_results(key.code),
        }

        AppAction::None
    }

    /// Types text into the focused input, as if each character were a key.
    pub fn type_text(&mut self, text: &str) {
        match self.focus {
            Focus::Question => {
                self.question.insert_str(text);
                self.workflow.set_question(self.question.text());
            }
            Focus::Query => {
                self.query.insert_str(text);
                self.workflow.edit_query(self.query.text());
            }
            Focus::Results => {}
        }
    }

    /// Submits the current question without error feedback.
    pub fn submit(&mut self) -> AppAction {
        let call = self.workflow.begin_generate(SubmitOptions::default());
        self.started(call, Spinner::generating())
    }

    /// Executes the editable query.
    pub fn execute(&mut self) -> AppAction {
        let call = self.workflow.begin_execute();
        self.started(call, Spinner::executing())
    }

    /// Resubmits the question with the last error and query attached.
    pub fn retry(&mut self) -> AppAction {
        let call = self.workflow.begin_retry();
        self.started(call, Spinner::generating())
    }

    /// Folds a finished call into state. Returns false for stale outcomes.
    pub fn apply_outcome(&mut self, outcome: CallOutcome) -> bool {
        if !self.workflow.apply(outcome) {
            return false;
        }

        self.spinner = None;
        match self.workflow.phase() {
            Phase::AwaitingEdit => {
                self.query.set_text(self.workflow.editable_query());
                self.focus = Focus::Query;
            }
            Phase::ShowingResults => self.results_scroll = 0,
            _ => {}
        }
        true
    }

    fn started(&mut self, call: Option<PendingCall>, spinner: Spinner) -> AppAction {
        match call {
            Some(call) => {
                self.spinner = Some(spinner);
                self.results_scroll = 0;
                // Results were just cleared
                if self.focus == Focus::Results {
                    self.focus = Focus::Query;
                }
                AppAction::Dispatch(call)
            }
            None => AppAction::None,
        }
    }

    fn cycle_focus(&mut self, forward: bool) {
        let mut panels = vec![Focus::Question];
        if self.query_visible() {
            panels.push(Focus::Query);
        }
        if self.results_visible() {
            panels.push(Focus::Results);
        }

        let current = panels.iter().position(|f| *f == self.focus).unwrap_or(0);
        let next = if forward {
            (current + 1) % panels.len()
        } else {
            (current + panels.len() - 1) % panels.len()
        };
        self.focus = panels[next];
    }

    fn scroll_results(&mut self, code: KeyCode) {
        let max = self
            .workflow
            .results()
            .map_or(0, |r| r.row_count().saturating_sub(1));

        self.results_scroll = match code {
            KeyCode::Up => self.results_scroll.saturating_sub(1),
            KeyCode::Down => self.results_scroll.saturating_add(1),
            KeyCode::PageUp => self.results_scroll.saturating_sub(PAGE_SIZE),
            KeyCode::PageDown => self.results_scroll.saturating_add(PAGE_SIZE),
            KeyCode::Home => 0,
            KeyCode::End => max,
            _ => self.results_scroll,
        }
        .min(max);
    }
}

/// Applies an editing key to a buffer. Returns true if the text changed.
fn edit_buffer(buffer: &mut TextBuffer, key: KeyEvent) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    match key.code {
        KeyCode::Char('w') if ctrl => {
            buffer.delete_word_backward();
            true
        }
        KeyCode::Char(c) if !ctrl && !alt => {
            buffer.insert(c);
            true
        }
        KeyCode::Backspace => {
            buffer.backspace();
            true
        }
        KeyCode::Delete => {
            buffer.delete();
            true
        }
        KeyCode::Left => {
            buffer.move_left();
            false
        }
        KeyCode::Right => {
            buffer.move_right();
            false
        }
        KeyCode::Home => {
            buffer.move_home();
            false
        }
        KeyCode::End => {
            buffer.move_end();
            false
        }
        KeyCode::Up => {
            buffer.move_up();
            false
        }
        KeyCode::Down => {
            buffer.move_down();
            false
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{RawRow, ResultSet};
    use crate::error::DataQuestError;
    use crate::workflow::{CallRequest, CallResult};
    use serde_json::json;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn dispatched(action: AppAction) -> PendingCall {
        match action {
            AppAction::Dispatch(call) => call,
            other => panic!("Expected dispatch, got {other:?}"),
        }
    }

    fn rows(n: i64) -> ResultSet {
        ResultSet::from_raw_rows((0..n).map(|i| RawRow::Positional(vec![json!(i)])).collect())
            .unwrap()
    }

    /// An app that has generated `sql` for "question".
    fn with_query(sql: &str) -> App {
        let mut app = App::new("http://localhost:8000");
        app.type_text("question");
        let call = dispatched(app.handle_key(key(KeyCode::Enter)));
        app.apply_outcome(CallOutcome::new(
            call.ticket,
            CallResult::Generated(Ok(sql.to_string())),
        ));
        app
    }

    #[test]
    fn test_typing_updates_question() {
        let mut app = App::new("x");
        for c in "hi there".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        app.handle_key(key(KeyCode::Backspace));
        assert_eq!(app.workflow().question(), "hi ther");
    }

    #[test]
    fn test_enter_submits_question() {
        let mut app = App::new("x");
        app.type_text("How many users signed up in 2023?");
        let call = dispatched(app.handle_key(key(KeyCode::Enter)));

        match call.request {
            CallRequest::Generate(request) => {
                assert_eq!(request.question, "How many users signed up in 2023?")
            }
            other => panic!("Expected generate, got {other:?}"),
        }
        assert!(app.workflow().is_loading());
        assert!(app.spinner.is_some());
    }

    #[test]
    fn test_enter_while_loading_is_ignored() {
        let mut app = App::new("x");
        dispatched(app.handle_key(key(KeyCode::Enter)));
        assert_eq!(app.handle_key(key(KeyCode::Enter)), AppAction::None);
        assert_eq!(app.handle_key(ctrl('e')), AppAction::None);
    }

    #[test]
    fn test_generation_fills_editor_and_moves_focus() {
        let app = with_query("SELECT 1");
        assert_eq!(app.query().text(), "SELECT 1");
        assert_eq!(app.focus, Focus::Query);
        assert!(app.spinner.is_none());
    }

    #[test]
    fn test_editing_query_syncs_workflow() {
        let mut app = with_query("SELECT COUNT(*) FROM users WHERE year=2023");
        app.type_text(" AND active=true");
        assert_eq!(
            app.workflow().editable_query(),
            "SELECT COUNT(*) FROM users WHERE year=2023 AND active=true"
        );
        assert_eq!(
            app.workflow().generated_query(),
            Some("SELECT COUNT(*) FROM users WHERE year=2023")
        );
    }

    #[test]
    fn test_enter_in_query_inserts_newline() {
        let mut app = with_query("SELECT 1");
        assert_eq!(app.handle_key(key(KeyCode::Enter)), AppAction::None);
        assert_eq!(app.workflow().editable_query(), "SELECT 1\n");
    }

    #[test]
    fn test_execute_keys() {
        for action_key in [ctrl('e'), key(KeyCode::F(5))] {
            let mut app = with_query("SELECT 1");
            let call = dispatched(app.handle_key(action_key));
            assert!(matches!(call.request, CallRequest::Execute(_)));
        }
    }

    #[test]
    fn test_execute_without_query_does_nothing() {
        let mut app = App::new("x");
        assert_eq!(app.handle_key(ctrl('e')), AppAction::None);
    }

    #[test]
    fn test_retry_only_after_failure() {
        let mut app = with_query("SELECT * FROM studnets");
        assert_eq!(app.handle_key(ctrl('r')), AppAction::None);

        let call = dispatched(app.handle_key(ctrl('e')));
        app.apply_outcome(CallOutcome::new(
            call.ticket,
            CallResult::Executed(Err(DataQuestError::rejected(
                400,
                Some("no such table: studnets".to_string()),
            ))),
        ));
        assert!(app.workflow().feedback_loop());

        let retry = dispatched(app.handle_key(ctrl('r')));
        match retry.request {
            CallRequest::Generate(request) => {
                assert_eq!(
                    request.previous_error.as_deref(),
                    Some("no such table: studnets")
                );
                assert_eq!(
                    request.previous_query.as_deref(),
                    Some("SELECT * FROM studnets")
                );
            }
            other => panic!("Expected generate, got {other:?}"),
        }
    }

    #[test]
    fn test_focus_cycles_over_visible_panels() {
        let mut app = App::new("x");
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.focus, Focus::Question);

        let mut app = with_query("SELECT 1");
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.focus, Focus::Question);
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.focus, Focus::Query);

        let call = dispatched(app.handle_key(ctrl('e')));
        app.apply_outcome(CallOutcome::new(call.ticket, CallResult::Executed(Ok(rows(3)))));
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.focus, Focus::Results);
        app.handle_key(KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT));
        assert_eq!(app.focus, Focus::Query);
    }

    #[test]
    fn test_results_scroll_is_clamped() {
        let mut app = with_query("SELECT 1");
        let call = dispatched(app.handle_key(ctrl('e')));
        app.apply_outcome(CallOutcome::new(call.ticket, CallResult::Executed(Ok(rows(15)))));
        app.focus = Focus::Results;

        app.handle_key(key(KeyCode::PageDown));
        assert_eq!(app.results_scroll, 10);
        app.handle_key(key(KeyCode::PageDown));
        assert_eq!(app.results_scroll, 14);
        app.handle_key(key(KeyCode::Up));
        assert_eq!(app.results_scroll, 13);
        app.handle_key(key(KeyCode::Home));
        assert_eq!(app.results_scroll, 0);
    }

    #[test]
    fn test_stale_outcome_leaves_spinner() {
        let mut app = App::new("x");
        let first = dispatched(app.handle_key(key(KeyCode::Enter)));
        app.apply_outcome(CallOutcome::new(
            first.ticket,
            CallResult::Generated(Err(DataQuestError::transport("refused"))),
        ));
        let _second = dispatched(app.handle_key(key(KeyCode::Enter)));

        let stale = CallOutcome::new(first.ticket, CallResult::Generated(Ok("SELECT 0".into())));
        assert!(!app.apply_outcome(stale));
        assert!(app.spinner.is_some());
        assert!(app.query().is_empty());
    }

    #[test]
    fn test_quit_keys() {
        for quit in [ctrl('c'), ctrl('q')] {
            let mut app = App::new("x");
            assert_eq!(app.handle_key(quit), AppAction::Quit);
            assert!(!app.running);
        }
    }

    #[test]
    fn test_ctrl_w_deletes_word_in_question() {
        let mut app = App::new("x");
        app.type_text("List all students");
        app.handle_key(ctrl('w'));
        assert_eq!(app.workflow().question(), "List all ");
    }
}
