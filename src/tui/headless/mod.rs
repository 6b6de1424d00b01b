//! Headless mode for scripted testing and automation.
//!
//! Runs the same [`App`] against a ratatui `TestBackend`, executing scripted
//! events and capturing output for verification. Backend calls started by a
//! key press are awaited inline, so every event sees the settled state.

mod events;
mod output;

pub use events::{Assertion, Event, EventParser};
pub use output::{HeadlessOutput, ScreenRenderer};

use crate::backend::QueryBackend;
use crate::cli::{Cli, OutputFormat};
use crate::error::{DataQuestError, Result};
use crate::tui::app::{App, AppAction};
use crate::tui::ui;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use serde::Serialize;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Configuration for headless mode execution.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// Screen width in columns.
    pub width: u16,
    /// Screen height in rows.
    pub height: u16,
    pub output_format: OutputFormat,
    /// Whether to stop on first assertion failure.
    pub fail_fast: bool,
    /// Path to write output (None = stdout).
    pub output_file: Option<PathBuf>,
}

impl HeadlessConfig {
    /// Creates a HeadlessConfig from CLI arguments.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let (width, height) = cli.parse_screen_size().map_err(DataQuestError::config)?;
        let output_format = cli.parse_output_format().map_err(DataQuestError::config)?;

        Ok(Self {
            width,
            height,
            output_format,
            fail_fast: cli.fail_fast,
            output_file: cli.output_file.clone(),
        })
    }
}

/// Result of headless execution.
#[derive(Debug)]
pub struct HeadlessResult {
    /// Final screen content as text.
    pub screen: String,
    /// Screen lines for JSON output.
    pub screen_lines: Vec<String>,
    /// Number of events executed.
    pub events_executed: usize,
    /// Total execution duration.
    pub duration: Duration,
    /// Number of assertions passed.
    pub assertions_passed: usize,
    /// Failed assertions, in DSL form.
    pub failures: Vec<String>,
    /// Application state snapshot.
    pub state: HeadlessState,
    /// Frame captures (for frames output mode).
    pub frames: Vec<Frame>,
}

/// Snapshot of application state, used by state assertions and JSON output.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HeadlessState {
    pub focus: String,
    pub question: String,
    pub editable_query: String,
    pub generated_query: Option<String>,
    pub error_message: String,
    pub feedback_loop: bool,
    pub loading: bool,
    pub phase: String,
    pub row_count: usize,
    pub has_results: bool,
    pub running: bool,
}

impl HeadlessState {
    pub fn from_app(app: &App) -> Self {
        let workflow = app.workflow();
        Self {
            focus: format!("{:?}", app.focus),
            question: workflow.question().to_string(),
            editable_query: workflow.editable_query().to_string(),
            generated_query: workflow.generated_query().map(str::to_string),
            error_message: workflow.error_message().to_string(),
            feedback_loop: workflow.feedback_loop(),
            loading: workflow.is_loading(),
            phase: workflow.phase().to_string(),
            row_count: workflow.results().map_or(0, |r| r.row_count()),
            has_results: workflow.results().is_some(),
            running: app.running,
        }
    }

    /// Looks up a field by name for `assert:state:` checks.
    ///
    /// A missing generated query reads as the empty string.
    pub fn field(&self, name: &str) -> Option<String> {
        let value = match name {
            "focus" => self.focus.clone(),
            "question" => self.question.clone(),
            "editable_query" => self.editable_query.clone(),
            "generated_query" => self.generated_query.clone().unwrap_or_default(),
            "error_message" => self.error_message.clone(),
            "feedback_loop" => self.feedback_loop.to_string(),
            "loading" => self.loading.to_string(),
            "phase" => self.phase.clone(),
            "row_count" => self.row_count.to_string(),
            "has_results" => self.has_results.to_string(),
            "running" => self.running.to_string(),
            _ => return None,
        };
        Some(value)
    }
}

/// A captured frame (screen state after an event).
#[derive(Debug, Clone)]
pub struct Frame {
    /// Frame number (0 = initial state).
    pub number: usize,
    /// Event that produced this frame (None for initial).
    pub event: Option<String>,
    /// Screen content.
    pub screen: String,
}

/// Runs the TUI in headless mode.
pub struct HeadlessRunner {
    config: HeadlessConfig,
    terminal: Terminal<TestBackend>,
    app: App,
    backend: Arc<dyn QueryBackend>,
    events: Vec<Event>,
    frames: Vec<Frame>,
    assertions_passed: usize,
    failures: Vec<String>,
}

impl HeadlessRunner {
    /// Creates a new headless runner talking to `backend`.
    pub fn new(config: HeadlessConfig, backend: Arc<dyn QueryBackend>) -> Result<Self> {
        let terminal = Terminal::new(TestBackend::new(config.width, config.height)).map_err(
            |e| DataQuestError::internal(format!("Failed to create test terminal: {e}")),
        )?;

        let app = App::new(backend.describe());

        Ok(Self {
            config,
            terminal,
            app,
            backend,
            events: Vec::new(),
            frames: Vec::new(),
            assertions_passed: 0,
            failures: Vec::new(),
        })
    }

    /// Loads events from a string (comma-separated or newline-separated).
    pub fn load_events(&mut self, input: &str) -> Result<()> {
        self.events = EventParser::new().parse_all(input)?;
        Ok(())
    }

    /// Loads events from a script file, or stdin for "-".
    pub fn load_script(&mut self, path: &str) -> Result<()> {
        let content = if path == "-" {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| DataQuestError::internal(format!("Failed to read stdin: {e}")))?;
            buffer
        } else {
            std::fs::read_to_string(path).map_err(|e| {
                DataQuestError::internal(format!("Failed to read script file: {e}"))
            })?
        };

        self.load_events(&content)
    }

    /// Runs the headless execution and returns the result.
    pub async fn run(mut self) -> Result<HeadlessResult> {
        let started = Instant::now();

        self.draw()?;
        self.capture_frame(None);

        let events = std::mem::take(&mut self.events);
        let mut events_executed = 0;

        for event in events {
            let stop = self.apply_event(&event).await?;
            events_executed += 1;

            self.draw()?;
            if self.config.output_format == OutputFormat::Frames {
                self.capture_frame(Some(event.to_string()));
            }

            if stop || !self.app.running {
                break;
            }
        }

        let screen = self.render_screen();
        let screen_lines = screen.lines().map(String::from).collect();

        Ok(HeadlessResult {
            screen,
            screen_lines,
            events_executed,
            duration: started.elapsed(),
            assertions_passed: self.assertions_passed,
            failures: self.failures,
            state: HeadlessState::from_app(&self.app),
            frames: self.frames,
        })
    }

    /// Applies one scripted event. Returns true if the run should stop.
    async fn apply_event(&mut self, event: &Event) -> Result<bool> {
        match event {
            Event::Key(key) => {
                if let AppAction::Dispatch(call) = self.app.handle_key(*key) {
                    let outcome = call.run(self.backend.as_ref()).await;
                    self.app.apply_outcome(outcome);
                }
            }
            Event::Type(text) => self.app.type_text(text),
            Event::Wait(duration) => tokio::time::sleep(*duration).await,
            Event::Resize(w, h) => {
                self.terminal
                    .resize(Rect::new(0, 0, *w, *h))
                    .map_err(|e| DataQuestError::internal(format!("Resize failed: {e}")))?;
            }
            Event::Snapshot(name) => {
                debug!("Snapshot '{}'", name);
                self.capture_frame(Some(event.to_string()));
            }
            Event::Assert(assertion) => {
                self.draw()?;
                let screen = self.render_screen();
                let state = HeadlessState::from_app(&self.app);
                if assertion.check(&screen, &state) {
                    self.assertions_passed += 1;
                } else {
                    warn!("Assertion failed: {}", event);
                    self.failures.push(event.to_string());
                    return Ok(self.config.fail_fast);
                }
            }
        }
        Ok(false)
    }

    fn draw(&mut self) -> Result<()> {
        let app = &self.app;
        self.terminal
            .draw(|frame| ui::render(frame, app))
            .map_err(|e| DataQuestError::internal(format!("Failed to render: {e}")))?;
        Ok(())
    }

    /// Renders the current screen to a string.
    fn render_screen(&self) -> String {
        ScreenRenderer::render(self.terminal.backend().buffer())
    }

    /// Records the last drawn screen as a frame.
    fn capture_frame(&mut self, event: Option<String>) {
        let screen = self.render_screen();
        let number = self.frames.len();
        self.frames.push(Frame {
            number,
            event,
            screen,
        });
    }
}

/// Runs headless mode from CLI arguments. Returns the process exit code.
pub async fn run_headless(cli: &Cli, backend: Arc<dyn QueryBackend>) -> Result<i32> {
    cli.validate_headless().map_err(DataQuestError::config)?;

    let config = HeadlessConfig::from_cli(cli)?;
    let mut runner = HeadlessRunner::new(config.clone(), backend)?;

    if let Some(ref events) = cli.events {
        runner.load_events(events)?;
    } else if let Some(ref script_path) = cli.script {
        runner.load_script(script_path)?;
    }

    let result = runner.run().await?;
    let output = HeadlessOutput::new(config.output_format).format(&result);

    if let Some(ref path) = config.output_file {
        std::fs::write(path, &output)
            .map_err(|e| DataQuestError::internal(format!("Failed to write output file: {e}")))?;
    } else {
        print!("{output}");
    }

    Ok(if result.failures.is_empty() { 0 } else { 1 })
}
