//! Output formatting for headless mode.
//!
//! Provides different output formats: text, JSON, and frames.

use super::{HeadlessResult, HeadlessState};
use crate::cli::OutputFormat;
use ratatui::buffer::Buffer;
use serde::Serialize;

/// Renders a ratatui buffer to a string.
pub struct ScreenRenderer;

impl ScreenRenderer {
    /// Renders a buffer to plain text, one line per row.
    ///
    /// Trailing spaces and trailing blank rows are dropped.
    pub fn render(buffer: &Buffer) -> String {
        let area = buffer.area;
        let mut lines: Vec<String> = (0..area.height)
            .map(|y| {
                let row: String = (0..area.width)
                    .map(|x| buffer.cell((x, y)).map_or(" ", |cell| cell.symbol()))
                    .collect();
                row.trim_end().to_string()
            })
            .collect();

        while lines.last().is_some_and(String::is_empty) {
            lines.pop();
        }

        format!("{}\n", lines.join("\n"))
    }
}

/// JSON output structure.
#[derive(Debug, Serialize)]
struct JsonOutput<'a> {
    screen: &'a str,
    screen_lines: &'a [String],
    events_executed: usize,
    duration_ms: u64,
    assertions: AssertionSummary<'a>,
    state: &'a HeadlessState,
}

#[derive(Debug, Serialize)]
struct AssertionSummary<'a> {
    passed: usize,
    failed: usize,
    failures: &'a [String],
}

impl<'a> AssertionSummary<'a> {
    fn of(result: &'a HeadlessResult) -> Self {
        Self {
            passed: result.assertions_passed,
            failed: result.failures.len(),
            failures: &result.failures,
        }
    }

    fn any(&self) -> bool {
        self.passed > 0 || self.failed > 0
    }

    /// One line per failed assertion.
    fn failure_lines(&self) -> String {
        self.failures
            .iter()
            .map(|f| format!("FAILED: {f}\n"))
            .collect()
    }
}

/// Formats headless execution results.
pub struct HeadlessOutput {
    format: OutputFormat,
}

impl HeadlessOutput {
    /// Creates a new output formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the result according to the configured format.
    pub fn format(&self, result: &HeadlessResult) -> String {
        match self.format {
            OutputFormat::Text => Self::format_text(result),
            OutputFormat::Json => Self::format_json(result),
            OutputFormat::Frames => Self::format_frames(result),
        }
    }

    /// Final screen, a summary line, then any failed assertions.
    fn format_text(result: &HeadlessResult) -> String {
        let summary = AssertionSummary::of(result);
        let mut out = format!(
            "{}\nEvents: {} executed in {}ms | Phase: {}",
            result.screen,
            result.events_executed,
            result.duration.as_millis(),
            result.state.phase
        );
        if summary.any() {
            out.push_str(&format!(
                " | Assertions: {} passed, {} failed",
                summary.passed, summary.failed
            ));
        }
        out.push('\n');
        out.push_str(&summary.failure_lines());
        out
    }

    fn format_json(result: &HeadlessResult) -> String {
        let json_output = JsonOutput {
            screen: &result.screen,
            screen_lines: &result.screen_lines,
            events_executed: result.events_executed,
            duration_ms: result.duration.as_millis() as u64,
            assertions: AssertionSummary::of(result),
            state: &result.state,
        };

        serde_json::to_string_pretty(&json_output)
            .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize: {e}\"}}"))
    }

    /// Every captured frame, then totals.
    fn format_frames(result: &HeadlessResult) -> String {
        let mut out = String::new();
        for frame in &result.frames {
            let event_desc = frame.event.as_deref().unwrap_or("initial");
            out.push_str(&format!(
                "=== FRAME {} ({}) ===\n{}\n\n",
                frame.number, event_desc, frame.screen
            ));
        }

        out.push_str(&format!(
            "Total: {} frames, {} events executed in {}ms\n",
            result.frames.len(),
            result.events_executed,
            result.duration.as_millis()
        ));

        let summary = AssertionSummary::of(result);
        if summary.any() {
            out.push_str(&format!(
                "Assertions: {} passed, {} failed\n",
                summary.passed, summary.failed
            ));
        }
        out.push_str(&summary.failure_lines());
        out
    }
}
