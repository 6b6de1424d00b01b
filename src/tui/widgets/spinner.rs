//! Spinner and loading indicator widgets for the TUI.
//!
//! Provides animated indicators for async operations.

use std::time::Instant;

/// Braille spinner frames for query execution.
const BRAILLE_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Dot animation frames for SQL generation.
const DOT_FRAMES: &[&str] = &["", ".", "..", "..."];

/// Animation speed in milliseconds per frame.
const FRAME_DURATION_MS: u128 = 100;

/// Type of spinner animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinnerType {
    /// Braille spinner for query execution.
    Braille,
    /// Animated dots for SQL generation.
    Dots,
}

/// Spinner state for animated indicators.
#[derive(Debug, Clone)]
pub struct Spinner {
    /// Type of spinner animation.
    spinner_type: SpinnerType,
    /// When the spinner started.
    start_time: Instant,
    /// Label to display with the spinner.
    label: String,
}

impl Spinner {
    /// Creates a new spinner with the given type and label.
    pub fn new(spinner_type: SpinnerType, label: impl Into<String>) -> Self {
        Self {
            spinner_type,
            start_time: Instant::now(),
            label: label.into(),
        }
    }

    /// Creates a spinner for a generate call.
    pub fn generating() -> Self {
        Self::new(SpinnerType::Dots, "Generating")
    }

    /// Creates a new query execution spinner.
    pub fn executing() -> Self {
        Self::new(SpinnerType::Braille, "Executing")
    }

    /// Returns the current frame of the animation.
    pub fn frame(&self) -> &'static str {
        self.frame_at(self.start_time.elapsed().as_millis())
    }

    /// Returns the frame shown `elapsed_ms` after the spinner started.
    fn frame_at(&self, elapsed_ms: u128) -> &'static str {
        let frame_index = (elapsed_ms / FRAME_DURATION_MS) as usize;

        match self.spinner_type {
            SpinnerType::Braille => BRAILLE_FRAMES[frame_index % BRAILLE_FRAMES.len()],
            SpinnerType::Dots => DOT_FRAMES[frame_index % DOT_FRAMES.len()],
        }
    }

    /// Returns the display string for the spinner.
    pub fn display(&self) -> String {
        match self.spinner_type {
            SpinnerType::Braille => format!("{} {}", self.frame(), self.label),
            SpinnerType::Dots => format!("{}{}", self.label, self.frame()),
        }
    }

    /// Returns the label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Seconds since the call started.
    pub fn elapsed_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
