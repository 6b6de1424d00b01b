//! Header widget for the TUI.
//!
//! Displays the application name, version, a loading spinner and the backend
//! address.

use super::spinner::Spinner;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Span,
    widgets::Widget,
};

/// Shown after the name when there is room.
const SUBTITLE: &str = "Natural Language to SQL";

/// Header bar widget.
pub struct Header<'a> {
    backend_info: &'a str,
    spinner: Option<&'a Spinner>,
}

impl<'a> Header<'a> {
    /// Creates a new header widget.
    pub fn new(backend_info: &'a str, spinner: Option<&'a Spinner>) -> Self {
        Self {
            backend_info,
            spinner,
        }
    }
}

impl Widget for Header<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = Style::default()
            .bg(Color::Blue)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD);

        for x in area.left()..area.right() {
            buf[(x, area.y)].set_style(style);
        }

        // Left side: app name and version
        let left_text = format!(" DataQuest v{}", env!("CARGO_PKG_VERSION"));
        let left_width = left_text.chars().count() as u16;
        buf.set_span(area.x, area.y, &Span::styled(left_text, style), area.width);

        let subtitle_style = Style::default().bg(Color::Blue).fg(Color::Gray);
        let subtitle = format!(" - {SUBTITLE}");

        // Right side: backend address
        let right_text = format!(" [backend: {}] ", self.backend_info);
        let right_width = right_text.chars().count() as u16;
        let right_x = area.right().saturating_sub(right_width);
        if left_width + right_width < area.width {
            buf.set_string(right_x, area.y, &right_text, style);
        }

        // Subtitle only when nothing else needs the space
        let subtitle_width = subtitle.chars().count() as u16;
        if self.spinner.is_none() && left_width + subtitle_width + right_width < area.width {
            buf.set_string(area.x + left_width, area.y, &subtitle, subtitle_style);
        }

        // Center: spinner if active
        if let Some(spinner) = self.spinner {
            let mut spinner_text = spinner.display();
            let secs = spinner.elapsed_secs();
            if secs > 0 {
                spinner_text.push_str(&format!(" ({secs}s)"));
            }
            let spinner_style = Style::default()
                .bg(Color::Blue)
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD);
            let spinner_width = spinner_text.chars().count() as u16;
            let spinner_x = area.x + (area.width.saturating_sub(spinner_width)) / 2;
            buf.set_string(spinner_x, area.y, &spinner_text, spinner_style);
        }
    }
}
