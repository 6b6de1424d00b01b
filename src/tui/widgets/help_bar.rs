//! Key-hint footer.

use crate::tui::app::Focus;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

/// One-line footer listing the keys that do something right now.
pub struct HelpBar {
    focus: Focus,
    can_execute: bool,
    can_retry: bool,
}

impl HelpBar {
    pub fn new(focus: Focus, can_execute: bool, can_retry: bool) -> Self {
        Self {
            focus,
            can_execute,
            can_retry,
        }
    }

    fn hints(&self) -> Vec<(&'static str, &'static str)> {
        let mut hints = Vec::new();
        match self.focus {
            Focus::Question => hints.push(("Enter", "generate SQL")),
            Focus::Query => hints.push(("Enter", "newline")),
            Focus::Results => hints.push(("↑↓/PgUp/PgDn", "scroll")),
        }
        if self.can_execute {
            hints.push(("Ctrl+E", "execute"));
        }
        if self.can_retry {
            hints.push(("Ctrl+R", "retry"));
        }
        hints.push(("Tab", "focus"));
        hints.push(("Ctrl+Q", "quit"));
        hints
    }
}

impl Widget for HelpBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let text_style = Style::default().fg(Color::DarkGray);

        let mut spans = vec![Span::raw(" ")];
        for (i, (key, action)) in self.hints().into_iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled("  ", text_style));
            }
            spans.push(Span::styled(key, key_style));
            spans.push(Span::styled(format!(" {action}"), text_style));
        }

        Paragraph::new(Line::from(spans)).render(area, buf);
    }
}
