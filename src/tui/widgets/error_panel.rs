//! Error panel widget.
//!
//! Shows the last backend failure and, when retry is on offer, the key that
//! triggers it.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

/// Hint shown while retry with error feedback is available.
pub const RETRY_HINT: &str = "Ctrl+R: retry with error feedback";

pub struct ErrorPanel<'a> {
    message: &'a str,
    feedback_loop: bool,
}

impl<'a> ErrorPanel<'a> {
    pub fn new(message: &'a str, feedback_loop: bool) -> Self {
        Self {
            message,
            feedback_loop,
        }
    }

    /// Rows needed to show `message` in a panel `width` columns wide.
    pub fn height(message: &str, feedback_loop: bool, width: u16) -> u16 {
        let inner = width.saturating_sub(2).max(1) as usize;
        let text_rows: usize = message
            .split('\n')
            .map(|line| line.chars().count().div_ceil(inner).max(1))
            .sum();
        let hint_rows = usize::from(feedback_loop);
        (text_rows + hint_rows + 2).min(u16::MAX as usize) as u16
    }
}

impl Widget for ErrorPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(Span::styled(
                " Error ",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ));

        let mut lines: Vec<Line> = self
            .message
            .split('\n')
            .map(|line| Line::from(Span::styled(line, Style::default().fg(Color::Red))))
            .collect();

        if self.feedback_loop {
            lines.push(Line::from(Span::styled(
                RETRY_HINT,
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )));
        }

        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen(panel: ErrorPanel<'_>, area: Rect) -> String {
        let mut buf = Buffer::empty(area);
        panel.render(area, &mut buf);
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_renders_message_and_hint() {
        let area = Rect::new(0, 0, 60, 4);
        let text = screen(ErrorPanel::new("syntax error at AND", true), area);
        assert!(text.contains("syntax error at AND"));
        assert!(text.contains(RETRY_HINT));
    }

    #[test]
    fn test_no_hint_without_feedback_loop() {
        let area = Rect::new(0, 0, 60, 4);
        let text = screen(ErrorPanel::new("boom", false), area);
        assert!(!text.contains(RETRY_HINT));
    }

    #[test]
    fn test_height_accounts_for_wrapping() {
        assert_eq!(ErrorPanel::height("short", false, 40), 3);
        assert_eq!(ErrorPanel::height("short", true, 40), 4);
        // 20 inner columns, 45 characters -> 3 rows
        assert_eq!(ErrorPanel::height(&"x".repeat(45), false, 22), 5);
    }
}
