//! Question input widget for the TUI.
//!
//! A single-line text field with a prompt that scrolls horizontally to keep
//! the cursor visible.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Width of the "> " prompt.
pub const PROMPT_WIDTH: u16 = 2;

/// Calculates the scroll offset needed to keep the cursor visible.
///
/// Returns the number of characters to skip from the start of the text.
pub fn calculate_scroll_offset(cursor: usize, available_width: usize) -> usize {
    cursor.saturating_sub(available_width)
}

/// Text columns available inside a bordered input of the given width.
///
/// Border left (1) + prompt (2) + border right (1) + cursor space (1).
pub fn available_width(area_width: u16) -> usize {
    area_width.saturating_sub(PROMPT_WIDTH + 3) as usize
}

/// The question input field.
pub struct QuestionInput<'a> {
    text: &'a str,
    cursor: usize,
    focused: bool,
    enabled: bool,
}

impl<'a> QuestionInput<'a> {
    /// Creates a new input widget.
    ///
    /// `enabled` is false while a call is in flight.
    pub fn new(text: &'a str, cursor: usize, focused: bool, enabled: bool) -> Self {
        Self {
            text,
            cursor,
            focused,
            enabled,
        }
    }
}

impl Widget for QuestionInput<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let title = if self.enabled {
            " Enter Your Question "
        } else {
            " Enter Your Question (waiting for backend) "
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(title);

        let prompt_style = Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD);

        let scroll_offset = calculate_scroll_offset(self.cursor, available_width(area.width));
        let visible_text: String = self.text.chars().skip(scroll_offset).collect();

        let line = Line::from(vec![
            Span::styled("> ", prompt_style),
            Span::raw(visible_text),
        ]);

        Paragraph::new(line).block(block).render(area, buf);
    }
}
