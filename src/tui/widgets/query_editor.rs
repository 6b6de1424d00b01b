//! Multi-line SQL editor widget.

use super::input::calculate_scroll_offset;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Returns the (line, column) scroll needed to keep the cursor inside `inner`.
pub fn scroll_offsets(inner: Rect, cursor_line: usize, cursor_col: usize) -> (usize, usize) {
    let height = inner.height as usize;
    let width = inner.width.saturating_sub(1) as usize;
    (
        cursor_line.saturating_sub(height.saturating_sub(1)),
        calculate_scroll_offset(cursor_col, width),
    )
}

/// Editor for the generated (and possibly edited) SQL.
pub struct QueryEditor<'a> {
    text: &'a str,
    cursor: (usize, usize),
    focused: bool,
    edited: bool,
}

impl<'a> QueryEditor<'a> {
    /// `cursor` is the (line, column) of the cursor in characters.
    /// `edited` marks text that differs from what the backend generated.
    pub fn new(text: &'a str, cursor: (usize, usize), focused: bool, edited: bool) -> Self {
        Self {
            text,
            cursor,
            focused,
            edited,
        }
    }
}

impl Widget for QueryEditor<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let mut title = vec![Span::raw(" Generated SQL Query ")];
        if self.edited {
            title.push(Span::styled(
                "(edited) ",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::ITALIC),
            ));
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(Line::from(title));

        let inner = block.inner(area);
        let (row_offset, col_offset) = scroll_offsets(inner, self.cursor.0, self.cursor.1);

        let sql_style = Style::default().fg(Color::LightGreen);
        let lines: Vec<Line> = self
            .text
            .split('\n')
            .skip(row_offset)
            .take(inner.height as usize)
            .map(|line| {
                let visible: String = line.chars().skip(col_offset).collect();
                Line::from(Span::styled(visible, sql_style))
            })
            .collect();

        Paragraph::new(lines).block(block).render(area, buf);
    }
}
