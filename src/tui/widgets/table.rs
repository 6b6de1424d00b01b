//! Result table widget for the TUI.
//!
//! Renders query results as formatted tables with column headers,
//! auto-sized columns, and styled NULL values.

use crate::backend::{CellValue, ResultSet};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

/// Maximum width for any column.
const MAX_COLUMN_WIDTH: usize = 40;

/// Minimum width for any column.
const MIN_COLUMN_WIDTH: usize = 4;

/// Shown instead of a table when the query returned no rows.
pub const NO_RESULTS: &str = "No results found";

/// Lines around the data rows: top border, header, separator, bottom border, footer.
const CHROME_LINES: usize = 5;

/// Widget for rendering a result set as a table.
pub struct ResultTable<'a> {
    result: &'a ResultSet,
    /// Index of the first data row to show.
    scroll: usize,
}

impl<'a> ResultTable<'a> {
    /// Creates a new result table widget.
    pub fn new(result: &'a ResultSet) -> Self {
        Self { result, scroll: 0 }
    }

    /// Starts the visible rows at `scroll`.
    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }

    /// Calculates the optimal width for each column.
    fn calculate_column_widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self
            .result
            .columns
            .iter()
            .map(|col| col.chars().count().max(MIN_COLUMN_WIDTH))
            .collect();

        for row in &self.result.rows {
            for (width, value) in widths.iter_mut().zip(row) {
                *width = (*width).max(value.to_display_string().chars().count());
            }
        }

        widths.iter().map(|&w| w.min(MAX_COLUMN_WIDTH)).collect()
    }

    /// Truncates a string to fit within the given width, adding ellipsis if needed.
    fn truncate(s: &str, max_width: usize) -> String {
        if s.chars().count() <= max_width {
            s.to_string()
        } else if max_width <= 3 {
            s.chars().take(max_width).collect()
        } else {
            let head: String = s.chars().take(max_width - 3).collect();
            format!("{head}...")
        }
    }

    /// Shrinks column widths proportionally to fit `available_width`.
    fn fit_widths(&self, available_width: usize) -> Vec<usize> {
        let widths = self.calculate_column_widths();

        // Borders and padding
        let total_width: usize = widths.iter().sum::<usize>() + widths.len() * 3 + 1;
        let scale_factor = if total_width > available_width && available_width > 0 {
            available_width as f64 / total_width as f64
        } else {
            1.0
        };

        widths
            .iter()
            .map(|&w| ((w as f64 * scale_factor) as usize).max(MIN_COLUMN_WIDTH))
            .collect()
    }

    /// Renders the table to lines, showing at most `max_rows` data rows.
    pub fn render_to_lines(&self, available_width: usize, max_rows: usize) -> Vec<Line<'a>> {
        if self.result.is_empty() {
            return vec![Line::from(Span::styled(
                NO_RESULTS,
                Style::default().fg(Color::DarkGray),
            ))];
        }

        let widths = self.fit_widths(available_width);
        let total = self.result.row_count();
        let start = self.scroll.min(total.saturating_sub(1));
        let end = (start + max_rows).min(total);

        let mut lines = Vec::with_capacity(end - start + CHROME_LINES);
        lines.push(Self::render_border(&widths, '┌', '┬', '┐'));
        lines.push(self.render_header_row(&widths));
        lines.push(Self::render_border(&widths, '├', '┼', '┤'));

        for row in &self.result.rows[start..end] {
            lines.push(Self::render_data_row(row, &widths));
        }

        lines.push(Self::render_border(&widths, '└', '┴', '┘'));

        let mut footer = format!("{} row{}", total, if total == 1 { "" } else { "s" });
        if end - start < total {
            footer.push_str(&format!(" (showing {}-{})", start + 1, end));
        }
        lines.push(Line::from(Span::styled(
            footer,
            Style::default().fg(Color::DarkGray),
        )));

        lines
    }

    /// Renders a horizontal border line.
    fn render_border(widths: &[usize], left: char, mid: char, right: char) -> Line<'a> {
        let mut border = String::new();
        border.push(left);

        for (i, &width) in widths.iter().enumerate() {
            border.push_str(&"─".repeat(width + 2));
            if i < widths.len() - 1 {
                border.push(mid);
            }
        }

        border.push(right);

        Line::from(Span::styled(border, Style::default().fg(Color::DarkGray)))
    }

    /// Renders the header row with column names.
    fn render_header_row(&self, widths: &[usize]) -> Line<'a> {
        let mut spans = vec![Span::styled("│", Style::default().fg(Color::DarkGray))];

        for (name, &width) in self.result.columns.iter().zip(widths) {
            let padded = format!(" {:width$} ", Self::truncate(name, width), width = width);
            spans.push(Span::styled(
                padded,
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled("│", Style::default().fg(Color::DarkGray)));
        }

        Line::from(spans)
    }

    /// Renders a data row.
    fn render_data_row(row: &[CellValue], widths: &[usize]) -> Line<'a> {
        let mut spans = vec![Span::styled("│", Style::default().fg(Color::DarkGray))];

        for (value, &width) in row.iter().zip(widths) {
            let display = Self::truncate(&value.to_display_string(), width);
            let padded = format!(" {:width$} ", display, width = width);

            let style = if value.is_null() {
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC)
            } else {
                Style::default()
            };

            spans.push(Span::styled(padded, style));
            spans.push(Span::styled("│", Style::default().fg(Color::DarkGray)));
        }

        Line::from(spans)
    }
}

impl Widget for ResultTable<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let max_rows = (area.height as usize).saturating_sub(CHROME_LINES).max(1);
        let lines = self.render_to_lines(area.width as usize, max_rows);

        for (i, line) in lines.iter().take(area.height as usize).enumerate() {
            buf.set_line(area.x, area.y + i as u16, line, area.width);
        }
    }
}
