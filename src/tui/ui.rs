//! UI rendering for the TUI.
//!
//! Defines the layout and renders all UI components.

use super::app::{App, Focus};
use super::widgets::{
    error_panel::ErrorPanel,
    header::Header,
    help_bar::HelpBar,
    input::{self, QuestionInput},
    query_editor::{self, QueryEditor},
    table::ResultTable,
};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders},
    Frame,
};

/// Tallest the query editor grows before it scrolls.
const MAX_EDITOR_HEIGHT: u16 = 10;

/// Tallest the error panel grows before it clips.
const MAX_ERROR_HEIGHT: u16 = 8;

/// Renders the entire UI.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let workflow = app.workflow();

    let mut constraints = vec![
        Constraint::Length(1), // Header
        Constraint::Length(3), // Question
    ];
    if app.query_visible() {
        constraints.push(Constraint::Length(editor_height(app.query().line_count())));
    }
    if workflow.has_error() {
        let height = ErrorPanel::height(
            workflow.error_message(),
            workflow.feedback_loop(),
            area.width,
        )
        .min(MAX_ERROR_HEIGHT);
        constraints.push(Constraint::Length(height));
    }
    constraints.push(Constraint::Min(0)); // Results
    constraints.push(Constraint::Length(1)); // Help

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let mut next = 0;
    let mut take = || {
        let rect = chunks[next];
        next += 1;
        rect
    };

    render_header(frame, take(), app);
    render_question(frame, take(), app);
    if app.query_visible() {
        render_query(frame, take(), app);
    }
    if workflow.has_error() {
        let widget = ErrorPanel::new(workflow.error_message(), workflow.feedback_loop());
        frame.render_widget(widget, take());
    }
    render_results(frame, take(), app);

    let help = HelpBar::new(app.focus, workflow.can_execute(), workflow.can_retry());
    frame.render_widget(help, take());
}

/// Editor rows for `line_count` lines of SQL plus borders.
fn editor_height(line_count: usize) -> u16 {
    u16::try_from(line_count)
        .unwrap_or(u16::MAX)
        .saturating_add(2)
        .clamp(3, MAX_EDITOR_HEIGHT)
}

/// Renders the header bar.
fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let widget = Header::new(&app.backend_info, app.spinner.as_ref());
    frame.render_widget(widget, area);
}

/// Renders the question input and places the cursor in it when focused.
fn render_question(frame: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus == Focus::Question;
    let question = app.question();
    let widget = QuestionInput::new(
        question.text(),
        question.cursor(),
        focused,
        app.workflow().can_generate(),
    );
    frame.render_widget(widget, area);

    if focused {
        let offset = input::calculate_scroll_offset(
            question.cursor(),
            input::available_width(area.width),
        );
        // Border (1) + prompt
        let cursor_x = area.x + 1 + input::PROMPT_WIDTH + (question.cursor() - offset) as u16;
        frame.set_cursor_position((cursor_x, area.y + 1));
    }
}

/// Renders the SQL editor and places the cursor in it when focused.
fn render_query(frame: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus == Focus::Query;
    let query = app.query();
    let cursor = query.cursor_line_col();
    let edited = app
        .workflow()
        .generated_query()
        .is_some_and(|generated| generated != query.text());

    frame.render_widget(QueryEditor::new(query.text(), cursor, focused, edited), area);

    if focused {
        let inner = Block::default().borders(Borders::ALL).inner(area);
        let (row_offset, col_offset) = query_editor::scroll_offsets(inner, cursor.0, cursor.1);
        let x = inner.x + (cursor.1 - col_offset) as u16;
        let y = inner.y + (cursor.0 - row_offset) as u16;
        frame.set_cursor_position((x, y));
    }
}

/// Renders the results panel, if there is a result set.
fn render_results(frame: &mut Frame, area: Rect, app: &App) {
    let Some(results) = app.workflow().results() else {
        return;
    };
    if area.height == 0 {
        return;
    }

    let border_style = if app.focus == Focus::Results {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(" Query Results ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let table = ResultTable::new(results).scroll(app.results_scroll);
    frame.render_widget(table, inner);
}
