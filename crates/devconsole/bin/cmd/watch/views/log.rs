use crate::cmd::watch::widgets::formatters::entry_style;
use devconsole::format::truncate_message;
use devconsole::EventLog;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    symbols::border,
    text::{Line, Text},
    widgets::{Block, HighlightSpacing, Row, Table, TableState},
    Frame,
};

/// Renders a placeholder while the log is empty
pub(crate) fn render_log_placeholder(title: Line, message: &str, area: Rect, frame: &mut Frame) {
    let block = Block::bordered().title(title).border_set(border::THICK);

    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    let message_width = message.chars().count() as u16;
    let x = inner_area.x + (inner_area.width.saturating_sub(message_width)) / 2;
    let y = inner_area.y + inner_area.height / 2;

    if x < inner_area.x + inner_area.width && y < inner_area.y + inner_area.height {
        frame
            .buffer_mut()
            .set_string(x, y, message, Style::default().fg(Color::DarkGray));
    }
}

/// Renders the event log of the watched channel, one row per entry
pub(crate) fn render_log_panel(
    log: &EventLog,
    title: Line,
    area: Rect,
    frame: &mut Frame,
    table_state: &mut TableState,
    is_focused: bool,
) {
    let block = Block::bordered()
        .title(title)
        .border_set(if is_focused {
            border::THICK
        } else {
            border::PLAIN
        });

    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    let available_width = inner_area.width.saturating_sub(2);
    let msg_width = (available_width.saturating_sub(22) as usize).max(20);

    let header_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    let header = Row::new(vec!["#", "Time", "Message"])
        .style(header_style)
        .height(1);

    let rows: Vec<Row> = log
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let row = Row::new(vec![
                (i + 1).to_string(),
                entry.time_label(),
                truncate_message(&entry.content, msg_width),
            ]);

            if is_focused {
                row.style(entry_style(entry.color))
            } else {
                row.style(Style::default().fg(Color::DarkGray))
            }
        })
        .collect();

    let widths = [
        Constraint::Length(5),
        Constraint::Length(13), // MMM-dd HH:mm
        Constraint::Min(20),
    ];

    let selected_row_style = Style::default()
        .add_modifier(Modifier::REVERSED)
        .bg(Color::DarkGray);

    let table = Table::new(rows, widths)
        .header(header)
        .row_highlight_style(selected_row_style)
        .highlight_symbol(Text::from(">"))
        .highlight_spacing(HighlightSpacing::Always);

    frame.render_stateful_widget(table, inner_area, table_state);
}
