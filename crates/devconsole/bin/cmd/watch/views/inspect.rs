use crate::cmd::watch::widgets::formatters::{entry_style, wrap_line};
use devconsole::LogEntry;
use ratatui::{
    layout::Rect,
    symbols::border,
    text::Line,
    widgets::{Block, Clear, Paragraph, Wrap},
    Frame,
};

/// Renders a centered popup with the full content of one entry
pub(crate) fn render_inspect_popup(entry: &LogEntry, index: usize, area: Rect, frame: &mut Frame) {
    let popup_width = (area.width as f32 * 0.8) as u16;
    let popup_height = (area.height as f32 * 0.8) as u16;
    let x = (area.width.saturating_sub(popup_width)) / 2;
    let y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect {
        x: area.x + x,
        y: area.y + y,
        width: popup_width,
        height: popup_height,
    };

    frame.render_widget(Clear, popup_area);

    let block = Block::bordered()
        .title(format!(" Entry #{} ({}) ", index + 1, entry.time_label()))
        .border_set(border::DOUBLE);

    let inner_area = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let max_width = inner_area.width.saturating_sub(2) as usize;
    let style = entry_style(entry.color);
    let text_lines: Vec<Line> = entry
        .content
        .lines()
        .flat_map(|line| wrap_line(line, max_width))
        .map(|line| Line::styled(line, style))
        .collect();

    let paragraph = Paragraph::new(text_lines).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, inner_area);
}
