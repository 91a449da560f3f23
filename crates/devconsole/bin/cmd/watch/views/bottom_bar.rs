use ratatui::{style::Stylize, text::Line};

use crate::cmd::watch::state::Focus;

/// Keybindings available in the current focus, shown in the bottom border
pub(crate) fn controls_line(focus: Focus, status: Option<String>) -> Line<'static> {
    let mut spans = match focus {
        Focus::Log => vec![
            " Close ".into(),
            "<q/Esc> ".blue().bold(),
            " | Navigate ".into(),
            "<↑↓/jk> ".blue().bold(),
            " | Follow ".into(),
            "<f> ".blue().bold(),
            " | Inspect ".into(),
            "<i> ".blue().bold(),
            " | Pause ".into(),
            "<p> ".blue().bold(),
        ],
        Focus::Inspect => vec![
            " Close ".into(),
            "<q/Esc> ".blue().bold(),
            " | Navigate ".into(),
            "<↑↓/jk> ".blue().bold(),
            " | Back ".into(),
            "<i/h> ".blue().bold(),
            " | Pause ".into(),
            "<p> ".blue().bold(),
        ],
    };

    if let Some(status) = status {
        spans.push(" | ".into());
        spans.push(status.yellow());
    }

    Line::from(spans)
}
