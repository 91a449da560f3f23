use devconsole::{ColorTag, ConnectionState};
use ratatui::{
    style::{Color, Style, Stylize},
    text::Span,
};

pub(crate) fn entry_color(color: ColorTag) -> Color {
    match color {
        ColorTag::Info => Color::Blue,
        ColorTag::Success => Color::Green,
        ColorTag::Error => Color::Red,
    }
}

pub(crate) fn entry_style(color: ColorTag) -> Style {
    Style::default().fg(entry_color(color))
}

pub(crate) fn state_span(state: ConnectionState) -> Span<'static> {
    let label = format!(" {} ", state.as_str());
    match state {
        ConnectionState::Connecting => label.yellow(),
        ConnectionState::Subscribed => label.green().bold(),
        ConnectionState::Errored => label.red().bold(),
        ConnectionState::Closed => label.dark_gray(),
    }
}

/// Splits `line` into chunks of at most `max_width` characters.
pub(crate) fn wrap_line(line: &str, max_width: usize) -> Vec<String> {
    if max_width == 0 || line.chars().count() <= max_width {
        return vec![line.to_string()];
    }

    let mut wrapped = Vec::new();
    let mut remaining = line;
    while !remaining.is_empty() {
        let split_at = remaining
            .char_indices()
            .nth(max_width)
            .map(|(i, _)| i)
            .unwrap_or(remaining.len());
        wrapped.push(remaining[..split_at].to_string());
        remaining = &remaining[split_at..];
    }
    wrapped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_long_lines() {
        assert_eq!(wrap_line("abcdef", 4), vec!["abcd", "ef"]);
        assert_eq!(wrap_line("abc", 4), vec!["abc"]);
        assert_eq!(wrap_line("", 4), vec![""]);
    }
}
