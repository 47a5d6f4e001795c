//! Reusable TUI widgets.

use ratatui::prelude::*;
use ratatui::widgets::{ListItem, Paragraph};

/// Bottom status bar.
pub(crate) fn status_bar(msg: &str) -> Paragraph<'_> {
    Paragraph::new(format!(" {msg}"))
        .style(
            Style::default()
                .bg(Color::DarkGray)
                .fg(Color::White),
        )
}

/// List row with the selection marker and highlight used by every screen.
pub(crate) fn list_row(text: String, selected: bool) -> ListItem<'static> {
    let style = if selected {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let prefix = if selected { "▸ " } else { "  " };
    ListItem::new(format!("{prefix}{text}")).style(style)
}

/// Move a list cursor up or down, staying in `0..len`.
pub(crate) fn step_selection(selected: usize, len: usize, down: bool) -> usize {
    if down {
        if selected + 1 < len { selected + 1 } else { selected }
    } else {
        selected.saturating_sub(1)
    }
}
