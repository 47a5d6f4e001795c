//! "Dashboard" screen: inventory counts and suggested next steps.

use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};
use skillseeker_core::{InventoryState, MAX_SUGGESTIONS, Suggestion, inventory, suggest, suggest_all};

use super::Workspace;

pub(crate) struct DashboardScreen {
    workspace: Workspace,
    state: InventoryState,
    suggestions: Vec<Suggestion>,
    hidden: usize,
    status: String,
}

impl DashboardScreen {
    pub(crate) fn new(workspace: Workspace) -> Self {
        let mut screen = Self {
            workspace,
            state: InventoryState::default(),
            suggestions: Vec::new(),
            hidden: 0,
            status: String::new(),
        };
        screen.refresh();
        screen
    }

    pub(crate) fn status(&self) -> &str {
        &self.status
    }

    pub(crate) fn refresh(&mut self) {
        match inventory(&self.workspace.root, &self.workspace.paths) {
            Ok(state) => {
                self.suggestions = suggest(&state);
                self.hidden = suggest_all(&state).len() - self.suggestions.len();
                self.state = state;
                self.status = format!("Scanned {}", self.workspace.root.display());
            }
            Err(e) => {
                tracing::warn!(error = %e, "inventory failed");
                self.status = format!("Scan failed: {e}");
            }
        }
    }

    pub(crate) fn draw(&self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .margin(1)
            .constraints([
                Constraint::Percentage(45), // Counts
                Constraint::Percentage(55), // Suggestions
            ])
            .split(area);

        let routers = self.state.configs.values().filter(|c| c.is_router).count();
        let enhanced = self.state.built.values().filter(|b| b.enhanced).count();
        let counts = vec![
            count_line("Configurations", self.state.configs.len(), format!("{routers} router(s)")),
            count_line("Cached data", self.state.cached.len(), String::new()),
            count_line("Built skills", self.state.built.len(), format!("{enhanced} enhanced")),
            count_line("Packaged", self.state.packaged.len(), String::new()),
        ];

        let summary = Paragraph::new(counts).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", self.workspace.root.display())),
        );
        f.render_widget(summary, chunks[0]);

        if self.suggestions.is_empty() {
            let empty = Paragraph::new("Nothing to suggest.\n\nPress 'r' to rescan.")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title(" Next steps "));
            f.render_widget(empty, chunks[1]);
        } else {
            let mut items: Vec<ListItem> = self
                .suggestions
                .iter()
                .map(|s| ListItem::new(format!("  {:<20} $ {}", s.to_string(), s.command())))
                .collect();
            if self.hidden > 0 {
                items.push(
                    ListItem::new(format!("  ... and {} more", self.hidden))
                        .style(Style::default().fg(Color::DarkGray)),
                );
            }
            let list = List::new(items).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" Next steps (top {MAX_SUGGESTIONS}) ")),
            );
            f.render_widget(list, chunks[1]);
        }
    }

    pub(crate) fn handle_key(&mut self, code: KeyCode, _modifiers: KeyModifiers) {
        if code == KeyCode::Char('r') {
            self.refresh();
        }
    }
}

fn count_line(label: &str, count: usize, detail: String) -> Line<'static> {
    let mut spans = vec![
        Span::raw(format!("  {label:<16}")),
        Span::styled(
            format!("{count:>4}"),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
    ];
    if !detail.is_empty() && count > 0 {
        spans.push(Span::styled(
            format!("  ({detail})"),
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(spans)
}
