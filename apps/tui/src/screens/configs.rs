//! "Configs" screen: browse source configs with a JSON preview.

use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Wrap};
use skillseeker_core::{ConfigEntry, inventory};
use skillseeker_shared::{load_source_config, validate_source_config};

use super::Workspace;
use crate::widgets::{list_row, step_selection};

pub(crate) struct ConfigsScreen {
    workspace: Workspace,
    entries: Vec<ConfigEntry>,
    selected: usize,
    preview: String,
    status: String,
}

impl ConfigsScreen {
    pub(crate) fn new(workspace: Workspace) -> Self {
        let mut screen = Self {
            workspace,
            entries: Vec::new(),
            selected: 0,
            preview: String::new(),
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
                self.entries = state.configs.into_values().collect();
                self.selected = self.selected.min(self.entries.len().saturating_sub(1));
                self.status = format!(
                    "{} config(s) in {} — ↑/↓ select, v validate, r refresh",
                    self.entries.len(),
                    self.workspace.configs_dir().display()
                );
            }
            Err(e) => self.status = format!("Scan failed: {e}"),
        }
        self.load_preview();
    }

    fn load_preview(&mut self) {
        self.preview = match self.entries.get(self.selected) {
            Some(entry) => std::fs::read_to_string(&entry.path)
                .unwrap_or_else(|e| format!("Cannot read {}: {e}", entry.path.display())),
            None => String::new(),
        };
    }

    fn validate_selected(&mut self) {
        let Some(entry) = self.entries.get(self.selected) else {
            return;
        };

        let config = match load_source_config(&entry.path) {
            Ok(config) => config,
            Err(e) => {
                self.status = format!("✗ {e}");
                return;
            }
        };

        let report = validate_source_config(&config);
        let mut lines = Vec::new();
        for error in &report.errors {
            lines.push(format!("error:   {error}"));
        }
        for warning in &report.warnings {
            lines.push(format!("warning: {warning}"));
        }

        self.status = if report.has_errors() {
            format!("✗ {}: {} error(s)", config.name, report.errors.len())
        } else if report.is_clean() {
            format!("✓ {} is valid", config.name)
        } else {
            format!("✓ {} is valid with {} warning(s)", config.name, report.warnings.len())
        };
        if !lines.is_empty() {
            self.preview = format!("{}\n\n{}", lines.join("\n"), self.preview);
        }
    }

    pub(crate) fn draw(&self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .margin(1)
            .constraints([
                Constraint::Length(32), // Config list
                Constraint::Min(1),     // Preview
            ])
            .split(area);

        if self.entries.is_empty() {
            let empty = Paragraph::new("No configs found.\n\nCreate one with\n`skillseeker config create`.")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title(" Configs "));
            f.render_widget(empty, chunks[0]);
        } else {
            let items: Vec<ListItem> = self
                .entries
                .iter()
                .enumerate()
                .map(|(i, entry)| {
                    let marker = if entry.is_router { " ⇄" } else { "" };
                    list_row(format!("{}{marker}", entry.name), i == self.selected)
                })
                .collect();
            let list = List::new(items).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" Configs ({}) ", self.entries.len())),
            );
            f.render_widget(list, chunks[0]);
        }

        let title = self
            .entries
            .get(self.selected)
            .map(|e| format!(" {} ", e.path.display()))
            .unwrap_or_else(|| " Preview ".to_string());
        let preview = Paragraph::new(self.preview.as_str())
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(preview, chunks[1]);
    }

    pub(crate) fn handle_key(&mut self, code: KeyCode, _modifiers: KeyModifiers) {
        match code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = step_selection(self.selected, self.entries.len(), false);
                self.load_preview();
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected = step_selection(self.selected, self.entries.len(), true);
                self.load_preview();
            }
            KeyCode::Char('v') | KeyCode::Enter => {
                self.load_preview();
                self.validate_selected();
            }
            KeyCode::Char('r') => self.refresh(),
            _ => {}
        }
    }
}
