//! "Split" screen: preview a config split and save it.

use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Wrap};
use skillseeker_core::{ConfigEntry, SplitPlan, Strategy, inventory, save_configs, split};
use skillseeker_shared::{Result, load_source_config};

use super::Workspace;
use crate::widgets::{list_row, step_selection};

pub(crate) struct SplitScreen {
    workspace: Workspace,
    /// Non-router configs only.
    entries: Vec<ConfigEntry>,
    selected: usize,
    strategy: usize,
    plan: Option<SplitPlan>,
    preview: String,
    status: String,
}

impl SplitScreen {
    pub(crate) fn new(workspace: Workspace) -> Self {
        let strategy = workspace
            .split
            .strategy
            .parse::<Strategy>()
            .ok()
            .and_then(|s| Strategy::ALL.iter().position(|x| *x == s))
            .unwrap_or(0);
        let mut screen = Self {
            workspace,
            entries: Vec::new(),
            selected: 0,
            strategy,
            plan: None,
            preview: String::new(),
            status: String::new(),
        };
        screen.refresh();
        screen
    }

    pub(crate) fn status(&self) -> &str {
        &self.status
    }

    fn strategy(&self) -> Strategy {
        Strategy::ALL[self.strategy]
    }

    pub(crate) fn refresh(&mut self) {
        match inventory(&self.workspace.root, &self.workspace.paths) {
            Ok(state) => {
                self.entries = state.configs.into_values().filter(|c| !c.is_router).collect();
                self.selected = self.selected.min(self.entries.len().saturating_sub(1));
            }
            Err(e) => self.status = format!("Scan failed: {e}"),
        }
        self.recompute();
    }

    /// Rebuild the dry-run plan for the current selection.
    fn recompute(&mut self) {
        self.plan = None;
        let Some(entry) = self.entries.get(self.selected) else {
            self.preview = "No configs to split.".to_string();
            return;
        };

        let outcome = load_source_config(&entry.path)
            .and_then(|cfg| split(&cfg, self.strategy(), self.workspace.split.target_pages));
        match outcome.and_then(|plan| render_plan(&plan).map(|text| (plan, text))) {
            Ok((plan, text)) => {
                self.preview = text;
                self.status = format!(
                    "Dry run: {} document(s) — ←/→ strategy, s save, r refresh",
                    plan.len()
                );
                self.plan = Some(plan);
            }
            Err(e) => {
                self.preview = format!("Cannot split: {e}");
                self.status = "Split failed — try another strategy".to_string();
            }
        }
    }

    fn save(&mut self) {
        let Some(plan) = &self.plan else {
            self.status = "Nothing to save".to_string();
            return;
        };
        match save_configs(plan, &self.workspace.configs_dir()) {
            Ok(paths) => {
                let saved = format!(
                    "Saved {} config(s) to {}",
                    paths.len(),
                    self.workspace.configs_dir().display()
                );
                let selected_name = self.entries.get(self.selected).map(|e| e.name.clone());
                self.refresh();
                if let Some(i) = selected_name
                    .and_then(|name| self.entries.iter().position(|e| e.name == name))
                {
                    self.selected = i;
                    self.recompute();
                }
                self.status = saved;
            }
            Err(e) => self.status = format!("Save failed: {e}"),
        }
    }

    pub(crate) fn draw(&self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .margin(1)
            .constraints([
                Constraint::Length(32), // Config list
                Constraint::Min(1),     // Plan preview
            ])
            .split(area);

        let items: Vec<ListItem> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| list_row(entry.name.clone(), i == self.selected))
            .collect();
        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Source config "),
        );
        f.render_widget(list, chunks[0]);

        let title = format!(
            " Strategy: ◂ {} ▸  target {} pages ",
            self.strategy(),
            self.workspace.split.target_pages
        );
        let preview = Paragraph::new(self.preview.as_str())
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(preview, chunks[1]);
    }

    pub(crate) fn handle_key(&mut self, code: KeyCode, _modifiers: KeyModifiers) {
        match code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = step_selection(self.selected, self.entries.len(), false);
                self.recompute();
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected = step_selection(self.selected, self.entries.len(), true);
                self.recompute();
            }
            KeyCode::Left | KeyCode::Char('h') => {
                let n = Strategy::ALL.len();
                self.strategy = (self.strategy + n - 1) % n;
                self.recompute();
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.strategy = (self.strategy + 1) % Strategy::ALL.len();
                self.recompute();
            }
            KeyCode::Char('s') => self.save(),
            KeyCode::Char('r') => self.refresh(),
            _ => {}
        }
    }
}

fn render_plan(plan: &SplitPlan) -> Result<String> {
    let mut out = format!(
        "Requested {}, resolved {}\n\n{:<34} {:>9}  CATEGORIES\n",
        plan.requested, plan.resolved, "CONFIG", "MAX PAGES"
    );
    for cfg in &plan.configs {
        out.push_str(&format!(
            "{:<34} {:>9}  {}\n",
            cfg.name,
            cfg.max_pages,
            cfg.category_names().join(", ")
        ));
    }
    if let Some(router) = &plan.router {
        out.push_str(&format!(
            "{:<34} {:>9}  routes to {} sub-skill(s)\n",
            router.name(),
            "-",
            router.routes.len()
        ));
    }
    out.push_str(&format!("\nFingerprint {}\n", plan.fingerprint()?));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use skillseeker_shared::{PathsConfig, SplitDefaults};

    fn workspace() -> Workspace {
        let root = std::env::temp_dir().join(format!("ss-tui-split-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(root.join("configs")).unwrap();
        std::fs::write(
            root.join("configs/docs.json"),
            r#"{"name": "docs", "base_url": "https://docs.example.com/", "max_pages": 300, "categories": {"api": ["k1", "k2"], "guides": ["k1"]}}"#,
        )
        .unwrap();
        Workspace {
            root,
            paths: PathsConfig::default(),
            split: SplitDefaults {
                strategy: "category".into(),
                target_pages: 5000,
            },
        }
    }

    #[test]
    fn preview_follows_strategy() {
        let ws = workspace();
        let mut screen = SplitScreen::new(ws.clone());

        assert_eq!(screen.strategy(), Strategy::Category);
        let plan = screen.plan.as_ref().expect("plan");
        assert_eq!(plan.names(), vec!["docs-api", "docs-guides", "docs"]);
        assert!(screen.preview.contains("docs-api"));

        // Category → Router → Size: a size split that fits passes through.
        screen.handle_key(KeyCode::Right, KeyModifiers::NONE);
        screen.handle_key(KeyCode::Right, KeyModifiers::NONE);
        assert_eq!(screen.strategy(), Strategy::Size);
        assert_eq!(screen.plan.as_ref().map(SplitPlan::len), Some(1));

        let _ = std::fs::remove_dir_all(&ws.root);
    }

    #[test]
    fn save_writes_plan_and_keeps_selection() {
        let ws = workspace();
        let mut screen = SplitScreen::new(ws.clone());
        screen.handle_key(KeyCode::Char('s'), KeyModifiers::NONE);

        for name in ["docs-api", "docs-guides", "docs"] {
            assert!(ws.configs_dir().join(format!("{name}.json")).is_file());
        }
        // The router overwrote docs.json, so it drops out of the list.
        assert!(screen.entries.iter().all(|e| e.name != "docs"));
        assert!(screen.status.starts_with("Saved 3"));

        let _ = std::fs::remove_dir_all(&ws.root);
    }

    #[test]
    fn empty_project_has_no_plan() {
        let root: PathBuf =
            std::env::temp_dir().join(format!("ss-tui-split-{}", uuid::Uuid::now_v7()));
        let screen = SplitScreen::new(Workspace {
            root,
            paths: PathsConfig::default(),
            split: SplitDefaults::default(),
        });
        assert!(screen.plan.is_none());
        assert_eq!(screen.preview, "No configs to split.");
    }
}
