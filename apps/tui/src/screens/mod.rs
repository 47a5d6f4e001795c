//! TUI screen definitions.
//!
//! Each screen corresponds to a tab in the TUI and encapsulates its
//! own state and rendering logic.

mod configs;
mod dashboard;
mod split;

use std::fmt;
use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::prelude::*;
use skillseeker_shared::{PathsConfig, SplitDefaults};

/// Project root and the settings the screens need.
#[derive(Debug, Clone)]
pub(crate) struct Workspace {
    pub root: PathBuf,
    pub paths: PathsConfig,
    pub split: SplitDefaults,
}

impl Workspace {
    pub(crate) fn configs_dir(&self) -> PathBuf {
        self.root.join(&self.paths.configs_dir)
    }
}

/// Screen identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScreenId {
    Dashboard,
    Configs,
    Split,
}

impl ScreenId {
    pub(crate) const ALL: [ScreenId; 3] = [ScreenId::Dashboard, ScreenId::Configs, ScreenId::Split];
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dashboard => write!(f, "Dashboard"),
            Self::Configs => write!(f, "Configs"),
            Self::Split => write!(f, "Split"),
        }
    }
}

/// Per-screen state and behaviour.
pub(crate) enum Screen {
    Dashboard(dashboard::DashboardScreen),
    Configs(configs::ConfigsScreen),
    Split(split::SplitScreen),
}

impl Screen {
    pub(crate) fn new(id: ScreenId, workspace: &Workspace) -> Self {
        match id {
            ScreenId::Dashboard => Self::Dashboard(dashboard::DashboardScreen::new(workspace.clone())),
            ScreenId::Configs => Self::Configs(configs::ConfigsScreen::new(workspace.clone())),
            ScreenId::Split => Self::Split(split::SplitScreen::new(workspace.clone())),
        }
    }

    /// Re-read the filesystem.
    pub(crate) fn refresh(&mut self) {
        match self {
            Self::Dashboard(s) => s.refresh(),
            Self::Configs(s) => s.refresh(),
            Self::Split(s) => s.refresh(),
        }
    }

    /// Line for the bottom status bar.
    pub(crate) fn status(&self) -> &str {
        match self {
            Self::Dashboard(s) => s.status(),
            Self::Configs(s) => s.status(),
            Self::Split(s) => s.status(),
        }
    }

    pub(crate) fn draw(&self, f: &mut Frame, area: Rect) {
        match self {
            Self::Dashboard(s) => s.draw(f, area),
            Self::Configs(s) => s.draw(f, area),
            Self::Split(s) => s.draw(f, area),
        }
    }

    pub(crate) fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        match self {
            Self::Dashboard(s) => s.handle_key(code, modifiers),
            Self::Configs(s) => s.handle_key(code, modifiers),
            Self::Split(s) => s.handle_key(code, modifiers),
        }
    }
}
