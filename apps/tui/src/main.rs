//! skillseeker TUI: interactive dashboard for a skillseeker project.
//!
//! Shows project status, browses and validates source configs, and previews
//! or saves config splits, built with `ratatui` + `crossterm`.

mod app;
mod screens;
mod widgets;

use color_eyre::eyre::Result;

fn main() -> Result<()> {
    color_eyre::install()?;
    app::run()
}
