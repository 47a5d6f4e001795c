//! skillseeker CLI: turn documentation sites into packaged AI skills.
//!
//! Manages source configs (create, validate, split, route), reports project
//! status, and drives the external scrape/enhance/package/upload steps.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
