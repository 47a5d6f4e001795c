//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Report, Result, eyre};
use dialoguer::{Confirm, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use skillseeker_core::inventory::dir_size;
use skillseeker_core::workflow::resolve_skill_dir;
use skillseeker_core::{
    CleanTarget, EnhanceMode, ExternalCommand, InventoryState, StepKind, Strategy, WorkflowContext,
    WorkflowKind, WorkflowProgress, generate_router, inventory, plan_clean, plan_steps, run_batch,
    run_workflow, save_configs, select_built, select_packaged, split, suggest, suggest_all,
};
use skillseeker_shared::{
    AppConfig, SkillSeekerError, api_key_configured, find_config, find_skill_dir, init_config,
    load_config, load_source_config, new_source_config, validate_source_config,
    write_config_document,
};

/// Default discovery limit for `scrape estimate`.
const DEFAULT_MAX_DISCOVERY: u32 = 1000;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// skillseeker: turn documentation sites into AI skills.
#[derive(Parser)]
#[command(
    name = "skillseeker",
    version,
    about = "Turn documentation sites into packaged AI skills.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Project root containing configs/ and output/.
    #[arg(long, global = true, env = "SKILLSEEKER_ROOT")]
    pub root: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Output format for `config list`.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum ListFormat {
    Table,
    Json,
    Simple,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Manage source configurations.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Router configs for split skills.
    Router {
        #[command(subcommand)]
        action: RouterAction,
    },

    /// Show configs, cached data, built and packaged skills.
    Status {
        /// Show per-item details.
        #[arg(long)]
        detailed: bool,
    },

    /// Delete cached data, checkpoints, or enhancer backups.
    Clean {
        /// What to delete: all, cache, checkpoints, or backups.
        #[arg(default_value = "all")]
        target: String,

        /// Only clean this skill.
        #[arg(long)]
        skill: Option<String>,

        /// Skip the confirmation prompt.
        #[arg(long)]
        force: bool,
    },

    /// First-run wizard: pick or create a config, estimate, then run the full workflow.
    Init {
        /// Use this existing config instead of asking.
        #[arg(long)]
        preset: Option<String>,
    },

    /// Scrape documentation for a config.
    Scrape {
        #[command(subcommand)]
        action: ScrapeAction,
    },

    /// Rebuild a skill from cached data.
    Build {
        /// Skill (config) name.
        skill: String,
    },

    /// Improve a built skill's SKILL.md.
    Enhance {
        /// Skill name or directory.
        skill: String,

        /// local (no API key) or api.
        #[arg(long, default_value = "local")]
        mode: String,
    },

    /// Package built skills into .zip archives.
    Package {
        #[command(subcommand)]
        action: PackageAction,
    },

    /// Upload packaged skills.
    Upload {
        #[command(subcommand)]
        action: UploadAction,
    },

    /// Multi-step workflows.
    Workflow {
        #[command(subcommand)]
        action: WorkflowAction,
    },

    /// Application settings file.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

/// `config` subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// List available configurations.
    List {
        #[arg(long, default_value = "table")]
        format: ListFormat,
    },
    /// Create a new configuration skeleton.
    Create {
        /// Config name (letters, numbers, hyphens, underscores).
        #[arg(long)]
        name: String,

        /// Documentation base URL.
        #[arg(long)]
        url: String,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long, default_value = "100")]
        max_pages: u32,

        /// Overwrite an existing config.
        #[arg(long)]
        force: bool,
    },
    /// Check a configuration for errors and warnings.
    Validate {
        /// Config name or path.
        config: String,
    },
    /// Split a large configuration into focused sub-configs.
    Split {
        /// Config name or path.
        config: String,

        /// auto, none, category, router, or size. Defaults to the settings file.
        #[arg(long)]
        strategy: Option<String>,

        /// Target pages per sub-skill. Defaults to the settings file.
        #[arg(long)]
        target_pages: Option<u32>,

        /// Preview the plan without writing files.
        #[arg(long)]
        dry_run: bool,

        /// Where to write the plan. Defaults to the configs directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
}

/// `scrape` subcommands.
#[derive(Subcommand)]
pub(crate) enum ScrapeAction {
    /// Scrape documentation and build the skill.
    Run {
        /// Config name or path.
        config: String,

        /// Build from cached data without fetching.
        #[arg(long)]
        skip_scrape: bool,

        /// Resume from the last checkpoint.
        #[arg(long)]
        resume: bool,

        /// Ignore any checkpoint and start over.
        #[arg(long, conflicts_with = "resume")]
        fresh: bool,

        /// Override the config's page limit.
        #[arg(long)]
        max_pages: Option<u32>,
    },
    /// Count discoverable pages before scraping.
    Estimate {
        /// Config name or path.
        config: String,

        /// Stop discovering after this many pages.
        #[arg(long, default_value_t = DEFAULT_MAX_DISCOVERY)]
        max_discovery: u32,
    },
    /// Show what would be scraped without downloading.
    DryRun {
        /// Config name or path.
        config: String,
    },
}

/// `package` subcommands.
#[derive(Subcommand)]
pub(crate) enum PackageAction {
    /// Package one skill.
    Single {
        /// Skill name or directory.
        skill: String,

        /// Upload after packaging.
        #[arg(long)]
        upload: bool,
    },
    /// Package every built skill whose name matches a glob pattern.
    Multi {
        pattern: String,

        #[arg(long)]
        upload: bool,
    },
    /// Package every built skill.
    All {
        #[arg(long)]
        upload: bool,
    },
}

/// `upload` subcommands.
#[derive(Subcommand)]
pub(crate) enum UploadAction {
    /// Upload one .zip archive.
    Skill {
        /// Path to the .zip archive.
        archive: PathBuf,
    },
    /// Upload every packaged skill matching a glob pattern.
    Batch { pattern: String },
}

/// `router` subcommands.
#[derive(Subcommand)]
pub(crate) enum RouterAction {
    /// Build a router config over existing sub-configs.
    Generate {
        /// Sub-config names or paths.
        #[arg(required = true)]
        configs: Vec<String>,

        /// Router name. Derived from the sub-config names when omitted.
        #[arg(long)]
        name: Option<String>,

        /// Where to write the router. Defaults to the configs directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
}

/// `workflow` subcommands.
#[derive(Subcommand)]
pub(crate) enum WorkflowAction {
    /// Scrape and package.
    Quick {
        config: String,
        #[arg(long)]
        upload: bool,
    },
    /// Scrape, enhance, and package.
    Full {
        config: String,
        /// local, api, or none.
        #[arg(long, default_value = "local")]
        enhance: String,
        #[arg(long)]
        upload: bool,
    },
    /// Rebuild from cached data, enhance, and package.
    Rebuild {
        skill: String,
        /// local, api, or none.
        #[arg(long, default_value = "none")]
        enhance: String,
        #[arg(long)]
        upload: bool,
    },
}

/// `settings` subcommands.
#[derive(Subcommand)]
pub(crate) enum SettingsAction {
    /// Write a settings file with defaults.
    Init,
    /// Show resolved settings.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "skillseeker=info",
        1 => "skillseeker=debug",
        _ => "skillseeker=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Resolved project root plus settings.
struct Project {
    root: PathBuf,
    settings: AppConfig,
}

impl Project {
    fn load(root: Option<PathBuf>) -> Result<Self> {
        Ok(Self {
            root: root.unwrap_or_else(|| PathBuf::from(".")),
            settings: load_config()?,
        })
    }

    fn configs_dir(&self) -> PathBuf {
        self.root.join(&self.settings.paths.configs_dir)
    }

    fn find_config(&self, query: &str) -> Result<PathBuf> {
        find_config(&self.root, &self.settings.paths.configs_dir, query).ok_or_else(|| {
            eyre!(
                "config not found: '{query}' (looked in {})",
                self.configs_dir().display()
            )
        })
    }

    fn context(&self, skill: &str) -> WorkflowContext {
        WorkflowContext::new(&self.root, self.settings.paths.clone(), skill)
    }

    fn collaborator(&self) -> ExternalCommand {
        ExternalCommand::new(self.settings.collaborators.clone())
    }
}

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    match cli.command {
        // Settings commands must work even when the settings file is broken.
        Command::Settings { action } => run_settings(action),
        command => {
            let project = Project::load(cli.root)?;
            dispatch(&project, command)
        }
    }
}

fn dispatch(project: &Project, command: Command) -> Result<()> {
    match command {
        Command::Config { action } => match action {
            ConfigAction::List { format } => cmd_config_list(project, &format),
            ConfigAction::Create {
                name,
                url,
                description,
                max_pages,
                force,
            } => cmd_config_create(project, &name, &url, &description, max_pages, force),
            ConfigAction::Validate { config } => cmd_config_validate(project, &config),
            ConfigAction::Split {
                config,
                strategy,
                target_pages,
                dry_run,
                output_dir,
            } => cmd_config_split(
                project,
                &config,
                strategy.as_deref(),
                target_pages,
                dry_run,
                output_dir,
            ),
        },
        Command::Router { action } => match action {
            RouterAction::Generate {
                configs,
                name,
                output_dir,
            } => cmd_router_generate(project, &configs, name.as_deref(), output_dir),
        },
        Command::Status { detailed } => cmd_status(project, detailed),
        Command::Clean {
            target,
            skill,
            force,
        } => cmd_clean(project, &target, skill.as_deref(), force),
        Command::Init { preset } => cmd_init(project, preset),
        Command::Scrape { action } => match action {
            ScrapeAction::Run {
                config,
                skip_scrape,
                resume,
                fresh,
                max_pages,
            } => {
                let mut options = Vec::new();
                if skip_scrape {
                    options.push("--skip-scrape".to_string());
                }
                if resume {
                    options.push("--resume".to_string());
                }
                if fresh {
                    options.push("--fresh".to_string());
                }
                if let Some(max) = max_pages {
                    options.push("--max-pages".to_string());
                    options.push(max.to_string());
                }
                cmd_scrape(project, &config, StepKind::Scrape, options)
            }
            ScrapeAction::Estimate {
                config,
                max_discovery,
            } => cmd_scrape(
                project,
                &config,
                StepKind::Estimate,
                vec!["--max-discovery".to_string(), max_discovery.to_string()],
            ),
            ScrapeAction::DryRun { config } => {
                cmd_scrape(project, &config, StepKind::ScrapePreview, Vec::new())
            }
        },
        Command::Build { skill } => cmd_build(project, &skill),
        Command::Enhance { skill, mode } => cmd_enhance(project, &skill, &mode),
        Command::Package { action } => match action {
            PackageAction::Single { skill, upload } => cmd_package(project, &skill, upload),
            PackageAction::Multi { pattern, upload } => {
                cmd_package_batch(project, Some(&pattern), upload)
            }
            PackageAction::All { upload } => cmd_package_batch(project, None, upload),
        },
        Command::Upload { action } => match action {
            UploadAction::Skill { archive } => cmd_upload(project, &archive),
            UploadAction::Batch { pattern } => cmd_upload_batch(project, &pattern),
        },
        Command::Workflow { action } => match action {
            WorkflowAction::Quick { config, upload } => {
                cmd_workflow(project, WorkflowKind::Quick, &config, "none", upload)
            }
            WorkflowAction::Full {
                config,
                enhance,
                upload,
            } => cmd_workflow(project, WorkflowKind::Full, &config, &enhance, upload),
            WorkflowAction::Rebuild {
                skill,
                enhance,
                upload,
            } => cmd_workflow(project, WorkflowKind::Rebuild, &skill, &enhance, upload),
        },
        Command::Settings { action } => run_settings(action),
    }
}

fn run_settings(action: SettingsAction) -> Result<()> {
    match action {
        SettingsAction::Init => cmd_settings_init(),
        SettingsAction::Show => cmd_settings_show(),
    }
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn cmd_config_list(project: &Project, format: &ListFormat) -> Result<()> {
    let state = inventory(&project.root, &project.settings.paths)?;

    match format {
        ListFormat::Simple => {
            for name in state.configs.keys() {
                println!("{name}");
            }
        }
        ListFormat::Json => {
            let entries: Vec<serde_json::Value> = state
                .configs
                .iter()
                .map(|(stem, entry)| {
                    serde_json::json!({
                        "file": stem,
                        "name": entry.name,
                        "path": entry.path.display().to_string(),
                        "description": entry.description,
                        "max_pages": entry.max_pages,
                        "is_router": entry.is_router,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        ListFormat::Table => {
            if state.configs.is_empty() {
                println!("No configs found in {}", project.configs_dir().display());
                return Ok(());
            }
            println!();
            println!("  {:<28} {:>9}  {:<6}  DESCRIPTION", "NAME", "MAX PAGES", "ROUTER");
            for (stem, entry) in &state.configs {
                let pages = entry
                    .max_pages
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "?".into());
                let router = if entry.is_router { "yes" } else { "" };
                let description = entry.description.as_deref().unwrap_or("");
                println!(
                    "  {stem:<28} {pages:>9}  {router:<6}  {}",
                    truncate(description, 60)
                );
            }
            println!();
            println!("  {} config(s)", state.configs.len());
            println!();
        }
    }

    Ok(())
}

fn cmd_config_create(
    project: &Project,
    name: &str,
    url: &str,
    description: &str,
    max_pages: u32,
    force: bool,
) -> Result<()> {
    let config = new_source_config(name, url, description, max_pages)?;

    let path = project.configs_dir().join(format!("{name}.json"));
    if path.exists() && !force {
        return Err(eyre!(
            "{} already exists; pass --force to overwrite",
            path.display()
        ));
    }

    write_config_document(&path, &config)?;

    info!(name, path = %path.display(), "created config");
    println!("Created {}", path.display());
    println!("Next: edit selectors and categories, then run `skillseeker config validate {name}`");
    Ok(())
}

fn cmd_config_validate(project: &Project, query: &str) -> Result<()> {
    let path = project.find_config(query)?;
    let config = load_source_config(&path)?;
    let report = validate_source_config(&config);

    println!("Validating {}", path.display());
    for error in &report.errors {
        println!("  error:   {error}");
    }
    for warning in &report.warnings {
        println!("  warning: {warning}");
    }

    if report.has_errors() {
        return Err(eyre!("{} error(s) in {}", report.errors.len(), path.display()));
    }
    if report.is_clean() {
        println!("  OK");
    } else {
        println!("  valid with {} warning(s)", report.warnings.len());
    }
    Ok(())
}

fn cmd_config_split(
    project: &Project,
    query: &str,
    strategy: Option<&str>,
    target_pages: Option<u32>,
    dry_run: bool,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let path = project.find_config(query)?;
    let config = load_source_config(&path)?;

    let strategy: Strategy = strategy
        .unwrap_or(&project.settings.split.strategy)
        .parse()?;
    let target_pages = target_pages.unwrap_or(project.settings.split.target_pages);
    let out_dir = output_dir.unwrap_or_else(|| project.configs_dir());

    info!(
        config = %config.name,
        %strategy,
        target_pages,
        dry_run,
        "splitting config"
    );

    let plan = split(&config, strategy, target_pages)?;

    println!();
    println!(
        "  Split '{}' ({} pages) with strategy {} (resolved: {}), target {} pages",
        config.name, config.max_pages, plan.requested, plan.resolved, target_pages
    );
    println!();
    println!("  {:<36} {:>9}  CATEGORIES", "CONFIG", "MAX PAGES");
    for sub in &plan.configs {
        let exists = out_dir.join(format!("{}.json", sub.name)).exists();
        println!(
            "  {:<36} {:>9}  {}{}",
            sub.name,
            sub.max_pages,
            sub.category_names().join(", "),
            if exists { "  (overwrites)" } else { "" }
        );
    }
    if let Some(router) = &plan.router {
        let exists = out_dir.join(format!("{}.json", router.name())).exists();
        println!(
            "  {:<36} {:>9}  router over {} sub-skill(s){}",
            router.name(),
            "-",
            router.routes.len(),
            if exists { "  (overwrites)" } else { "" }
        );
    }
    println!();
    println!("  Plan fingerprint: {}", plan.fingerprint()?);
    println!();

    if dry_run {
        println!("  Dry run: no files written.");
        return Ok(());
    }

    let written = save_configs(&plan, &out_dir)?;
    if written.len() != plan.len() {
        return Err(eyre!(
            "wrote {} of {} planned configs",
            written.len(),
            plan.len()
        ));
    }
    for path in &written {
        println!("  wrote {}", path.display());
    }
    println!();
    Ok(())
}

// ---------------------------------------------------------------------------
// router
// ---------------------------------------------------------------------------

fn cmd_router_generate(
    project: &Project,
    queries: &[String],
    name: Option<&str>,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    // Unresolvable names are passed through as paths so the generator can
    // warn about them and carry on.
    let paths: Vec<PathBuf> = queries
        .iter()
        .map(|q| project.find_config(q).unwrap_or_else(|_| PathBuf::from(q)))
        .collect();
    let out_dir = output_dir.unwrap_or_else(|| project.configs_dir());

    let (router, path) = generate_router(&paths, name, &out_dir)?;

    println!("Router '{}' written to {}", router.name(), path.display());
    for (sub, summary) in router.routes.iter() {
        println!("  {sub:<32} {summary}");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// status
// ---------------------------------------------------------------------------

fn cmd_status(project: &Project, detailed: bool) -> Result<()> {
    let state = inventory(&project.root, &project.settings.paths)?;

    println!();
    println!("  skillseeker project status ({})", project.root.display());
    println!();

    print_configs(&state, detailed);
    print_cached(&state);
    print_built(&state);
    print_packaged(&state);

    let key_env = &project.settings.upload.api_key_env;
    if api_key_configured(&project.settings) {
        println!("  API key: {key_env} is set (upload and API enhancement available)");
    } else {
        println!("  API key: {key_env} is not set (local enhancement only)");
    }
    println!();

    let shown = suggest(&state);
    if !shown.is_empty() {
        println!("  Suggested next steps:");
        for suggestion in &shown {
            println!("    {:<24} $ {}", suggestion.to_string(), suggestion.command());
        }
        let hidden = suggest_all(&state).len() - shown.len();
        if hidden > 0 {
            println!("    ... and {hidden} more");
        }
        println!();
    } else if state.is_empty() {
        println!("  Nothing here yet. Start with `skillseeker config create`.");
        println!();
    }

    Ok(())
}

fn print_configs(state: &InventoryState, detailed: bool) {
    if state.configs.is_empty() {
        return;
    }
    println!("  Configurations: {}", state.configs.len());
    if detailed {
        for (stem, entry) in &state.configs {
            let pages = entry
                .max_pages
                .map(|p| p.to_string())
                .unwrap_or_else(|| "?".into());
            let kind = if entry.is_router { " [router]" } else { "" };
            println!("    {stem:<28} {pages:>6} pages{kind}");
        }
    } else {
        let names: Vec<&str> = state.configs.keys().take(5).map(String::as_str).collect();
        let more = state.configs.len().saturating_sub(5);
        let mut line = names.join(", ");
        if more > 0 {
            line.push_str(&format!(", +{more} more"));
        }
        println!("    {line}");
    }
    println!();
}

fn print_cached(state: &InventoryState) {
    if state.cached.is_empty() {
        return;
    }
    println!("  Cached data: {}", state.cached.len());
    for (name, data) in &state.cached {
        let pages = data
            .total_pages
            .map(|p| format!("{p} pages, "))
            .unwrap_or_default();
        println!("    {name} ({pages}{})", format_size(data.size_bytes));
    }
    println!();
}

fn print_built(state: &InventoryState) {
    if state.built.is_empty() {
        return;
    }
    println!("  Built skills: {}", state.built.len());
    for (name, skill) in &state.built {
        let enhanced = if skill.enhanced { ", enhanced" } else { "" };
        println!(
            "    {name} (SKILL.md + {} references{enhanced})",
            skill.reference_count
        );
    }
    println!();
}

fn print_packaged(state: &InventoryState) {
    if state.packaged.is_empty() {
        return;
    }
    println!("  Packaged: {}", state.packaged.len());
    for (name, archive) in &state.packaged {
        println!("    {name}.zip ({})", format_size(archive.size_bytes));
    }
    println!();
}

// ---------------------------------------------------------------------------
// clean
// ---------------------------------------------------------------------------

fn cmd_clean(project: &Project, target: &str, skill: Option<&str>, force: bool) -> Result<()> {
    let target: CleanTarget = target.parse()?;
    let items = plan_clean(&project.root, &project.settings.paths.output_dir, target, skill)?;

    if items.is_empty() {
        println!("Nothing to clean.");
        return Ok(());
    }

    let mut total = 0;
    println!("Will delete:");
    for item in &items {
        let size = if item.path.is_dir() {
            dir_size(&item.path)?
        } else {
            std::fs::metadata(&item.path).map(|m| m.len()).unwrap_or(0)
        };
        total += size;
        println!("  [{}] {} ({})", item.kind, item.path.display(), format_size(size));
    }
    println!("Total: {}", format_size(total));

    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete {} item(s)?", items.len()))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let report = skillseeker_core::clean(&items);
    println!("Deleted {} item(s).", report.deleted.len());
    for (path, error) in &report.failed {
        println!("  failed: {} ({error})", path.display());
    }
    if !report.failed.is_empty() {
        return Err(eyre!("{} item(s) could not be deleted", report.failed.len()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// scrape / build / enhance / package / upload / workflow
// ---------------------------------------------------------------------------

/// Run a config-driven scrape step: the scrape itself, an estimate, or a preview.
fn cmd_scrape(project: &Project, query: &str, step: StepKind, options: Vec<String>) -> Result<()> {
    let path = project.find_config(query)?;
    let config = load_source_config(&path)?;
    if config.is_router() {
        return Err(eyre!(
            "'{}' is a router config; scrape its sub-configs instead",
            config.name
        ));
    }

    let mut ctx = project.context(&config.name);
    ctx.config_path = Some(path);
    ctx.set_options(step, options);
    run_steps(project, &ctx, &[step])
}

fn cmd_build(project: &Project, skill: &str) -> Result<()> {
    let mut ctx = project.context(skill);
    ctx.config_path = Some(project.find_config(skill)?);
    run_steps(project, &ctx, &[StepKind::Build])
}

fn cmd_enhance(project: &Project, skill: &str, mode: &str) -> Result<()> {
    let mode: EnhanceMode = mode.parse()?;
    let step = match mode {
        EnhanceMode::Local => StepKind::EnhanceLocal,
        EnhanceMode::Api => {
            require_api_key(project)?;
            StepKind::EnhanceApi
        }
        EnhanceMode::None => return Err(eyre!("enhance mode must be 'local' or 'api'")),
    };
    let ctx = skill_context(project, skill);
    run_steps(project, &ctx, &[step])
}

fn cmd_package(project: &Project, skill: &str, upload: bool) -> Result<()> {
    let ctx = skill_context(project, skill);
    let mut steps = vec![StepKind::Package];
    if upload {
        require_api_key(project)?;
        steps.push(StepKind::Upload);
    }
    run_steps(project, &ctx, &steps)
}

fn cmd_upload(project: &Project, archive: &Path) -> Result<()> {
    if archive.extension().is_none_or(|ext| ext != "zip") {
        return Err(eyre!("not a .zip archive: {}", archive.display()));
    }
    require_api_key(project)?;
    let skill = archive
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| eyre!("invalid archive path: {}", archive.display()))?;
    let mut ctx = project.context(skill);
    ctx.archive_override = Some(archive.to_path_buf());
    run_steps(project, &ctx, &[StepKind::Upload])
}

/// `package multi <pattern>` and `package all`.
fn cmd_package_batch(project: &Project, pattern: Option<&str>, upload: bool) -> Result<()> {
    if upload {
        require_api_key(project)?;
    }
    let state = inventory(&project.root, &project.settings.paths)?;
    let names = select_built(&state, pattern)?;
    if names.is_empty() {
        return Err(match pattern {
            Some(pattern) => eyre!("no built skills match '{pattern}'"),
            None => eyre!("no built skills to package; run `skillseeker build` first"),
        });
    }

    let mut steps = vec![StepKind::Package];
    if upload {
        steps.push(StepKind::Upload);
    }
    let contexts: Vec<WorkflowContext> = names.iter().map(|n| project.context(n)).collect();
    run_batch_steps(project, &contexts, &steps, "Packaged")
}

fn cmd_upload_batch(project: &Project, pattern: &str) -> Result<()> {
    require_api_key(project)?;
    let state = inventory(&project.root, &project.settings.paths)?;
    let names = select_packaged(&state, Some(pattern))?;
    if names.is_empty() {
        return Err(eyre!("no .zip archives match '{pattern}'"));
    }

    let contexts: Vec<WorkflowContext> = names.iter().map(|n| project.context(n)).collect();
    run_batch_steps(project, &contexts, &[StepKind::Upload], "Uploaded")
}

fn cmd_workflow(
    project: &Project,
    kind: WorkflowKind,
    target: &str,
    enhance: &str,
    upload: bool,
) -> Result<()> {
    let enhance: EnhanceMode = enhance.parse()?;
    if upload || enhance == EnhanceMode::Api {
        require_api_key(project)?;
    }

    let path = project.find_config(target)?;
    let config = load_source_config(&path)?;
    let mut ctx = project.context(&config.name);
    ctx.config_path = Some(path);

    let steps = plan_steps(kind, enhance, upload);
    run_steps(project, &ctx, &steps)
}

/// Context for a skill given by name or by directory path.
fn skill_context(project: &Project, skill: &str) -> WorkflowContext {
    let dir = find_skill_dir(&project.root, &project.settings.paths.output_dir, skill)
        .unwrap_or_else(|| resolve_skill_dir(&project.root, &project.settings.paths, skill));
    let name = dir
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(skill)
        .to_string();
    let mut ctx = project.context(&name);
    ctx.skill_dir_override = Some(dir);
    ctx
}

fn require_api_key(project: &Project) -> Result<()> {
    if api_key_configured(&project.settings) {
        Ok(())
    } else {
        Err(eyre!(
            "{} is not set; export it or change [upload].api_key_env in the settings file",
            project.settings.upload.api_key_env
        ))
    }
}

fn run_steps(project: &Project, ctx: &WorkflowContext, steps: &[StepKind]) -> Result<()> {
    let collaborator = project.collaborator();
    let progress = CliProgress::new();

    let result = run_workflow(ctx, steps, &collaborator, &progress);
    progress.finish();

    match result {
        Ok(result) => {
            println!();
            println!("  Done: {} ({} step(s))", ctx.skill, result.completed.len());
            println!("  Time: {:.1}s", result.elapsed.as_secs_f64());
            println!();
            Ok(())
        }
        Err(e @ SkillSeekerError::Collaborator { .. }) => {
            Err(Report::new(e).wrap_err(format!("workflow for '{}' stopped", ctx.skill)))
        }
        Err(e) => Err(e.into()),
    }
}

fn run_batch_steps(
    project: &Project,
    contexts: &[WorkflowContext],
    steps: &[StepKind],
    verb: &str,
) -> Result<()> {
    let collaborator = project.collaborator();
    let progress = CliProgress::new();

    let report = run_batch(contexts, steps, &collaborator, &progress);
    progress.finish();
    let report = report?;

    println!();
    println!("  {verb} {} skill(s)", report.succeeded.len());
    for (skill, error) in &report.failed {
        println!("  failed: {skill} ({error})");
    }
    println!();

    if report.is_success() {
        Ok(())
    } else {
        Err(eyre!(
            "{} of {} skill(s) failed",
            report.failed.len(),
            contexts.len()
        ))
    }
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

/// Where the wizard's config comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum InitChoice {
    Preset(String),
    Custom {
        name: String,
        url: String,
        description: String,
    },
}

fn cmd_init(project: &Project, preset: Option<String>) -> Result<()> {
    println!();
    println!("  skillseeker setup");
    println!();

    let choice = match preset {
        Some(name) => InitChoice::Preset(name),
        None => prompt_init_choice(project)?,
    };
    let path = prepare_init_config(project, &choice)?;
    let config = load_source_config(&path)?;

    let estimate = Confirm::new()
        .with_prompt("Run page estimation?")
        .default(true)
        .interact()?;
    if estimate {
        let mut ctx = project.context(&config.name);
        ctx.config_path = Some(path.clone());
        ctx.set_options(
            StepKind::Estimate,
            vec!["--max-discovery".to_string(), DEFAULT_MAX_DISCOVERY.to_string()],
        );
        run_steps(project, &ctx, &[StepKind::Estimate])?;
    }

    let proceed = Confirm::new()
        .with_prompt(format!("Scrape, enhance, and package '{}' now?", config.name))
        .default(true)
        .interact()?;
    if !proceed {
        println!("Setup stopped. To run later: skillseeker workflow full {}", config.name);
        return Ok(());
    }

    cmd_workflow(project, WorkflowKind::Full, &config.name, "local", false)?;
    println!("Your skill is ready. Upload it with: skillseeker upload skill <archive>");
    Ok(())
}

fn prompt_init_choice(project: &Project) -> Result<InitChoice> {
    let state = inventory(&project.root, &project.settings.paths)?;
    let presets: Vec<String> = state
        .configs
        .iter()
        .filter(|(_, entry)| !entry.is_router)
        .map(|(stem, _)| stem.clone())
        .collect();

    if !presets.is_empty() {
        let mode = Select::new()
            .with_prompt("Configuration")
            .items(&["Use an existing config", "Create a new config"])
            .default(0)
            .interact()?;
        if mode == 0 {
            let index = Select::new()
                .with_prompt("Config")
                .items(&presets)
                .default(0)
                .interact()?;
            return Ok(InitChoice::Preset(presets[index].clone()));
        }
    }

    let name: String = Input::new().with_prompt("Skill name").interact()?;
    let url: String = Input::new().with_prompt("Documentation URL").interact()?;
    let description: String = Input::new()
        .with_prompt("Description")
        .allow_empty(true)
        .interact()?;
    Ok(InitChoice::Custom {
        name,
        url,
        description,
    })
}

/// Resolve a preset, or write the new custom config. Returns its path.
fn prepare_init_config(project: &Project, choice: &InitChoice) -> Result<PathBuf> {
    match choice {
        InitChoice::Preset(name) => project.find_config(name),
        InitChoice::Custom {
            name,
            url,
            description,
        } => {
            cmd_config_create(project, name, url, description, 100, false)?;
            Ok(project.configs_dir().join(format!("{name}.json")))
        }
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl WorkflowProgress for CliProgress {
    fn step_started(&self, step: StepKind, index: usize, total: usize) {
        self.spinner
            .set_message(format!("[{index}/{total}] {}", step.label()));
    }

    fn step_finished(&self, step: StepKind, elapsed: Duration) {
        self.spinner
            .println(format!("  ✓ {} ({:.1}s)", step.label(), elapsed.as_secs_f64()));
    }

    fn step_failed(&self, step: StepKind, error: &SkillSeekerError) {
        self.spinner.println(format!("  ✗ {}: {error}", step.label()));
    }

    fn batch_item(&self, skill: &str, index: usize, total: usize) {
        self.spinner.println(format!("[{index}/{total}] {skill}"));
    }
}

// ---------------------------------------------------------------------------
// settings
// ---------------------------------------------------------------------------

fn cmd_settings_init() -> Result<()> {
    let path = init_config()?;
    println!("Settings initialized at: {}", path.display());
    Ok(())
}

fn cmd_settings_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_split() {
        let cli = Cli::parse_from([
            "skillseeker",
            "--root",
            "/tmp/project",
            "config",
            "split",
            "godot",
            "--strategy",
            "size",
            "--target-pages",
            "1000",
            "--dry-run",
        ]);
        assert_eq!(cli.root, Some(PathBuf::from("/tmp/project")));
        match cli.command {
            Command::Config {
                action:
                    ConfigAction::Split {
                        config,
                        strategy,
                        target_pages,
                        dry_run,
                        ..
                    },
            } => {
                assert_eq!(config, "godot");
                assert_eq!(strategy.as_deref(), Some("size"));
                assert_eq!(target_pages, Some(1000));
                assert!(dry_run);
            }
            _ => panic!("expected config split"),
        }
    }

    #[test]
    fn cli_rejects_conflicting_scrape_flags() {
        let result =
            Cli::try_parse_from(["skillseeker", "scrape", "run", "godot", "--resume", "--fresh"]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_parses_batch_and_estimate_commands() {
        let cli = Cli::parse_from(["skillseeker", "scrape", "estimate", "godot"]);
        match cli.command {
            Command::Scrape {
                action:
                    ScrapeAction::Estimate {
                        config,
                        max_discovery,
                    },
            } => {
                assert_eq!(config, "godot");
                assert_eq!(max_discovery, DEFAULT_MAX_DISCOVERY);
            }
            _ => panic!("expected scrape estimate"),
        }

        let cli = Cli::parse_from(["skillseeker", "package", "multi", "react-*", "--upload"]);
        assert!(matches!(
            cli.command,
            Command::Package {
                action: PackageAction::Multi { upload: true, .. }
            }
        ));

        let cli = Cli::parse_from(["skillseeker", "upload", "batch", "*.zip"]);
        assert!(matches!(
            cli.command,
            Command::Upload {
                action: UploadAction::Batch { .. }
            }
        ));
    }

    #[test]
    fn clean_defaults_to_all() {
        let cli = Cli::parse_from(["skillseeker", "clean", "--force"]);
        match cli.command {
            Command::Clean { target, force, .. } => {
                assert_eq!(target, "all");
                assert!(force);
            }
            _ => panic!("expected clean"),
        }
    }

    // -- Command bodies against a temporary project root -------------------

    fn temp_project() -> Project {
        let root = std::env::temp_dir().join(format!("ss-cli-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&root).unwrap();
        Project {
            root,
            settings: AppConfig::default(),
        }
    }

    fn run_args(project: &Project, args: &[&str]) -> Result<()> {
        let cli = Cli::try_parse_from(std::iter::once("skillseeker").chain(args.iter().copied()))?;
        dispatch(project, cli.command)
    }

    fn write_docs_config(project: &Project) {
        let config = skillseeker_shared::parse_source_config(
            r#"{"name": "docs", "description": "Example docs", "base_url": "https://docs.example.com/", "max_pages": 300, "categories": {"api": ["k1", "k2"], "guides": ["k1"]}}"#,
        )
        .unwrap();
        write_config_document(&project.configs_dir().join("docs.json"), &config).unwrap();
    }

    fn json_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn config_create_writes_loadable_skeleton() {
        let project = temp_project();
        run_args(
            &project,
            &["config", "create", "--name", "godot", "--url", "https://docs.godotengine.org", "--max-pages", "250"],
        )
        .unwrap();

        let path = project.configs_dir().join("godot.json");
        let config = load_source_config(&path).unwrap();
        assert_eq!(config.name, "godot");
        assert_eq!(config.base_url, "https://docs.godotengine.org/");
        assert_eq!(config.max_pages, 250);

        // No silent overwrite, and bad input never reaches the disk.
        assert!(run_args(&project, &["config", "create", "--name", "godot", "--url", "https://x.dev"]).is_err());
        assert!(run_args(&project, &["config", "create", "--name", "bad name", "--url", "https://x.dev"]).is_err());
        assert!(run_args(&project, &["config", "create", "--name", "zero", "--url", "https://x.dev", "--max-pages", "0"]).is_err());
        assert_eq!(json_files(&project.configs_dir()), vec!["godot.json"]);

        run_args(&project, &["config", "validate", "godot"]).unwrap();

        let _ = std::fs::remove_dir_all(&project.root);
    }

    #[test]
    fn config_split_dry_run_writes_nothing_and_real_run_writes_the_plan() {
        let project = temp_project();
        write_docs_config(&project);

        run_args(&project, &["config", "split", "docs", "--strategy", "category", "--dry-run"]).unwrap();
        assert_eq!(json_files(&project.configs_dir()), vec!["docs.json"]);

        let parent = load_source_config(&project.configs_dir().join("docs.json")).unwrap();
        let plan = split(&parent, Strategy::Category, 5000).unwrap();

        let out = project.root.join("split");
        run_args(
            &project,
            &["config", "split", "docs", "--strategy", "category", "--output-dir", out.to_str().unwrap()],
        )
        .unwrap();

        assert_eq!(json_files(&out), vec!["docs-api.json", "docs-guides.json", "docs.json"]);
        for doc in plan.documents().unwrap() {
            assert_eq!(std::fs::read_to_string(out.join(&doc.file_name)).unwrap(), doc.json);
        }

        let _ = std::fs::remove_dir_all(&project.root);
    }

    #[test]
    fn router_generate_writes_router_over_named_configs() {
        let project = temp_project();
        for name in ["react-hooks", "react-state"] {
            let config = new_source_config(name, "https://react.dev", "React", 100).unwrap();
            write_config_document(&project.configs_dir().join(format!("{name}.json")), &config)
                .unwrap();
        }

        run_args(&project, &["router", "generate", "react-hooks", "react-state"]).unwrap();

        let written = std::fs::read_to_string(project.configs_dir().join("react.json")).unwrap();
        let router: skillseeker_shared::RouterConfig = serde_json::from_str(&written).unwrap();
        assert!(router.is_router);
        let routes: Vec<&str> = router.routes.keys().collect();
        assert_eq!(routes, vec!["react-hooks", "react-state"]);

        assert!(run_args(&project, &["router", "generate", "missing"]).is_err());

        let _ = std::fs::remove_dir_all(&project.root);
    }

    #[test]
    fn status_and_forced_clean_run_on_a_project() {
        let project = temp_project();
        let output = project.root.join("output");
        std::fs::create_dir_all(output.join("docs_data")).unwrap();
        std::fs::create_dir_all(output.join("docs")).unwrap();
        std::fs::write(output.join("docs/SKILL.md"), "# docs").unwrap();
        std::fs::write(output.join("docs/SKILL.md.backup"), "# old").unwrap();

        run_args(&project, &["status", "--detailed"]).unwrap();
        run_args(&project, &["clean", "backups", "--force"]).unwrap();

        assert!(!output.join("docs/SKILL.md.backup").exists());
        assert!(output.join("docs_data").exists());
        assert!(run_args(&project, &["clean", "everything", "--force"]).is_err());

        let _ = std::fs::remove_dir_all(&project.root);
    }

    #[test]
    fn init_prepares_preset_or_custom_config() {
        let project = temp_project();
        write_docs_config(&project);

        let path = prepare_init_config(&project, &InitChoice::Preset("docs".into())).unwrap();
        assert_eq!(path, project.configs_dir().join("docs.json"));
        assert!(prepare_init_config(&project, &InitChoice::Preset("nope".into())).is_err());

        let custom = InitChoice::Custom {
            name: "vue".into(),
            url: "https://vuejs.org/guide".into(),
            description: "Vue guide".into(),
        };
        let path = prepare_init_config(&project, &custom).unwrap();
        assert_eq!(load_source_config(&path).unwrap().base_url, "https://vuejs.org/guide/");

        let _ = std::fs::remove_dir_all(&project.root);
    }

    #[test]
    fn skill_context_prefers_built_skill_dirs() {
        let project = temp_project();
        let elsewhere = project.root.join("react");
        std::fs::create_dir_all(&elsewhere).unwrap();
        std::fs::write(elsewhere.join("SKILL.md"), "# react").unwrap();

        let ctx = skill_context(&project, "react");
        assert_eq!(ctx.skill_dir(), elsewhere);

        let ctx = skill_context(&project, "vue");
        assert_eq!(ctx.skill_dir(), project.root.join("output/vue"));

        let _ = std::fs::remove_dir_all(&project.root);
    }

    /// Collaborators that only leave files behind, so command bodies can run end to end.
    #[cfg(unix)]
    fn scripted_project() -> Project {
        let mut project = temp_project();
        let sh = |script: &str, args: &[&str]| -> Vec<String> {
            ["sh", "-c", script]
                .iter()
                .chain(args)
                .map(|s| s.to_string())
                .collect()
        };
        let commands = &mut project.settings.collaborators;
        commands.estimate = sh(r#"printf '%s ' "$@" > "$0""#, &["{root}/estimate.args", "{config}"]);
        commands.package = sh(r#"touch "$0""#, &["{archive}"]);
        commands.upload = sh(r#"touch "$0.uploaded""#, &["{archive}"]);
        // Any variable that is always set stands in for the API key.
        project.settings.upload.api_key_env = "PATH".into();
        project
    }

    #[cfg(unix)]
    #[test]
    fn scrape_estimate_passes_discovery_limit() {
        let project = scripted_project();
        write_docs_config(&project);

        run_args(&project, &["scrape", "estimate", "docs", "--max-discovery", "50"]).unwrap();

        let args = std::fs::read_to_string(project.root.join("estimate.args")).unwrap();
        assert!(args.contains("docs.json"), "{args}");
        assert!(args.contains("--max-discovery 50"), "{args}");

        let _ = std::fs::remove_dir_all(&project.root);
    }

    #[cfg(unix)]
    #[test]
    fn package_and_upload_batches_follow_patterns() {
        let project = scripted_project();
        let output = project.root.join("output");
        for name in ["react-hooks", "react-state", "vue"] {
            std::fs::create_dir_all(output.join(name)).unwrap();
            std::fs::write(output.join(name).join("SKILL.md"), "# skill").unwrap();
        }

        run_args(&project, &["package", "multi", "react-*"]).unwrap();
        assert!(output.join("react-hooks.zip").exists());
        assert!(output.join("react-state.zip").exists());
        assert!(!output.join("vue.zip").exists());

        run_args(&project, &["package", "all"]).unwrap();
        assert!(output.join("vue.zip").exists());

        run_args(&project, &["upload", "batch", "react-*.zip"]).unwrap();
        assert!(output.join("react-hooks.zip.uploaded").exists());
        assert!(!output.join("vue.zip.uploaded").exists());

        assert!(run_args(&project, &["package", "multi", "svelte*"]).is_err());
        assert!(run_args(&project, &["upload", "skill", "output/vue"]).is_err());

        let _ = std::fs::remove_dir_all(&project.root);
    }

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn truncate_marks_cut() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
    }
}
