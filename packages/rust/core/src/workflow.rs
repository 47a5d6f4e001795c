//! Scrape → build → enhance → package → upload workflows, single or batched.
//!
//! Every step is delegated to a [`Collaborator`]. The stock implementation,
//! [`ExternalCommand`], runs the argv templates from `[collaborators]` in the
//! settings file; tests substitute an in-process fake.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::str::FromStr;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};

use skillseeker_shared::{
    CollaboratorsConfig, PathsConfig, Result, SKILL_MANIFEST, SkillSeekerError,
};

use crate::inventory::DATA_DIR_SUFFIX;

// ---------------------------------------------------------------------------
// Steps and workflows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    Scrape,
    /// Count discoverable pages without scraping.
    Estimate,
    /// Show what a scrape would fetch without downloading.
    ScrapePreview,
    Build,
    EnhanceLocal,
    EnhanceApi,
    Package,
    Upload,
}

impl StepKind {
    /// Key under `[collaborators]`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scrape => "scrape",
            Self::Estimate => "estimate",
            Self::ScrapePreview => "scrape_preview",
            Self::Build => "build",
            Self::EnhanceLocal => "enhance_local",
            Self::EnhanceApi => "enhance_api",
            Self::Package => "package",
            Self::Upload => "upload",
        }
    }

    /// Human-readable label for progress output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Scrape => "Scraping documentation",
            Self::Estimate => "Estimating page count",
            Self::ScrapePreview => "Previewing scrape",
            Self::Build => "Building skill from cache",
            Self::EnhanceLocal => "Enhancing SKILL.md (local)",
            Self::EnhanceApi => "Enhancing SKILL.md (API)",
            Self::Package => "Packaging skill",
            Self::Upload => "Uploading skill",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnhanceMode {
    Local,
    Api,
    None,
}

impl EnhanceMode {
    fn step(self) -> Option<StepKind> {
        match self {
            Self::Local => Some(StepKind::EnhanceLocal),
            Self::Api => Some(StepKind::EnhanceApi),
            Self::None => None,
        }
    }
}

impl FromStr for EnhanceMode {
    type Err = SkillSeekerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "local" => Ok(Self::Local),
            "api" => Ok(Self::Api),
            "none" => Ok(Self::None),
            other => Err(SkillSeekerError::config(format!(
                "unknown enhance mode '{other}': expected local, api, or none"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowKind {
    /// Scrape then package.
    Quick,
    /// Scrape, enhance, package.
    Full,
    /// Rebuild from cached data, enhance, package.
    Rebuild,
}

/// The ordered steps of a workflow.
///
/// `quick` never enhances; `enhance` only applies to `full` and `rebuild`.
pub fn plan_steps(kind: WorkflowKind, enhance: EnhanceMode, upload: bool) -> Vec<StepKind> {
    let mut steps = match kind {
        WorkflowKind::Quick | WorkflowKind::Full => vec![StepKind::Scrape],
        WorkflowKind::Rebuild => vec![StepKind::Build],
    };
    if kind != WorkflowKind::Quick {
        steps.extend(enhance.step());
    }
    steps.push(StepKind::Package);
    if upload {
        steps.push(StepKind::Upload);
    }
    steps
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Everything a collaborator needs to run one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRequest {
    pub step: StepKind,
    pub skill: String,
    pub config_path: Option<PathBuf>,
    pub skill_dir: PathBuf,
    pub archive: PathBuf,
    pub root: PathBuf,
    /// Extra arguments appended after the expanded template.
    pub options: Vec<String>,
}

impl StepRequest {
    /// Substitute `{config}`, `{skill}`, `{skill_dir}`, `{archive}`, and
    /// `{root}` in `template`, then append [`Self::options`].
    pub fn expand(&self, template: &[String]) -> Result<Vec<String>> {
        let mut argv = Vec::with_capacity(template.len() + self.options.len());
        for part in template {
            let mut arg = part.clone();
            if arg.contains("{config}") {
                let Some(config) = &self.config_path else {
                    return Err(SkillSeekerError::validation(format!(
                        "{} needs a config file for '{}'",
                        self.step, self.skill
                    )));
                };
                arg = arg.replace("{config}", &config.to_string_lossy());
            }
            arg = arg
                .replace("{skill_dir}", &self.skill_dir.to_string_lossy())
                .replace("{skill}", &self.skill)
                .replace("{archive}", &self.archive.to_string_lossy())
                .replace("{root}", &self.root.to_string_lossy());
            argv.push(arg);
        }
        argv.extend(self.options.iter().cloned());
        Ok(argv)
    }
}

/// Where one skill's files live under a project root.
#[derive(Debug, Clone)]
pub struct WorkflowContext {
    pub root: PathBuf,
    pub paths: PathsConfig,
    pub skill: String,
    pub config_path: Option<PathBuf>,
    /// Extra arguments for individual steps.
    pub step_options: HashMap<StepKind, Vec<String>>,
    /// Skill directory outside the default `output/<skill>/`.
    pub skill_dir_override: Option<PathBuf>,
    /// Archive outside the default `output/<skill>.zip`.
    pub archive_override: Option<PathBuf>,
}

impl WorkflowContext {
    pub fn new(root: impl Into<PathBuf>, paths: PathsConfig, skill: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            paths,
            skill: skill.into(),
            config_path: None,
            step_options: HashMap::new(),
            skill_dir_override: None,
            archive_override: None,
        }
    }

    /// Arguments appended to `step`'s command line.
    pub fn set_options(&mut self, step: StepKind, options: Vec<String>) {
        self.step_options.insert(step, options);
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.paths.output_dir)
    }

    pub fn skill_dir(&self) -> PathBuf {
        match &self.skill_dir_override {
            Some(dir) => dir.clone(),
            None => self.output_dir().join(&self.skill),
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.output_dir()
            .join(format!("{}{DATA_DIR_SUFFIX}", self.skill))
    }

    pub fn archive(&self) -> PathBuf {
        match &self.archive_override {
            Some(path) => path.clone(),
            None => self.output_dir().join(format!("{}.zip", self.skill)),
        }
    }

    pub fn request(&self, step: StepKind) -> StepRequest {
        StepRequest {
            step,
            skill: self.skill.clone(),
            config_path: self.config_path.clone(),
            skill_dir: self.skill_dir(),
            archive: self.archive(),
            root: self.root.clone(),
            options: self.step_options.get(&step).cloned().unwrap_or_default(),
        }
    }

    /// Fail early, with a hint, when a step's input is missing.
    pub fn check_ready(&self, step: StepKind) -> Result<()> {
        match step {
            StepKind::Scrape | StepKind::Estimate | StepKind::ScrapePreview => {
                self.require_config(step)
            }
            StepKind::Build => {
                self.require_config(step)?;
                let data = self.data_dir();
                if !data.is_dir() {
                    return Err(SkillSeekerError::validation(format!(
                        "no cached data at {}; run `skillseeker scrape run` first",
                        data.display()
                    )));
                }
                Ok(())
            }
            StepKind::EnhanceLocal | StepKind::EnhanceApi | StepKind::Package => {
                let manifest = self.skill_dir().join(SKILL_MANIFEST);
                if !manifest.is_file() {
                    return Err(SkillSeekerError::validation(format!(
                        "{} is not a built skill (missing {SKILL_MANIFEST})",
                        self.skill_dir().display()
                    )));
                }
                Ok(())
            }
            StepKind::Upload => {
                let archive = self.archive();
                if !archive.is_file() {
                    return Err(SkillSeekerError::validation(format!(
                        "archive not found: {}",
                        archive.display()
                    )));
                }
                Ok(())
            }
        }
    }

    fn require_config(&self, step: StepKind) -> Result<()> {
        match &self.config_path {
            Some(path) if path.is_file() => Ok(()),
            Some(path) => Err(SkillSeekerError::validation(format!(
                "config not found: {}",
                path.display()
            ))),
            None => Err(SkillSeekerError::validation(format!(
                "{step} needs a config file for '{}'",
                self.skill
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// Performs one workflow step on behalf of the runner.
pub trait Collaborator {
    fn invoke(&self, request: &StepRequest) -> Result<()>;
}

/// Runs the argv template configured for each step as a child process.
#[derive(Debug, Clone, Default)]
pub struct ExternalCommand {
    pub commands: CollaboratorsConfig,
}

impl ExternalCommand {
    pub fn new(commands: CollaboratorsConfig) -> Self {
        Self { commands }
    }

    fn template(&self, step: StepKind) -> &[String] {
        match step {
            StepKind::Scrape => &self.commands.scrape,
            StepKind::Estimate => &self.commands.estimate,
            StepKind::ScrapePreview => &self.commands.scrape_preview,
            StepKind::Build => &self.commands.build,
            StepKind::EnhanceLocal => &self.commands.enhance_local,
            StepKind::EnhanceApi => &self.commands.enhance_api,
            StepKind::Package => &self.commands.package,
            StepKind::Upload => &self.commands.upload,
        }
    }
}

impl Collaborator for ExternalCommand {
    fn invoke(&self, request: &StepRequest) -> Result<()> {
        let argv = request.expand(self.template(request.step))?;
        let Some((program, args)) = argv.split_first() else {
            return Err(SkillSeekerError::config(format!(
                "no command configured for [collaborators].{}",
                request.step
            )));
        };

        info!(step = %request.step, %program, "running collaborator");

        let status = Command::new(program)
            .args(args)
            .current_dir(&request.root)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| {
                SkillSeekerError::collaborator(
                    request.step.as_str(),
                    format!("failed to spawn `{program}`: {e}"),
                )
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(SkillSeekerError::collaborator(
                request.step.as_str(),
                format!("`{}` exited with {status}", argv.join(" ")),
            ))
        }
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Progress callback for workflow steps.
pub trait WorkflowProgress {
    fn step_started(&self, step: StepKind, index: usize, total: usize);
    fn step_finished(&self, step: StepKind, elapsed: Duration);
    fn step_failed(&self, step: StepKind, error: &SkillSeekerError);

    /// Called before each skill of a batch.
    fn batch_item(&self, _skill: &str, _index: usize, _total: usize) {}
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl WorkflowProgress for SilentProgress {
    fn step_started(&self, _step: StepKind, _index: usize, _total: usize) {}
    fn step_finished(&self, _step: StepKind, _elapsed: Duration) {}
    fn step_failed(&self, _step: StepKind, _error: &SkillSeekerError) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub step: StepKind,
    pub elapsed: Duration,
}

#[derive(Debug)]
pub struct WorkflowResult {
    pub completed: Vec<StepOutcome>,
    pub elapsed: Duration,
}

/// Run `steps` in order, stopping at the first failure.
#[instrument(skip_all, fields(skill = %ctx.skill, steps = steps.len()))]
pub fn run_workflow(
    ctx: &WorkflowContext,
    steps: &[StepKind],
    collaborator: &dyn Collaborator,
    progress: &dyn WorkflowProgress,
) -> Result<WorkflowResult> {
    if steps.is_empty() {
        return Err(SkillSeekerError::empty_input("workflow has no steps"));
    }

    let start = Instant::now();
    let mut completed = Vec::with_capacity(steps.len());

    for (index, &step) in steps.iter().enumerate() {
        progress.step_started(step, index + 1, steps.len());
        let step_start = Instant::now();

        let outcome = ctx
            .check_ready(step)
            .and_then(|()| collaborator.invoke(&ctx.request(step)));

        if let Err(e) = outcome {
            warn!(%step, error = %e, "workflow step failed");
            progress.step_failed(step, &e);
            return Err(e);
        }

        let elapsed = step_start.elapsed();
        debug!(%step, ?elapsed, "workflow step finished");
        progress.step_finished(step, elapsed);
        completed.push(StepOutcome { step, elapsed });
    }

    let elapsed = start.elapsed();
    info!(skill = %ctx.skill, steps = completed.len(), ?elapsed, "workflow complete");
    Ok(WorkflowResult { completed, elapsed })
}

/// Per-skill outcome of [`run_batch`].
#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<(String, SkillSeekerError)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Run the same `steps` for every context, continuing past failed skills.
#[instrument(skip_all, fields(skills = contexts.len(), steps = steps.len()))]
pub fn run_batch(
    contexts: &[WorkflowContext],
    steps: &[StepKind],
    collaborator: &dyn Collaborator,
    progress: &dyn WorkflowProgress,
) -> Result<BatchReport> {
    if contexts.is_empty() {
        return Err(SkillSeekerError::empty_input("batch matched no skills"));
    }
    if steps.is_empty() {
        return Err(SkillSeekerError::empty_input("workflow has no steps"));
    }

    let mut report = BatchReport::default();
    for (index, ctx) in contexts.iter().enumerate() {
        progress.batch_item(&ctx.skill, index + 1, contexts.len());
        match run_workflow(ctx, steps, collaborator, progress) {
            Ok(_) => report.succeeded.push(ctx.skill.clone()),
            Err(e) => report.failed.push((ctx.skill.clone(), e)),
        }
    }

    info!(
        succeeded = report.succeeded.len(),
        failed = report.failed.len(),
        "batch finished"
    );
    Ok(report)
}

/// `<root>/<output_dir>/<name>` when `name` is a bare skill name, else `name` as a path.
pub fn resolve_skill_dir(root: &Path, paths: &PathsConfig, name: &str) -> PathBuf {
    let candidate = Path::new(name);
    if candidate.components().count() > 1 || candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        root.join(&paths.output_dir).join(name)
    }
}
