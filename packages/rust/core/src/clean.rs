//! Removal of crawl caches, checkpoints, and enhancer backups under `output/`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{info, instrument, warn};

use skillseeker_shared::{Result, SkillSeekerError};

use crate::inventory::DATA_DIR_SUFFIX;

const CHECKPOINT_FILE: &str = "checkpoint.json";
const BACKUP_EXTENSION: &str = "backup";

/// What to clean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanTarget {
    All,
    Cache,
    Checkpoints,
    Backups,
}

impl CleanTarget {
    fn includes(self, kind: CleanKind) -> bool {
        match self {
            Self::All => true,
            Self::Cache => kind == CleanKind::Cache,
            Self::Checkpoints => kind == CleanKind::Checkpoint,
            Self::Backups => kind == CleanKind::Backup,
        }
    }
}

impl FromStr for CleanTarget {
    type Err = SkillSeekerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(Self::All),
            "cache" => Ok(Self::Cache),
            "checkpoints" => Ok(Self::Checkpoints),
            "backups" => Ok(Self::Backups),
            other => Err(SkillSeekerError::config(format!(
                "unknown clean target '{other}': expected all, cache, checkpoints, or backups"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanKind {
    /// An `<name>_data` crawl cache directory.
    Cache,
    /// A resumable-crawl `checkpoint.json`.
    Checkpoint,
    /// A `*.backup` left by the enhancer.
    Backup,
}

impl fmt::Display for CleanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cache => "cache",
            Self::Checkpoint => "checkpoint",
            Self::Backup => "backup",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanItem {
    pub path: PathBuf,
    pub kind: CleanKind,
}

#[derive(Debug, Default)]
pub struct CleanReport {
    pub deleted: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

/// List what [`clean`] would delete, without touching anything.
///
/// `skill` restricts the plan to `output/<skill>/` and `output/<skill>_data/`.
/// Items inside an already-planned cache directory are not listed twice.
pub fn plan_clean(
    root: &Path,
    output_dir: &Path,
    target: CleanTarget,
    skill: Option<&str>,
) -> Result<Vec<CleanItem>> {
    let output = root.join(output_dir);
    let entries = match std::fs::read_dir(&output) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(SkillSeekerError::io(&output, e)),
    };

    let mut dirs = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| SkillSeekerError::io(&output, e))?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();

    let mut items = Vec::new();
    for dir in dirs {
        let Some(dir_name) = dir.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let is_cache = dir_name.ends_with(DATA_DIR_SUFFIX);

        if let Some(skill) = skill {
            let owner = dir_name.strip_suffix(DATA_DIR_SUFFIX).unwrap_or(dir_name);
            if owner != skill {
                continue;
            }
        }

        if is_cache && target.includes(CleanKind::Cache) {
            items.push(CleanItem {
                path: dir,
                kind: CleanKind::Cache,
            });
            continue;
        }

        if target.includes(CleanKind::Checkpoint) {
            let checkpoint = dir.join(CHECKPOINT_FILE);
            if checkpoint.is_file() {
                items.push(CleanItem {
                    path: checkpoint,
                    kind: CleanKind::Checkpoint,
                });
            }
        }

        if target.includes(CleanKind::Backup) {
            let mut backups = Vec::new();
            let files = std::fs::read_dir(&dir).map_err(|e| SkillSeekerError::io(&dir, e))?;
            for entry in files {
                let path = entry.map_err(|e| SkillSeekerError::io(&dir, e))?.path();
                if path.is_file() && path.extension().is_some_and(|ext| ext == BACKUP_EXTENSION) {
                    backups.push(path);
                }
            }
            backups.sort();
            items.extend(backups.into_iter().map(|path| CleanItem {
                path,
                kind: CleanKind::Backup,
            }));
        }
    }

    Ok(items)
}

/// Delete the planned items, continuing past individual failures.
#[instrument(skip_all, fields(count = items.len()))]
pub fn clean(items: &[CleanItem]) -> CleanReport {
    let mut report = CleanReport::default();

    for item in items {
        let result = if item.path.is_dir() {
            std::fs::remove_dir_all(&item.path)
        } else {
            std::fs::remove_file(&item.path)
        };

        match result {
            Ok(()) => report.deleted.push(item.path.clone()),
            Err(e) => {
                warn!(path = %item.path.display(), error = %e, "failed to delete");
                report.failed.push((item.path.clone(), e.to_string()));
            }
        }
    }

    info!(
        deleted = report.deleted.len(),
        failed = report.failed.len(),
        "clean finished"
    );
    report
}
