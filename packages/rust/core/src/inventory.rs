//! Status and inventory reporting.
//!
//! A read-only projection over `configs/` and `output/`: which configs exist,
//! which have cached crawl data, which have been built into skills, and which
//! have been packaged. Nothing here creates, deletes, or locks anything.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use skillseeker_shared::{PathsConfig, Result, SKILL_MANIFEST, SkillSeekerError};

/// Display cap applied by [`suggest`]. Not a correctness constraint.
pub const MAX_SUGGESTIONS: usize = 5;

/// Suffix of a cached crawl directory under `output/`.
pub const DATA_DIR_SUFFIX: &str = "_data";

/// Marker left next to `SKILL.md` by the enhancer.
const SKILL_BACKUP: &str = "SKILL.md.backup";

// ---------------------------------------------------------------------------
// Inventory types
// ---------------------------------------------------------------------------

/// One `configs/<name>.json` document, read best-effort for display.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigEntry {
    pub path: PathBuf,
    /// The `name` field, or the file stem when unreadable.
    pub name: String,
    pub description: Option<String>,
    pub max_pages: Option<u64>,
    pub is_router: bool,
}

/// An `output/<name>_data/` directory left by the crawler.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedData {
    pub path: PathBuf,
    /// `total_pages` from `summary.json`, when present.
    pub total_pages: Option<u64>,
    pub size_bytes: u64,
}

/// An `output/<name>/` directory containing `SKILL.md`.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltSkill {
    pub path: PathBuf,
    pub reference_count: usize,
    pub enhanced: bool,
}

/// An `output/<name>.zip` archive.
#[derive(Debug, Clone, PartialEq)]
pub struct PackagedSkill {
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Point-in-time view of a project root. Keys are names, sorted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventoryState {
    /// Config file stem -> entry.
    pub configs: BTreeMap<String, ConfigEntry>,
    pub cached: BTreeMap<String, CachedData>,
    pub built: BTreeMap<String, BuiltSkill>,
    pub packaged: BTreeMap<String, PackagedSkill>,
}

impl InventoryState {
    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
            && self.cached.is_empty()
            && self.built.is_empty()
            && self.packaged.is_empty()
    }
}

/// Subset of the crawler's `summary.json` we display.
#[derive(Debug, Deserialize)]
struct CrawlSummary {
    #[serde(default)]
    total_pages: Option<u64>,
}

// ---------------------------------------------------------------------------
// Suggestions
// ---------------------------------------------------------------------------

/// A next step the user probably wants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Suggestion {
    /// Cached data exists but no skill was built from it.
    Build { name: String },
    /// A skill was built but never packaged.
    Package { name: String },
}

impl Suggestion {
    pub fn name(&self) -> &str {
        match self {
            Self::Build { name } | Self::Package { name } => name,
        }
    }

    /// CLI invocation that carries out the suggestion.
    pub fn command(&self) -> String {
        match self {
            Self::Build { name } => format!("skillseeker build {name}"),
            Self::Package { name } => format!("skillseeker package single {name}"),
        }
    }
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Build { name } => write!(f, "build {name}"),
            Self::Package { name } => write!(f, "package {name}"),
        }
    }
}

/// Every suggestion: builds first, then packages, each alphabetical.
pub fn suggest_all(state: &InventoryState) -> Vec<Suggestion> {
    let builds = state
        .cached
        .keys()
        .filter(|name| !state.built.contains_key(*name))
        .map(|name| Suggestion::Build { name: name.clone() });

    let packages = state
        .built
        .keys()
        .filter(|name| !state.packaged.contains_key(*name))
        .map(|name| Suggestion::Package { name: name.clone() });

    builds.chain(packages).collect()
}

/// [`suggest_all`] capped at [`MAX_SUGGESTIONS`].
pub fn suggest(state: &InventoryState) -> Vec<Suggestion> {
    let mut all = suggest_all(state);
    all.truncate(MAX_SUGGESTIONS);
    all
}

// ---------------------------------------------------------------------------
// Batch selection
// ---------------------------------------------------------------------------

/// Built skills whose name matches the glob `pattern`, or all of them.
pub fn select_built(state: &InventoryState, pattern: Option<&str>) -> Result<Vec<String>> {
    select(state.built.keys(), pattern, None)
}

/// Packaged skills whose name or `<name>.zip` matches the glob `pattern`.
pub fn select_packaged(state: &InventoryState, pattern: Option<&str>) -> Result<Vec<String>> {
    select(state.packaged.keys(), pattern, Some("zip"))
}

fn select<'a>(
    names: impl Iterator<Item = &'a String>,
    pattern: Option<&str>,
    extension: Option<&str>,
) -> Result<Vec<String>> {
    let Some(pattern) = pattern else {
        return Ok(names.cloned().collect());
    };
    let glob = glob::Pattern::new(pattern)
        .map_err(|e| SkillSeekerError::config(format!("invalid pattern '{pattern}': {e}")))?;

    Ok(names
        .filter(|name| {
            glob.matches(name)
                || extension.is_some_and(|ext| glob.matches(&format!("{name}.{ext}")))
        })
        .cloned()
        .collect())
}

// ---------------------------------------------------------------------------
// Scanning
// ---------------------------------------------------------------------------

/// Scan `root` using the configured directory layout.
///
/// Missing directories yield empty sets; other I/O failures are reported.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn inventory(root: &Path, paths: &PathsConfig) -> Result<InventoryState> {
    let configs_dir = root.join(&paths.configs_dir);
    let output_dir = root.join(&paths.output_dir);

    let mut state = InventoryState::default();

    for path in list_dir(&configs_dir)? {
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            let Some(stem) = file_stem(&path) else {
                continue;
            };
            state.configs.insert(stem.clone(), read_config_entry(&path, stem));
        }
    }

    for path in list_dir(&output_dir)? {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };

        if path.is_dir() {
            if let Some(name) = file_name.strip_suffix(DATA_DIR_SUFFIX) {
                if !name.is_empty() {
                    state.cached.insert(name.to_string(), read_cached(&path)?);
                }
            } else if path.join(SKILL_MANIFEST).is_file() {
                state.built.insert(file_name, read_built(&path)?);
            }
        } else if path.extension().is_some_and(|ext| ext == "zip") {
            if let Some(stem) = file_stem(&path) {
                let size_bytes = std::fs::metadata(&path)
                    .map_err(|e| SkillSeekerError::io(&path, e))?
                    .len();
                state.packaged.insert(stem, PackagedSkill { path, size_bytes });
            }
        }
    }

    debug!(
        configs = state.configs.len(),
        cached = state.cached.len(),
        built = state.built.len(),
        packaged = state.packaged.len(),
        "inventory scanned"
    );

    Ok(state)
}

/// Entries of `dir`, sorted by path. A missing directory is empty.
fn list_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(SkillSeekerError::io(dir, e)),
    };

    let mut paths = Vec::new();
    for entry in entries {
        paths.push(entry.map_err(|e| SkillSeekerError::io(dir, e))?.path());
    }
    paths.sort();
    Ok(paths)
}

fn file_stem(path: &Path) -> Option<String> {
    path.file_stem().and_then(|s| s.to_str()).map(str::to_string)
}

/// Unparseable configs are still listed, under their file stem.
fn read_config_entry(path: &Path, stem: String) -> ConfigEntry {
    let value: Option<Value> = std::fs::read_to_string(path)
        .ok()
        .and_then(|text| serde_json::from_str(&text).ok());

    let field = |key: &str| value.as_ref().and_then(|v| v.get(key));
    let is_router = ["is_router", "_router"]
        .iter()
        .any(|key| field(key).and_then(Value::as_bool).unwrap_or(false));

    ConfigEntry {
        path: path.to_path_buf(),
        name: field("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or(stem),
        description: field("description")
            .and_then(Value::as_str)
            .map(str::to_string),
        max_pages: field("max_pages").and_then(Value::as_u64),
        is_router,
    }
}

fn read_cached(dir: &Path) -> Result<CachedData> {
    let total_pages = std::fs::read_to_string(dir.join("summary.json"))
        .ok()
        .and_then(|text| serde_json::from_str::<CrawlSummary>(&text).ok())
        .and_then(|summary| summary.total_pages);

    Ok(CachedData {
        path: dir.to_path_buf(),
        total_pages,
        size_bytes: dir_size(dir)?,
    })
}

fn read_built(dir: &Path) -> Result<BuiltSkill> {
    let reference_count = list_dir(&dir.join("references"))?
        .iter()
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "md"))
        .count();

    Ok(BuiltSkill {
        path: dir.to_path_buf(),
        reference_count,
        enhanced: dir.join(SKILL_BACKUP).is_file(),
    })
}

/// Total size of regular files below `dir`.
pub fn dir_size(dir: &Path) -> Result<u64> {
    let mut total = 0;
    for path in list_dir(dir)? {
        let meta = std::fs::symlink_metadata(&path).map_err(|e| SkillSeekerError::io(&path, e))?;
        if meta.is_dir() {
            total += dir_size(&path)?;
        } else if meta.is_file() {
            total += meta.len();
        }
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ss-inventory-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn cached(root: &Path, name: &str, pages: u64) {
        let dir = root.join("output").join(format!("{name}_data"));
        std::fs::create_dir_all(dir.join("pages")).unwrap();
        std::fs::write(
            dir.join("summary.json"),
            format!(r#"{{"name": "{name}", "total_pages": {pages}}}"#),
        )
        .unwrap();
        std::fs::write(dir.join("pages/page_0.json"), "{}").unwrap();
    }

    fn built(root: &Path, name: &str, references: usize) {
        let dir = root.join("output").join(name);
        std::fs::create_dir_all(dir.join("references")).unwrap();
        std::fs::write(dir.join(SKILL_MANIFEST), "# Skill").unwrap();
        for i in 0..references {
            std::fs::write(dir.join(format!("references/ref{i}.md")), "ref").unwrap();
        }
    }

    fn packaged(root: &Path, name: &str) {
        std::fs::write(root.join("output").join(format!("{name}.zip")), b"PK").unwrap();
    }

    #[test]
    fn missing_directories_are_empty() {
        let root = temp_root();
        let state = inventory(&root, &PathsConfig::default()).unwrap();
        assert!(state.is_empty());
        assert!(suggest(&state).is_empty());
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn example_suggestions() {
        let root = temp_root();
        cached(&root, "a", 10);
        cached(&root, "b", 20);
        built(&root, "a", 2);

        let state = inventory(&root, &PathsConfig::default()).unwrap();
        let suggestions: Vec<String> = suggest(&state).iter().map(ToString::to_string).collect();
        assert_eq!(suggestions, vec!["build b", "package a"]);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn scans_details() {
        let root = temp_root();
        cached(&root, "godot", 42);
        built(&root, "godot", 3);
        std::fs::write(root.join("output/godot").join(SKILL_BACKUP), "old").unwrap();
        packaged(&root, "godot");
        // A directory without SKILL.md is not a built skill.
        std::fs::create_dir_all(root.join("output/scratch")).unwrap();

        std::fs::create_dir_all(root.join("configs")).unwrap();
        std::fs::write(
            root.join("configs/godot.json"),
            r#"{"name": "godot", "description": "Godot engine", "base_url": "https://docs.godotengine.org/", "max_pages": 300}"#,
        )
        .unwrap();
        std::fs::write(root.join("configs/broken.json"), "{ not json").unwrap();
        std::fs::write(root.join("configs/notes.txt"), "ignored").unwrap();

        let state = inventory(&root, &PathsConfig::default()).unwrap();

        let names: Vec<&str> = state.configs.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["broken", "godot"]);
        assert_eq!(state.configs["godot"].max_pages, Some(300));
        assert_eq!(state.configs["broken"].name, "broken");
        assert_eq!(state.configs["broken"].description, None);

        assert_eq!(state.cached["godot"].total_pages, Some(42));
        assert!(state.cached["godot"].size_bytes > 0);

        assert_eq!(state.built.len(), 1);
        assert_eq!(state.built["godot"].reference_count, 3);
        assert!(state.built["godot"].enhanced);

        assert_eq!(state.packaged["godot"].size_bytes, 2);
        assert!(suggest(&state).is_empty());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn batch_selection_by_glob() {
        let root = temp_root();
        for name in ["react-hooks", "react-state", "vue"] {
            built(&root, name, 0);
        }
        packaged(&root, "react-hooks");
        packaged(&root, "vue");

        let state = inventory(&root, &PathsConfig::default()).unwrap();
        assert_eq!(
            select_built(&state, Some("react-*")).unwrap(),
            vec!["react-hooks", "react-state"]
        );
        assert_eq!(select_built(&state, None).unwrap().len(), 3);
        assert!(select_built(&state, Some("svelte*")).unwrap().is_empty());

        assert_eq!(select_packaged(&state, Some("*.zip")).unwrap().len(), 2);
        assert_eq!(select_packaged(&state, Some("vu?")).unwrap(), vec!["vue"]);

        assert!(select_built(&state, Some("[")).is_err());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn router_configs_are_flagged() {
        let root = temp_root();
        std::fs::create_dir_all(root.join("configs")).unwrap();
        std::fs::write(
            root.join("configs/docs.json"),
            r#"{"name": "docs", "base_url": "https://x.dev/", "is_router": true, "routes": {}}"#,
        )
        .unwrap();

        let state = inventory(&root, &PathsConfig::default()).unwrap();
        assert!(state.configs["docs"].is_router);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn custom_layout_is_respected() {
        let root = temp_root();
        std::fs::create_dir_all(root.join("build/site")).unwrap();
        std::fs::write(root.join("build/site").join(SKILL_MANIFEST), "# Skill").unwrap();

        let paths = PathsConfig {
            configs_dir: PathBuf::from("cfg"),
            output_dir: PathBuf::from("build"),
        };
        let state = inventory(&root, &paths).unwrap();
        assert!(state.built.contains_key("site"));

        let _ = std::fs::remove_dir_all(&root);
    }

    /// The cap of five is a display policy: `suggest_all` keeps everything,
    /// `suggest` only trims the tail.
    #[test]
    fn suggestion_cap_is_display_only() {
        let root = temp_root();
        for name in ["c1", "c2", "c3", "c4"] {
            cached(&root, name, 1);
        }
        for name in ["p1", "p2", "p3"] {
            built(&root, name, 0);
        }

        let state = inventory(&root, &PathsConfig::default()).unwrap();
        let all = suggest_all(&state);
        let shown = suggest(&state);

        assert_eq!(all.len(), 7);
        assert_eq!(shown.len(), MAX_SUGGESTIONS);
        assert_eq!(shown[..], all[..MAX_SUGGESTIONS]);
        // Builds come before packages regardless of name.
        assert!(matches!(shown[3], Suggestion::Build { .. }));
        assert_eq!(shown[4], Suggestion::Package { name: "p1".into() });

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn inventory_does_not_modify_root() {
        let root = temp_root();
        cached(&root, "a", 1);
        built(&root, "b", 1);

        let before = dir_size(&root).unwrap();
        let listing = |root: &Path| list_dir(&root.join("output")).unwrap();
        let entries = listing(&root);

        inventory(&root, &PathsConfig::default()).unwrap();

        assert_eq!(dir_size(&root).unwrap(), before);
        assert_eq!(listing(&root), entries);
        assert!(!root.join("configs").exists());

        let _ = std::fs::remove_dir_all(&root);
    }
}
