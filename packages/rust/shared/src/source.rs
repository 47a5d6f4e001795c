//! Loading, writing, and validating source configurations.
//!
//! Source configs are the JSON documents under `configs/` that describe one
//! documentation site. Everything here is synchronous local file access.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use url::Url;

use crate::error::{Result, SkillSeekerError};
use crate::types::{OrderedMap, Selectors, SourceConfig, UrlPatterns, DEFAULT_RATE_LIMIT};

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid regex"));

/// File name that marks a directory as a built skill.
pub const SKILL_MANIFEST: &str = "SKILL.md";

/// Whether `name` is usable as a config/skill identifier.
pub fn validate_config_name(name: &str) -> bool {
    NAME_RE.is_match(name)
}

/// Parse and normalize an absolute http(s) base URL (always ends in `/`).
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let url = Url::parse(raw)
        .map_err(|e| SkillSeekerError::config(format!("invalid base_url '{raw}': {e}")))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(SkillSeekerError::config(format!(
            "invalid base_url '{raw}': must start with http:// or https://"
        )));
    }

    let mut normalized = url.to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Ok(normalized)
}

// ---------------------------------------------------------------------------
// Parsing / loading
// ---------------------------------------------------------------------------

/// Parse a source config from JSON text, enforcing the hard invariants.
///
/// Fails with a config error when the JSON is malformed, `name`/`base_url`
/// is missing, or a field is out of range.
pub fn parse_source_config(text: &str) -> Result<SourceConfig> {
    let mut config: SourceConfig = serde_json::from_str(text)
        .map_err(|e| SkillSeekerError::config(format!("invalid source config: {e}")))?;

    if !validate_config_name(&config.name) {
        return Err(SkillSeekerError::config(format!(
            "invalid name '{}': use only letters, numbers, hyphens, underscores",
            config.name
        )));
    }
    config.base_url = normalize_base_url(&config.base_url)?;

    if config.max_pages == 0 {
        return Err(SkillSeekerError::config(format!(
            "config '{}': max_pages must be positive",
            config.name
        )));
    }
    if !config.rate_limit.is_finite() || config.rate_limit <= 0.0 {
        return Err(SkillSeekerError::config(format!(
            "config '{}': rate_limit must be a positive number of seconds",
            config.name
        )));
    }

    Ok(config)
}

/// Load a source config from disk.
pub fn load_source_config(path: &Path) -> Result<SourceConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SkillSeekerError::io(path, e))?;
    parse_source_config(&content).map_err(|e| match e {
        SkillSeekerError::Config { message } => {
            SkillSeekerError::config(format!("{}: {message}", path.display()))
        }
        other => other,
    })
}

/// Render any config document as 2-space indented JSON with a trailing newline.
pub fn to_pretty_json<T: Serialize>(doc: &T) -> Result<String> {
    let mut json = serde_json::to_string_pretty(doc)
        .map_err(|e| SkillSeekerError::validation(format!("JSON serialization failed: {e}")))?;
    json.push('\n');
    Ok(json)
}

/// Write a config document, creating parent directories. Overwrites.
pub fn write_config_document<T: Serialize>(path: &Path, doc: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| SkillSeekerError::io(parent, e))?;
    }
    let json = to_pretty_json(doc)?;
    std::fs::write(path, json).map_err(|e| SkillSeekerError::io(path, e))?;
    tracing::debug!(path = %path.display(), "wrote config document");
    Ok(())
}

/// Build the skeleton config that `config create` writes.
pub fn new_source_config(
    name: &str,
    url: &str,
    description: &str,
    max_pages: u32,
) -> Result<SourceConfig> {
    if !validate_config_name(name) {
        return Err(SkillSeekerError::config(format!(
            "invalid name '{name}': use only letters, numbers, hyphens, underscores"
        )));
    }
    if max_pages == 0 {
        return Err(SkillSeekerError::config("max_pages must be positive"));
    }

    Ok(SourceConfig {
        name: name.to_string(),
        description: description.to_string(),
        base_url: normalize_base_url(url)?,
        selectors: Selectors {
            main_content: Some("div[role='main']".into()),
            title: Some("title".into()),
            code_blocks: Some("pre code".into()),
            extra: Default::default(),
        },
        url_patterns: UrlPatterns::default(),
        categories: OrderedMap::new(),
        rate_limit: DEFAULT_RATE_LIMIT,
        max_pages,
        extra: Default::default(),
    })
}

// ---------------------------------------------------------------------------
// Validation report
// ---------------------------------------------------------------------------

/// Result of a soft validation pass over a config that already parsed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Check a config for problems the crawler would trip over.
///
/// Hard problems land in `errors`; likely-mistakes land in `warnings`.
pub fn validate_source_config(config: &SourceConfig) -> ValidationReport {
    let mut report = ValidationReport::default();

    if !validate_config_name(&config.name) {
        report
            .errors
            .push(format!("name '{}' must match [A-Za-z0-9_-]+", config.name));
    }
    if let Err(e) = normalize_base_url(&config.base_url) {
        report.errors.push(e.to_string());
    }
    if config.max_pages == 0 {
        report.errors.push("max_pages must be positive".into());
    }
    if !config.rate_limit.is_finite() || config.rate_limit <= 0.0 {
        report.errors.push("rate_limit must be a positive number".into());
    }

    if config.selectors.main_content.is_none() {
        report
            .warnings
            .push("no main_content selector; the crawler will fall back to <body>".into());
    }
    if config.categories.is_empty() && !config.is_router() {
        report
            .warnings
            .push("no categories declared; splitting will use a single 'general' group".into());
    }
    for (category, keywords) in config.categories.iter() {
        if keywords.is_empty() {
            report
                .warnings
                .push(format!("category '{category}' has no keywords"));
        }
    }
    if config.url_patterns.include.is_empty() {
        report
            .warnings
            .push("no url_patterns.include; the whole site under base_url will be crawled".into());
    }

    report
}

// ---------------------------------------------------------------------------
// Lookup helpers
// ---------------------------------------------------------------------------

/// Resolve a config argument to a file.
///
/// Tries, in order: `query` as given (relative to `root`), `<configs_dir>/<query>`,
/// `<configs_dir>/<query>.json`, `<query>.json`.
pub fn find_config(root: &Path, configs_dir: &Path, query: &str) -> Option<PathBuf> {
    let configs = root.join(configs_dir);
    let candidates = [
        root.join(query),
        configs.join(query),
        configs.join(format!("{query}.json")),
        root.join(format!("{query}.json")),
    ];

    candidates.into_iter().find(|p| p.is_file())
}

/// Resolve a skill name to a built skill directory (one containing `SKILL.md`).
pub fn find_skill_dir(root: &Path, output_dir: &Path, name: &str) -> Option<PathBuf> {
    let candidates = [root.join(output_dir).join(name), root.join(name)];
    candidates
        .into_iter()
        .find(|p| p.is_dir() && p.join(SKILL_MANIFEST).is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ss-source-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn name_validation() {
        assert!(validate_config_name("react-docs_v2"));
        assert!(!validate_config_name("react docs"));
        assert!(!validate_config_name(""));
        assert!(!validate_config_name("../etc"));
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        assert_eq!(
            normalize_base_url("https://react.dev/learn").unwrap(),
            "https://react.dev/learn/"
        );
        assert_eq!(
            normalize_base_url("https://react.dev/").unwrap(),
            "https://react.dev/"
        );
        assert!(normalize_base_url("ftp://example.com").is_err());
        assert!(normalize_base_url("not a url").is_err());
    }

    #[test]
    fn parse_rejects_malformed_and_incomplete() {
        let err = parse_source_config("{ not json").unwrap_err();
        assert!(matches!(err, SkillSeekerError::Config { .. }));

        let err = parse_source_config(r#"{"name": "x"}"#).unwrap_err();
        assert!(err.to_string().contains("base_url"));

        let err = parse_source_config(r#"{"base_url": "https://x.dev"}"#).unwrap_err();
        assert!(err.to_string().contains("name"));

        let err =
            parse_source_config(r#"{"name": "x", "base_url": "https://x.dev", "max_pages": 0}"#)
                .unwrap_err();
        assert!(err.to_string().contains("max_pages"));
    }

    #[test]
    fn parse_normalizes_base_url() {
        let cfg = parse_source_config(r#"{"name": "x", "base_url": "https://x.dev/docs"}"#)
            .unwrap();
        assert_eq!(cfg.base_url, "https://x.dev/docs/");
    }

    #[test]
    fn new_config_skeleton() {
        let cfg = new_source_config("godot", "https://docs.godotengine.org", "Godot", 100).unwrap();
        assert_eq!(cfg.base_url, "https://docs.godotengine.org/");
        assert_eq!(cfg.selectors.main_content.as_deref(), Some("div[role='main']"));
        assert_eq!(cfg.max_pages, 100);
        assert!(new_source_config("bad name", "https://x.dev", "", 10).is_err());
    }

    #[test]
    fn validation_report_flags_warnings() {
        let cfg = parse_source_config(
            r#"{"name": "x", "base_url": "https://x.dev", "categories": {"api": []}}"#,
        )
        .unwrap();
        let report = validate_source_config(&cfg);
        assert!(!report.has_errors());
        assert!(report.warnings.iter().any(|w| w.contains("'api' has no keywords")));
        assert!(report.warnings.iter().any(|w| w.contains("main_content")));
    }

    #[test]
    fn write_then_load_preserves_document() {
        let tmp = temp_dir();
        let text = r#"{"name": "x", "base_url": "https://x.dev/", "custom": [1, 2]}"#;
        let cfg = parse_source_config(text).unwrap();

        let path = tmp.join("configs").join("x.json");
        write_config_document(&path, &cfg).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.ends_with('\n'));
        assert!(written.contains("\n  \"name\": \"x\""));

        let loaded = load_source_config(&path).unwrap();
        assert_eq!(loaded, cfg);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn find_config_search_order() {
        let tmp = temp_dir();
        std::fs::create_dir_all(tmp.join("configs")).unwrap();
        std::fs::write(tmp.join("configs/react.json"), "{}").unwrap();
        std::fs::write(tmp.join("vue.json"), "{}").unwrap();

        let configs = Path::new("configs");
        assert_eq!(
            find_config(&tmp, configs, "react"),
            Some(tmp.join("configs/react.json"))
        );
        assert_eq!(
            find_config(&tmp, configs, "react.json"),
            Some(tmp.join("configs/react.json"))
        );
        assert_eq!(find_config(&tmp, configs, "vue"), Some(tmp.join("vue.json")));
        assert_eq!(find_config(&tmp, configs, "svelte"), None);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn find_skill_dir_requires_manifest() {
        let tmp = temp_dir();
        std::fs::create_dir_all(tmp.join("output/react")).unwrap();
        std::fs::create_dir_all(tmp.join("output/vue")).unwrap();
        std::fs::write(tmp.join("output/react/SKILL.md"), "# React").unwrap();

        let output = Path::new("output");
        assert_eq!(
            find_skill_dir(&tmp, output, "react"),
            Some(tmp.join("output/react"))
        );
        assert_eq!(find_skill_dir(&tmp, output, "vue"), None);

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
