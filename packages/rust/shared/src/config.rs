//! Application settings for skillseeker.
//!
//! User settings live at `~/.skillseeker/skillseeker.toml`.
//! CLI flags override settings file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SkillSeekerError};

/// Default settings file name.
const CONFIG_FILE_NAME: &str = "skillseeker.toml";

/// Default settings directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".skillseeker";

// ---------------------------------------------------------------------------
// Settings structs (matching skillseeker.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application settings, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Project directory layout.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Defaults for `config split`.
    #[serde(default)]
    pub split: SplitDefaults,

    /// Upload credentials lookup.
    #[serde(default)]
    pub upload: UploadConfig,

    /// Commands for the external scraper, enhancer, packager, and uploader.
    #[serde(default)]
    pub collaborators: CollaboratorsConfig,
}

/// `[paths]` section. Both paths are relative to the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_configs_dir")]
    pub configs_dir: PathBuf,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            configs_dir: default_configs_dir(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_configs_dir() -> PathBuf {
    PathBuf::from("configs")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

/// `[split]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitDefaults {
    /// One of `auto`, `none`, `category`, `router`, `size`.
    #[serde(default = "default_strategy")]
    pub strategy: String,

    /// Target pages per sub-skill.
    #[serde(default = "default_target_pages")]
    pub target_pages: u32,
}

impl Default for SplitDefaults {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            target_pages: default_target_pages(),
        }
    }
}

fn default_strategy() -> String {
    "auto".into()
}
fn default_target_pages() -> u32 {
    5000
}

/// `[upload]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
        }
    }
}

fn default_api_key_env() -> String {
    "ANTHROPIC_API_KEY".into()
}

/// `[collaborators]` section: argv templates for each external step.
///
/// Placeholders: `{config}`, `{skill}`, `{skill_dir}`, `{archive}`, `{root}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollaboratorsConfig {
    #[serde(default = "default_scrape_cmd")]
    pub scrape: Vec<String>,
    #[serde(default = "default_estimate_cmd")]
    pub estimate: Vec<String>,
    #[serde(default = "default_scrape_preview_cmd")]
    pub scrape_preview: Vec<String>,
    #[serde(default = "default_build_cmd")]
    pub build: Vec<String>,
    #[serde(default = "default_enhance_local_cmd")]
    pub enhance_local: Vec<String>,
    #[serde(default = "default_enhance_api_cmd")]
    pub enhance_api: Vec<String>,
    #[serde(default = "default_package_cmd")]
    pub package: Vec<String>,
    #[serde(default = "default_upload_cmd")]
    pub upload: Vec<String>,
}

impl Default for CollaboratorsConfig {
    fn default() -> Self {
        Self {
            scrape: default_scrape_cmd(),
            estimate: default_estimate_cmd(),
            scrape_preview: default_scrape_preview_cmd(),
            build: default_build_cmd(),
            enhance_local: default_enhance_local_cmd(),
            enhance_api: default_enhance_api_cmd(),
            package: default_package_cmd(),
            upload: default_upload_cmd(),
        }
    }
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| (*s).to_string()).collect()
}

fn default_scrape_cmd() -> Vec<String> {
    argv(&["python3", "cli/doc_scraper.py", "--config", "{config}"])
}
fn default_estimate_cmd() -> Vec<String> {
    argv(&["python3", "cli/estimate_pages.py", "{config}"])
}
fn default_scrape_preview_cmd() -> Vec<String> {
    argv(&["python3", "cli/doc_scraper.py", "--config", "{config}", "--dry-run"])
}
fn default_build_cmd() -> Vec<String> {
    argv(&["python3", "cli/doc_scraper.py", "--config", "{config}", "--skip-scrape"])
}
fn default_enhance_local_cmd() -> Vec<String> {
    argv(&["python3", "cli/enhance_skill_local.py", "{skill_dir}"])
}
fn default_enhance_api_cmd() -> Vec<String> {
    argv(&["python3", "cli/enhance_skill.py", "{skill_dir}"])
}
fn default_package_cmd() -> Vec<String> {
    argv(&["python3", "cli/package_skill.py", "{skill_dir}", "--no-open"])
}
fn default_upload_cmd() -> Vec<String> {
    argv(&["python3", "cli/upload_skill.py", "{archive}"])
}

// ---------------------------------------------------------------------------
// Settings loading
// ---------------------------------------------------------------------------

/// Get the path to the settings directory (`~/.skillseeker/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| SkillSeekerError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the settings file (`~/.skillseeker/skillseeker.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load settings from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "settings file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load settings from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SkillSeekerError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        SkillSeekerError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the settings directory and write a default settings file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| SkillSeekerError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| SkillSeekerError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| SkillSeekerError::io(&path, e))?;
    tracing::info!(?path, "created default settings file");

    Ok(path)
}

/// Whether the upload API key env var is set and non-empty.
pub fn api_key_configured(config: &AppConfig) -> bool {
    matches!(std::env::var(&config.upload.api_key_env), Ok(val) if !val.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default settings");
        assert!(toml_str.contains("configs_dir"));
        assert!(toml_str.contains("ANTHROPIC_API_KEY"));
        assert!(toml_str.contains("doc_scraper.py"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.split.target_pages, 5000);
        assert_eq!(parsed.split.strategy, "auto");
        assert_eq!(parsed.paths.output_dir, PathBuf::from("output"));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[paths]
output_dir = "build"

[collaborators]
package = ["zip", "-r", "{archive}", "{skill_dir}"]
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.paths.output_dir, PathBuf::from("build"));
        assert_eq!(config.paths.configs_dir, PathBuf::from("configs"));
        assert_eq!(config.collaborators.package[0], "zip");
        assert_eq!(config.collaborators.upload, default_upload_cmd());
        assert_eq!(config.collaborators.estimate, default_estimate_cmd());
        assert_eq!(config.collaborators.scrape_preview, default_scrape_preview_cmd());
    }

    #[test]
    fn api_key_detection() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.upload.api_key_env = "SS_TEST_NONEXISTENT_KEY_12345".into();
        assert!(!api_key_configured(&config));
    }
}
