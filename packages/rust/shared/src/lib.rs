//! Shared types, error model, and configuration for skillseeker.
//!
//! This crate is the foundation depended on by all other skillseeker crates.
//! It provides:
//! - [`SkillSeekerError`]: the unified error type
//! - Domain types ([`SourceConfig`], [`RouterConfig`], [`OrderedMap`])
//! - Source-config I/O and validation ([`load_source_config`], [`validate_source_config`])
//! - Application settings ([`AppConfig`], settings loading)

pub mod config;
pub mod error;
pub mod source;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CollaboratorsConfig, PathsConfig, SplitDefaults, UploadConfig, api_key_configured,
    config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{Result, SkillSeekerError};
pub use source::{
    SKILL_MANIFEST, ValidationReport, find_config, find_skill_dir, load_source_config,
    new_source_config, normalize_base_url, parse_source_config, to_pretty_json,
    validate_config_name, validate_source_config, write_config_document,
};
pub use types::{
    DEFAULT_MAX_PAGES, DEFAULT_RATE_LIMIT, OrderedMap, RouterConfig, Selectors, SourceConfig,
    UrlPatterns,
};
