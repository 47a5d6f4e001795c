//! Error types for skillseeker.
//!
//! Library crates use [`SkillSeekerError`] via `thiserror`.
//! App crates (cli/tui) wrap this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all skillseeker operations.
#[derive(Debug, thiserror::Error)]
pub enum SkillSeekerError {
    /// Malformed or incomplete source configuration, or bad settings file.
    #[error("config error: {message}")]
    Config { message: String },

    /// Two derived artifacts would share the same identity.
    #[error("name collision: '{name}' is produced by both {first} and {second}")]
    NameCollision {
        name: String,
        first: String,
        second: String,
    },

    /// Zero usable inputs were supplied.
    #[error("empty input: {message}")]
    EmptyInput { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (missing cache, bad skill directory, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// An external collaborator (scraper, packager, ...) failed.
    #[error("{step} failed: {message}")]
    Collaborator { step: String, message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SkillSeekerError>;

impl SkillSeekerError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create an empty-input error from any displayable message.
    pub fn empty_input(msg: impl Into<String>) -> Self {
        Self::EmptyInput {
            message: msg.into(),
        }
    }

    /// Describe a name produced twice, naming both sources.
    pub fn name_collision(
        name: impl Into<String>,
        first: impl Into<String>,
        second: impl Into<String>,
    ) -> Self {
        Self::NameCollision {
            name: name.into(),
            first: first.into(),
            second: second.into(),
        }
    }

    /// Failure reported by an external collaborator step.
    pub fn collaborator(step: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Collaborator {
            step: step.into(),
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = SkillSeekerError::config("missing field `base_url`");
        assert_eq!(err.to_string(), "config error: missing field `base_url`");

        let err = SkillSeekerError::name_collision("docs-api", "category 'API'", "category 'api'");
        let msg = err.to_string();
        assert!(msg.contains("docs-api"));
        assert!(msg.contains("category 'API'"));

        let err = SkillSeekerError::collaborator("package", "exit status 2");
        assert_eq!(err.to_string(), "package failed: exit status 2");
    }
}
