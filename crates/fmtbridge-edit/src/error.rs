//! Error types for the formatting pipeline

use std::path::{Path, PathBuf};

use fmtbridge_module::ModuleError;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::status::FormatterStatus;

static LINE_COLUMN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+):(\d+)").expect("Invalid regex"));

/// Formatting pipeline error
#[derive(Debug, Error)]
pub enum FormatError {
    /// No formatter module is available, local or bundled
    #[error("Formatter module could not be loaded (onlyUseLocalVersion: {only_local})")]
    ModuleNotFound { only_local: bool },

    /// Project configuration discovery failed
    #[error("Invalid formatter configuration for {path}: {reason}")]
    ConfigResolutionFailed { path: PathBuf, reason: String },

    /// `requireConfig` is set and no project configuration exists
    #[error("No project configuration found for {0}, formatting is disabled")]
    ConfigRequiredMissing(PathBuf),

    /// No parser could be determined for the document
    #[error(
        "Failed to resolve a parser for {0}, skipping file. If you registered a custom file \
         extension, be sure to configure the parser."
    )]
    ParserUnresolvable(String),

    /// The formatter failed on the document
    #[error("{0}")]
    FormatInvocationFailed(String),

    /// Settings could not be loaded
    #[error("Settings error: {0}")]
    Settings(String),

    /// Filesystem watching failed
    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    /// Invalid glob in a selector or watch pattern
    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] globset::Error),

    /// Error from the formatter module layer
    #[error(transparent)]
    Module(#[from] ModuleError),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FormatError {
    /// Create a settings error
    pub fn settings(message: impl Into<String>) -> Self {
        FormatError::Settings(message.into())
    }

    /// Create a configuration failure for `path`
    pub fn config_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        FormatError::ConfigResolutionFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Status reported when this error ends a format attempt
    pub fn status(&self) -> FormatterStatus {
        match self {
            FormatError::ConfigRequiredMissing(_) => FormatterStatus::Disabled,
            _ => FormatterStatus::Error,
        }
    }
}

/// Result type for formatting pipeline operations
pub type FormatResult<T> = Result<T, FormatError>;

/// Prefix the first `line:column` position in `message` with `path`
///
/// Only the first line is searched.
///
/// Formatter errors report positions like `(3:14)`; this turns them into
/// `(src/a.ts:3:14)` so they can be followed from a log.
pub fn annotate_with_path(message: &str, path: &Path) -> String {
    let (first, rest) = match message.split_once('\n') {
        Some((first, rest)) => (first, Some(rest)),
        None => (message, None),
    };

    let replacement = format!("{}:$1:$2", path.display());
    let first = LINE_COLUMN.replace(first, replacement.as_str());
    match rest {
        Some(rest) => format!("{}\n{}", first, rest),
        None => first.into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotate_first_line_only() {
        let message = "SyntaxError: Unexpected token (3:14)\n  1 | const a = {\n> 3 | x:1";
        let annotated = annotate_with_path(message, Path::new("/ws/src/a.ts"));
        let mut lines = annotated.lines();
        assert_eq!(
            lines.next(),
            Some("SyntaxError: Unexpected token (/ws/src/a.ts:3:14)")
        );
        assert_eq!(lines.next(), Some("  1 | const a = {"));
        assert_eq!(lines.next(), Some("> 3 | x:1"));
    }

    #[test]
    fn test_annotate_only_first_position() {
        let annotated = annotate_with_path(
            "Unexpected token (3:14), expected (3:20)",
            Path::new("/a.ts"),
        );
        assert_eq!(annotated, "Unexpected token (/a.ts:3:14), expected (3:20)");
    }

    #[test]
    fn test_annotate_without_position() {
        let annotated = annotate_with_path("Couldn't resolve parser", Path::new("/a.ts"));
        assert_eq!(annotated, "Couldn't resolve parser");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            FormatError::ConfigRequiredMissing(PathBuf::from("/a.ts")).status(),
            FormatterStatus::Disabled
        );
        assert_eq!(
            FormatError::ParserUnresolvable("a.foo".into()).status(),
            FormatterStatus::Error
        );
    }
}
