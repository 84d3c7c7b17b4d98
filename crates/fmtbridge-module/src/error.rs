//! Error types for formatter module resolution and invocation

use std::path::PathBuf;

use thiserror::Error;

/// Formatter module error
#[derive(Debug, Error)]
pub enum ModuleError {
    /// No formatter module could be located
    #[error("Formatter module not found: {0}")]
    NotFound(String),

    /// A module was located but could not be loaded
    #[error("Failed to load formatter module from {path}: {reason}")]
    LoadFailed { path: PathBuf, reason: String },

    /// The module does not provide the requested capability
    #[error("Formatter module does not support {0}")]
    Unsupported(&'static str),

    /// The formatter ran but reported a failure
    #[error("{0}")]
    Invocation(String),

    /// The formatter produced output that could not be understood
    #[error("Invalid formatter output: {0}")]
    InvalidOutput(String),

    /// Project configuration discovery failed
    #[error("Failed to resolve configuration from {path}: {reason}")]
    ConfigDiscovery { path: PathBuf, reason: String },

    /// Invalid glob in a configuration override
    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] globset::Error),

    /// Invalid module version string
    #[error("Invalid module version: {0}")]
    Version(#[from] semver::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON5 parsing error
    #[error("JSON5 parsing error: {0}")]
    Json5(#[from] json5::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ModuleError {
    /// Create a not-found error
    pub fn not_found(message: impl Into<String>) -> Self {
        ModuleError::NotFound(message.into())
    }

    /// Create a load failure for the module at `path`
    pub fn load_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ModuleError::LoadFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an invocation error
    pub fn invocation(message: impl Into<String>) -> Self {
        ModuleError::Invocation(message.into())
    }

    /// Create an invalid output error
    pub fn invalid_output(message: impl Into<String>) -> Self {
        ModuleError::InvalidOutput(message.into())
    }

    /// Create a configuration discovery error for the file at `path`
    pub fn config_discovery(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ModuleError::ConfigDiscovery {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for formatter module operations
pub type ModuleResult<T> = Result<T, ModuleError>;
