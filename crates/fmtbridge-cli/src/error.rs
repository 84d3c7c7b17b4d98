//! CLI errors

use fmtbridge_edit::FormatError;
use fmtbridge_module::ModuleError;
use thiserror::Error;

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No formatter module available for {0}")]
    NoFormatter(String),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Module(#[from] ModuleError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CliError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        CliError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            CliError::InvalidArgument { message } => {
                format!("Invalid argument: {}\n\nRun 'fmtbridge --help' for usage information.", message)
            }
            CliError::Io(e) => format!("File operation failed: {}", e),
            CliError::Config(msg) => {
                format!("Configuration error: {}\n\nCheck the file passed with --settings.", msg)
            }
            CliError::NoFormatter(target) => format!(
                "No formatter module available for {}.\n\nInstall one in the project or pass --bundled.",
                target
            ),
            CliError::Format(e) => e.to_string(),
            CliError::Module(e) => e.to_string(),
            CliError::Internal(msg) => format!("Internal error: {}", msg),
        }
    }
}

pub type CliResult<T> = Result<T, CliError>;
