// Command routing and dispatch

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::*;
use crate::error::CliResult;

/// fmtbridge - run an external code formatter the way an editor integration does
#[derive(Parser, Debug)]
#[command(name = "fmtbridge")]
#[command(bin_name = "fmtbridge")]
#[command(about = "Format files through a project's own formatter installation")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Settings file (YAML or JSON)
    #[arg(long, global = true, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Workspace root (default: current directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Formatter package used when the project has none
    #[arg(long, global = true, value_name = "DIR", env = "FMTBRIDGE_BUNDLED")]
    pub bundled: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Format a file and print or write the result
    Format {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Write the result back to the file
        #[arg(short, long)]
        write: bool,

        /// Ignore ignore files and pragma requirements
        #[arg(long)]
        force: bool,

        /// Byte range to format, as START:END
        #[arg(long, value_name = "START:END")]
        range: Option<String>,

        /// Language identifier (default: guessed from the file name)
        #[arg(long, value_name = "ID")]
        language: Option<String>,
    },

    /// Write a starter .prettierrc
    Init {
        #[arg(value_name = "DIR")]
        dir: Option<PathBuf>,
    },

    /// Show the module, readiness and parser for a file
    Info {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Language identifier (default: guessed from the file name)
        #[arg(long, value_name = "ID")]
        language: Option<String>,
    },
}

impl Cli {
    pub fn global_options(&self) -> GlobalOptions {
        GlobalOptions {
            settings: self.settings.clone(),
            root: self.root.clone(),
            bundled: self.bundled.clone(),
        }
    }
}

/// Routes parsed arguments to command handlers
pub struct CommandRouter;

impl CommandRouter {
    /// Execute a command
    pub async fn execute(cli: &Cli) -> CliResult<()> {
        let options = cli.global_options();
        match &cli.command {
            Commands::Format {
                file,
                write,
                force,
                range,
                language,
            } => {
                let cmd = FormatCommand::new(options, file.clone())
                    .with_write(*write)
                    .with_force(*force)
                    .with_range(range.clone())
                    .with_language(language.clone());
                cmd.execute().await
            }
            Commands::Init { dir } => InitCommand::new(options, dir.clone()).execute().await,
            Commands::Info { file, language } => {
                let cmd = InfoCommand::new(options, file.clone()).with_language(language.clone());
                cmd.execute().await
            }
        }
    }
}
