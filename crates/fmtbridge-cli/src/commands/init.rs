//! Init command - write a starter formatter configuration

use std::path::PathBuf;

use fmtbridge_edit::TemplateService;
use tracing::info;

use crate::commands::{Command, Context, GlobalOptions};
use crate::error::{CliError, CliResult};

/// Init command handler
pub struct InitCommand {
    options: GlobalOptions,
    folder: Option<PathBuf>,
}

impl InitCommand {
    pub fn new(options: GlobalOptions, folder: Option<PathBuf>) -> Self {
        Self { options, folder }
    }
}

#[async_trait::async_trait]
impl Command for InitCommand {
    async fn execute(&self) -> CliResult<()> {
        let context = Context::build(&self.options).await?;
        let folder = self.folder.clone().unwrap_or_else(|| context.root.clone());

        let module = context
            .resolver
            .resolve_global(&context.settings.resolver_settings(Some(&context.root)))
            .await
            .ok_or_else(|| CliError::NoFormatter(folder.display().to_string()))?;

        let written = TemplateService::new(module).write_config_file(&folder).await?;
        info!("Created {}", written.display());
        println!("{}", written.display());
        Ok(())
    }
}
