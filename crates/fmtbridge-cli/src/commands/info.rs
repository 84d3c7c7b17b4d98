//! Info command - show how a file would be formatted

use std::path::PathBuf;

use fmtbridge_edit::ParserSelector;
use fmtbridge_module::FileInfoOptions;
use serde_json::json;

use crate::commands::{Command, Context, GlobalOptions};
use crate::error::{CliError, CliResult};

/// Info command handler
pub struct InfoCommand {
    options: GlobalOptions,
    file: PathBuf,
    language: Option<String>,
}

impl InfoCommand {
    pub fn new(options: GlobalOptions, file: PathBuf) -> Self {
        Self {
            options,
            file,
            language: None,
        }
    }

    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }
}

#[async_trait::async_trait]
impl Command for InfoCommand {
    async fn execute(&self) -> CliResult<()> {
        let context = Context::build(&self.options).await?;
        let document = context
            .document(&self.file, self.language.as_deref())
            .await?;
        let path = document.fs_path().unwrap_or_else(|| self.file.clone());
        let handle = context.module_for(&path).await?;

        let readiness = context.service.handle_active_document(Some(&document)).await;
        let file_info = handle
            .file_info(
                &path,
                &FileInfoOptions {
                    with_node_modules: context.settings.with_node_modules,
                    ..Default::default()
                },
            )
            .await
            .ok()
            .flatten();
        let parser = ParserSelector
            .select(&handle, Some(&path), &document.language_id, file_info.as_ref(), &[])
            .await
            .ok();

        let report = json!({
            "file": path.display().to_string(),
            "language": document.language_id,
            "module": {
                "origin": handle.origin(),
                "version": handle.version().map(|v| v.to_string()),
                "path": handle.path().display().to_string(),
            },
            "readiness": readiness.map(|r| r.status()),
            "ignored": file_info.as_ref().map(|info| info.ignored),
            "parser": parser,
        });
        let rendered =
            serde_json::to_string_pretty(&report).map_err(|e| CliError::Internal(e.to_string()))?;
        println!("{}", rendered);
        Ok(())
    }
}
