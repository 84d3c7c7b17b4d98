// Command handlers for the fmtbridge CLI

pub mod format;
pub mod info;
pub mod init;

pub use format::FormatCommand;
pub use info::InfoCommand;
pub use init::InitCommand;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use fmtbridge_edit::{FormatService, NoopRegistrar, Settings, StaticSettings, StatusBar, TextDocument};
use fmtbridge_module::{
    read_install, FormatterModuleHandle, ModuleOrigin, ModuleResolver, ProcessModuleLoader,
    DEFAULT_PACKAGE,
};
use tracing::{debug, warn};
use url::Url;

use crate::error::{CliError, CliResult};

/// Trait for command handlers
#[async_trait::async_trait]
pub trait Command: Send + Sync {
    /// Execute the command
    async fn execute(&self) -> CliResult<()>;
}

/// Options shared by every command
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub settings: Option<PathBuf>,
    pub root: Option<PathBuf>,
    pub bundled: Option<PathBuf>,
}

/// Everything a command needs to run the pipeline
pub struct Context {
    pub settings: Settings,
    pub root: PathBuf,
    pub resolver: Arc<ModuleResolver>,
    pub status: Arc<StatusBar>,
    pub service: FormatService,
}

impl Context {
    pub async fn build(options: &GlobalOptions) -> CliResult<Self> {
        let settings = match &options.settings {
            Some(path) => Settings::load_from_file(path)
                .await
                .map_err(|e| CliError::Config(e.to_string()))?,
            None => Settings::default(),
        };

        let root = match &options.root {
            Some(root) => root.clone(),
            None => std::env::current_dir()?,
        };
        let root = absolute(&root)?;

        let bundled = match &options.bundled {
            Some(dir) => Some(read_install(dir, DEFAULT_PACKAGE, ModuleOrigin::Bundled).await?),
            None => None,
        };
        if bundled.is_none() {
            debug!("No bundled formatter configured");
        }

        let resolver = Arc::new(ModuleResolver::new(
            Arc::new(ProcessModuleLoader::new()),
            bundled,
        ));
        let status = Arc::new(StatusBar::new(settings.status_item_text.clone()));
        let service = FormatService::new(
            Arc::clone(&resolver),
            Arc::new(StaticSettings::new(settings.clone())),
            Arc::new(NoopRegistrar),
            status.clone(),
        )
        .with_workspace_folders([root.clone()]);

        Ok(Context {
            settings,
            root,
            resolver,
            status,
            service,
        })
    }

    /// Formatter module for `path`
    pub async fn module_for(&self, path: &Path) -> CliResult<FormatterModuleHandle> {
        self.resolver
            .resolve(path, &self.settings.resolver_settings(Some(&self.root)))
            .await
            .ok_or_else(|| CliError::NoFormatter(path.display().to_string()))
    }

    /// Load `path` as a document, guessing its language unless given
    pub async fn document(&self, path: &Path, language: Option<&str>) -> CliResult<TextDocument> {
        let path = absolute(path)?;
        let text = tokio::fs::read_to_string(&path).await?;
        let uri = Url::from_file_path(&path)
            .map_err(|_| CliError::invalid_argument(format!("not a file path: {}", path.display())))?;

        let language = match language {
            Some(language) => language.to_string(),
            None => self.language_for(&path).await,
        };
        Ok(TextDocument::new(uri, language, text))
    }

    async fn language_for(&self, path: &Path) -> String {
        let guessed = match self.module_for(path).await {
            Ok(handle) => match handle.support_info(&[]).await {
                Ok(info) => language_from_table(&info.languages, path),
                Err(e) => {
                    warn!("Cannot read formatter language support: {}", e);
                    None
                }
            },
            Err(_) => None,
        };
        guessed.unwrap_or_else(|| fmtbridge_edit::parser::PLAIN_TEXT.to_string())
    }
}

fn language_from_table(languages: &[fmtbridge_module::SupportLanguage], path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let extension = path.extension().and_then(|e| e.to_str()).map(|e| format!(".{}", e));
    languages
        .iter()
        .find(|lang| {
            lang.filenames.iter().any(|f| f == name)
                || extension
                    .as_ref()
                    .map_or(false, |ext| lang.extensions.iter().any(|e| e == ext))
        })
        .and_then(|lang| lang.vscode_language_ids.first().cloned())
}

fn absolute(path: &Path) -> CliResult<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
