//! Shared fixtures for the fmtbridge scenario tests
//!
//! [`MockFormatter`] stands in for the external formatter: it records every
//! call, applies a configurable text transform, and serves a small language
//! table. [`Project`] is a throwaway directory laid out like a JavaScript
//! project.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use fmtbridge_edit::{
    FormatService, NoopRegistrar, Settings, StaticSettings, StatusBar, TextDocument,
};
use fmtbridge_module::{
    FormatterModule, ModuleError, ModuleInstall, ModuleLoader, ModuleOrigin, ModuleResolver,
    ModuleResult, OptionMap, SupportInfo, SupportLanguage,
};
use parking_lot::Mutex;
use tempfile::TempDir;
use url::Url;

type Transform = Box<dyn Fn(&str) -> String + Send + Sync>;

/// Formatter double recording each `format` call
pub struct MockFormatter {
    transform: Transform,
    failure: Option<String>,
    calls: Mutex<Vec<OptionMap>>,
    languages: Vec<SupportLanguage>,
}

impl MockFormatter {
    /// Formatter returning its input unchanged
    pub fn echo() -> Self {
        Self::with_transform(|text| text.to_string())
    }

    pub fn with_transform(transform: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        MockFormatter {
            transform: Box::new(transform),
            failure: None,
            calls: Mutex::new(Vec::new()),
            languages: default_languages(),
        }
    }

    /// Make every `format` call fail with `message`
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Options passed to each `format` call so far
    pub fn calls(&self) -> Vec<OptionMap> {
        self.calls.lock().clone()
    }

    /// Editor language identifier for a file extension such as `.ts`
    pub fn language_for_extension(&self, extension: &str) -> Option<String> {
        self.languages
            .iter()
            .find(|lang| lang.extensions.iter().any(|e| e == extension))
            .and_then(|lang| lang.vscode_language_ids.first().cloned())
    }
}

fn language(name: &str, parser: &str, extensions: &[&str], ids: &[&str]) -> SupportLanguage {
    SupportLanguage {
        name: name.to_string(),
        parsers: vec![parser.to_string()],
        extensions: extensions.iter().map(|s| s.to_string()).collect(),
        vscode_language_ids: ids.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

fn default_languages() -> Vec<SupportLanguage> {
    vec![
        language("JavaScript", "babel", &[".js", ".mjs", ".cjs"], &["javascript"]),
        language("TypeScript", "typescript", &[".ts", ".mts", ".cts"], &["typescript"]),
        language("TSX", "typescript", &[".tsx"], &["typescriptreact"]),
        language("JSON", "json", &[".json"], &["json"]),
        language("Markdown", "markdown", &[".md"], &["markdown"]),
    ]
}

#[async_trait]
impl FormatterModule for MockFormatter {
    async fn format(&self, text: &str, options: &OptionMap) -> ModuleResult<String> {
        self.calls.lock().push(options.clone());
        match &self.failure {
            Some(message) => Err(ModuleError::Invocation(message.clone())),
            None => Ok((self.transform)(text)),
        }
    }

    async fn support_info(&self, _plugins: &[String]) -> ModuleResult<SupportInfo> {
        Ok(SupportInfo {
            languages: self.languages.clone(),
        })
    }
}

/// Loader handing out the same formatter for every install
pub struct MockLoader {
    formatter: Arc<MockFormatter>,
    loads: Mutex<Vec<ModuleInstall>>,
}

impl MockLoader {
    pub fn new(formatter: Arc<MockFormatter>) -> Self {
        MockLoader {
            formatter,
            loads: Mutex::new(Vec::new()),
        }
    }

    /// Installs loaded so far
    pub fn loads(&self) -> Vec<ModuleInstall> {
        self.loads.lock().clone()
    }
}

#[async_trait]
impl ModuleLoader for MockLoader {
    async fn load(&self, install: &ModuleInstall) -> ModuleResult<Arc<dyn FormatterModule>> {
        self.loads.lock().push(install.clone());
        Ok(self.formatter.clone())
    }
}

/// Bundled install pointing nowhere; the mock loader never reads it
pub fn bundled_install() -> ModuleInstall {
    ModuleInstall {
        path: PathBuf::from("/opt/fmtbridge/node_modules/prettier"),
        version: semver_version(3, 3, 3),
        entry: None,
        origin: ModuleOrigin::Bundled,
    }
}

fn semver_version(major: u64, minor: u64, patch: u64) -> Option<semver::Version> {
    Some(semver::Version::new(major, minor, patch))
}

/// A temporary project directory with a `package.json`
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn new() -> io::Result<Self> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("package.json"), r#"{"name": "fixture"}"#)?;
        Ok(Project { dir })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write `content` to `relative`, creating parent directories
    pub fn write(&self, relative: &str, content: &str) -> io::Result<PathBuf> {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        Ok(path)
    }

    /// Install a fake local formatter package under `node_modules`
    pub fn install_local_formatter(&self, version: &str) -> io::Result<PathBuf> {
        self.write(
            "node_modules/prettier/package.json",
            &format!(
                r#"{{"name": "prettier", "version": "{}", "bin": "./bin/prettier.cjs"}}"#,
                version
            ),
        )
    }

    /// Write a file and open it as a document
    pub fn document(&self, relative: &str, language_id: &str, text: &str) -> io::Result<TextDocument> {
        let path = self.write(relative, text)?;
        let uri = Url::from_file_path(&path)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "not an absolute path"))?;
        Ok(TextDocument::new(uri, language_id, text))
    }
}

/// A format service wired to mocks
pub struct Pipeline {
    pub formatter: Arc<MockFormatter>,
    pub loader: Arc<MockLoader>,
    pub settings: Arc<StaticSettings>,
    pub status: Arc<StatusBar>,
    pub service: Arc<FormatService>,
}

impl Pipeline {
    /// Service over `formatter` with a bundled fallback and `root` as the workspace
    pub fn new(formatter: MockFormatter, settings: Settings, root: &Path) -> Self {
        let formatter = Arc::new(formatter);
        let loader = Arc::new(MockLoader::new(formatter.clone()));
        let resolver = Arc::new(ModuleResolver::new(loader.clone(), Some(bundled_install())));
        let settings = Arc::new(StaticSettings::new(settings));
        let status = Arc::new(StatusBar::new("Prettier"));
        let service = Arc::new(
            FormatService::new(
                resolver,
                settings.clone(),
                Arc::new(NoopRegistrar),
                status.clone(),
            )
            .with_workspace_folders([root.to_path_buf()]),
        );

        Pipeline {
            formatter,
            loader,
            settings,
            status,
            service,
        }
    }
}
