//! Formatter capability interface and loaded module handles

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use semver::Version;

use crate::error::{ModuleError, ModuleResult};
use crate::types::{
    Capabilities, Capability, FileInfo, FileInfoOptions, ModuleOrigin, OptionMap,
    ResolveConfigOptions, SupportInfo,
};

/// Capability interface of an external formatter module
///
/// `format` and `support_info` are required. The remaining methods are
/// optional: a module advertises them through [`FormatterModule::capabilities`]
/// and callers check with [`FormatterModuleHandle::has`] before calling.
#[async_trait]
pub trait FormatterModule: Send + Sync {
    /// Format `text` with the given options
    async fn format(&self, text: &str, options: &OptionMap) -> ModuleResult<String>;

    /// Languages this module can format, including those added by `plugins`
    async fn support_info(&self, plugins: &[String]) -> ModuleResult<SupportInfo>;

    /// Optional capabilities implemented by this module
    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }

    /// Ignore status and inferred parser for `path`
    async fn file_info(&self, _path: &Path, _options: &FileInfoOptions) -> ModuleResult<FileInfo> {
        Err(ModuleError::Unsupported("getFileInfo"))
    }

    /// Project configuration applying to `path`, `None` when there is none
    async fn resolve_config(
        &self,
        _path: &Path,
        _options: &ResolveConfigOptions,
    ) -> ModuleResult<Option<OptionMap>> {
        Err(ModuleError::Unsupported("resolveConfig"))
    }

    /// Location of the configuration file applying to `path`
    async fn resolve_config_file(&self, _path: &Path) -> ModuleResult<Option<PathBuf>> {
        Err(ModuleError::Unsupported("resolveConfigFile"))
    }
}

/// A located formatter package on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInstall {
    /// Package directory (the one holding its `package.json`)
    pub path: PathBuf,
    /// Version declared by the package manifest
    pub version: Option<Version>,
    /// Entry point used to run the formatter
    pub entry: Option<PathBuf>,
    /// Where the package was found
    pub origin: ModuleOrigin,
}

/// Turns a located package into a usable capability object
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    /// Load the module at `install`
    async fn load(&self, install: &ModuleInstall) -> ModuleResult<Arc<dyn FormatterModule>>;
}

/// One loaded formatter module instance
///
/// Handles are immutable once created. The resolver replaces them wholesale on
/// invalidation, so a clone handed out earlier keeps working unchanged.
#[derive(Clone)]
pub struct FormatterModuleHandle {
    origin: ModuleOrigin,
    version: Option<Version>,
    path: PathBuf,
    module: Arc<dyn FormatterModule>,
}

impl FormatterModuleHandle {
    /// Wrap a loaded module
    pub fn new(install: &ModuleInstall, module: Arc<dyn FormatterModule>) -> Self {
        FormatterModuleHandle {
            origin: install.origin,
            version: install.version.clone(),
            path: install.path.clone(),
            module,
        }
    }

    pub fn origin(&self) -> ModuleOrigin {
        self.origin
    }

    pub fn version(&self) -> Option<&Version> {
        self.version.as_ref()
    }

    /// Directory the module was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the module provides an optional capability
    pub fn has(&self, capability: Capability) -> bool {
        self.module.capabilities().has(capability)
    }

    /// Whether the module is version 3 or later
    ///
    /// From version 3 on, plugins are not loaded implicitly and must be read
    /// from the project configuration.
    pub fn is_above_v3(&self) -> bool {
        self.version.as_ref().map(|v| v.major >= 3).unwrap_or(false)
    }

    pub async fn format(&self, text: &str, options: &OptionMap) -> ModuleResult<String> {
        self.module.format(text, options).await
    }

    pub async fn support_info(&self, plugins: &[String]) -> ModuleResult<SupportInfo> {
        self.module.support_info(plugins).await
    }

    /// File info, or `None` when the module lacks the capability
    pub async fn file_info(
        &self,
        path: &Path,
        options: &FileInfoOptions,
    ) -> ModuleResult<Option<FileInfo>> {
        if !self.has(Capability::FileInfo) {
            return Ok(None);
        }
        self.module.file_info(path, options).await.map(Some)
    }

    /// Project configuration, or `None` when there is none or the module
    /// lacks the capability
    pub async fn resolve_config(
        &self,
        path: &Path,
        options: &ResolveConfigOptions,
    ) -> ModuleResult<Option<OptionMap>> {
        if !self.has(Capability::ResolveConfig) {
            return Ok(None);
        }
        self.module.resolve_config(path, options).await
    }

    pub async fn resolve_config_file(&self, path: &Path) -> ModuleResult<Option<PathBuf>> {
        if !self.has(Capability::ResolveConfigFile) {
            return Ok(None);
        }
        self.module.resolve_config_file(path).await
    }
}

impl std::fmt::Debug for FormatterModuleHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatterModuleHandle")
            .field("origin", &self.origin)
            .field("version", &self.version)
            .field("path", &self.path)
            .field("capabilities", &self.module.capabilities())
            .finish()
    }
}
