//! Module resolution and the per-project handle cache

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::error::{ModuleError, ModuleResult};
use crate::global::{find_global_install, PackageManager};
use crate::install::{find_local_install, project_root, read_install};
use crate::module::{FormatterModuleHandle, ModuleInstall, ModuleLoader};
use crate::types::ModuleOrigin;

/// Package name of the formatter
pub const DEFAULT_PACKAGE: &str = "prettier";

/// Settings that influence module resolution
#[derive(Debug, Clone, Default)]
pub struct ResolverSettings {
    /// Never fall back to the bundled module
    pub only_use_local_version: bool,
    /// Explicit module directory, already expanded
    pub module_path: Option<PathBuf>,
    /// Let [`ModuleResolver::resolve_global`] look at global installs
    pub resolve_global_modules: bool,
    pub package_manager: PackageManager,
}

/// Resolves and caches formatter module handles
///
/// Local installs are found by searching upward from the document. Results
/// (including "not found") are cached per project root until that root is
/// invalidated.
pub struct ModuleResolver {
    package: String,
    loader: Arc<dyn ModuleLoader>,
    bundled: Option<ModuleInstall>,
    bundled_handle: RwLock<Option<FormatterModuleHandle>>,
    cache: RwLock<HashMap<PathBuf, Option<FormatterModuleHandle>>>,
    global: RwLock<Option<Option<FormatterModuleHandle>>>,
}

impl ModuleResolver {
    /// Create a resolver with an optional bundled fallback
    pub fn new(loader: Arc<dyn ModuleLoader>, bundled: Option<ModuleInstall>) -> Self {
        ModuleResolver {
            package: DEFAULT_PACKAGE.to_string(),
            loader,
            bundled,
            bundled_handle: RwLock::new(None),
            cache: RwLock::new(HashMap::new()),
            global: RwLock::new(None),
        }
    }

    /// Resolve a different package name
    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = package.into();
        self
    }

    /// Cache key used for `path`
    pub fn cache_key(path: &Path) -> PathBuf {
        project_root(path)
    }

    /// Formatter module for the document at `path`
    pub async fn resolve(
        &self,
        path: &Path,
        settings: &ResolverSettings,
    ) -> Option<FormatterModuleHandle> {
        let key = Self::cache_key(path);
        if let Some(cached) = self.get(&key).await {
            return cached;
        }

        let resolved = self.resolve_uncached(path, settings).await;
        match &resolved {
            Some(handle) => info!(
                root = %key.display(),
                origin = %handle.origin(),
                "Using formatter module from {}",
                handle.path().display()
            ),
            None => error!(
                root = %key.display(),
                only_local = settings.only_use_local_version,
                "Formatter module not found"
            ),
        }

        self.cache.write().await.insert(key, resolved.clone());
        resolved
    }

    /// Cached resolution for a project root, if one is present
    pub async fn get(&self, root: &Path) -> Option<Option<FormatterModuleHandle>> {
        self.cache.read().await.get(root).cloned()
    }

    async fn resolve_uncached(
        &self,
        path: &Path,
        settings: &ResolverSettings,
    ) -> Option<FormatterModuleHandle> {
        let start = if path.is_dir() {
            path
        } else {
            path.parent().unwrap_or(path)
        };

        let local = match &settings.module_path {
            Some(dir) => read_install(dir, &self.package, ModuleOrigin::Local)
                .await
                .map(Some),
            None => find_local_install(start, &self.package).await,
        };

        match local {
            Ok(Some(install)) => match self.load(&install).await {
                Ok(handle) => return Some(handle),
                Err(e) => error!(
                    "Failed to load {} from {}: {}",
                    self.package,
                    install.path.display(),
                    e
                ),
            },
            Ok(None) => debug!("No local {} install above {}", self.package, start.display()),
            Err(e) => error!("Failed to locate local {}: {}", self.package, e),
        }

        if settings.only_use_local_version {
            warn!(
                "Local {} required but not resolvable, not using the bundled version",
                self.package
            );
            return None;
        }
        self.bundled().await
    }

    /// Fallback module used when no workspace is open
    ///
    /// Resolved once and kept until [`ModuleResolver::invalidate_global`].
    pub async fn resolve_global(&self, settings: &ResolverSettings) -> Option<FormatterModuleHandle> {
        if let Some(cached) = self.global.read().await.clone() {
            return cached;
        }

        let mut resolved = None;
        if settings.resolve_global_modules {
            match find_global_install(settings.package_manager, &self.package).await {
                Ok(Some(install)) => match self.load(&install).await {
                    Ok(handle) => resolved = Some(handle),
                    Err(e) => error!("Failed to load global {}: {}", self.package, e),
                },
                Ok(None) => debug!(
                    "No global {} install via {}",
                    self.package,
                    settings.package_manager.command()
                ),
                Err(e) => warn!("Failed to look up global modules: {}", e),
            }
        }
        if resolved.is_none() {
            resolved = self.bundled().await;
        }

        *self.global.write().await = Some(resolved.clone());
        resolved
    }

    async fn bundled(&self) -> Option<FormatterModuleHandle> {
        if let Some(handle) = self.bundled_handle.read().await.clone() {
            return Some(handle);
        }

        let install = self.bundled.as_ref()?;
        match self.load(install).await {
            Ok(handle) => {
                *self.bundled_handle.write().await = Some(handle.clone());
                Some(handle)
            }
            Err(e) => {
                error!("Failed to load bundled {}: {}", self.package, e);
                None
            }
        }
    }

    async fn load(&self, install: &ModuleInstall) -> ModuleResult<FormatterModuleHandle> {
        let module = self.loader.load(install).await?;
        Ok(FormatterModuleHandle::new(install, module))
    }

    /// Drop the cached resolution for one project root
    pub async fn invalidate(&self, root: &Path) {
        if self.cache.write().await.remove(root).is_some() {
            debug!("Invalidated formatter module cache for {}", root.display());
        }
    }

    /// Drop cached resolutions for `dir` and every directory below it
    ///
    /// A manifest created or removed in `dir` can change the project root of
    /// any document underneath.
    pub async fn invalidate_tree(&self, dir: &Path) {
        let mut cache = self.cache.write().await;
        let before = cache.len();
        cache.retain(|root, _| !root.starts_with(dir));
        debug!(
            "Invalidated {} formatter module cache entries under {}",
            before - cache.len(),
            dir.display()
        );
    }

    /// Drop every cached resolution, including the global one
    pub async fn invalidate_all(&self) {
        self.cache.write().await.clear();
        *self.bundled_handle.write().await = None;
        self.invalidate_global().await;
        debug!("Invalidated all formatter module caches");
    }

    pub async fn invalidate_global(&self) {
        *self.global.write().await = None;
    }

    /// Resolve or report why nothing is available
    pub async fn require(
        &self,
        path: &Path,
        settings: &ResolverSettings,
    ) -> ModuleResult<FormatterModuleHandle> {
        self.resolve(path, settings).await.ok_or_else(|| {
            ModuleError::not_found(format!(
                "{} (onlyUseLocalVersion: {})",
                self.package, settings.only_use_local_version
            ))
        })
    }
}
