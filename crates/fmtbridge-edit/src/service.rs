//! The format service
//!
//! [`FormatService`] runs one format request end to end: module resolution,
//! project configuration, ignore checks, parser selection, option merging and
//! the formatter call. Public entry points never fail; every attempt ends in
//! text or an edit result plus a status update.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use fmtbridge_module::{
    watched_config_files, Capability, FileInfo, FileInfoOptions, FormatterModuleHandle,
    ModuleResolver, OptionMap,
};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config_resolver::{plugin_names, ConfigResolver, ProjectConfig, RequestOptions};
use crate::document::{Range, TextDocument};
use crate::edit::{EditComputer, EditMode, EditResult};
use crate::error::{annotate_with_path, FormatError, FormatResult};
use crate::ignore_file::IgnoreMatcherCache;
use crate::parser::ParserSelector;
use crate::registration::{ProviderRegistrar, RegistrationCache, WorkspaceRegistration};
use crate::selector::build_selectors;
use crate::settings::{Settings, SettingsProvider};
use crate::status::{FormatterStatus, Readiness, StatusSink};
use crate::watch::{FileWatcher, WatchEvent, WatchPattern, WatchSubscription};
use crate::workspace::WorkspaceFolders;

/// One formatting request
#[derive(Debug, Clone)]
pub struct FormatRequest {
    pub document: TextDocument,
    /// Byte range to format
    pub range: Option<std::ops::Range<usize>>,
    /// Bypass ignore checks and the pragma gate
    pub force: bool,
    /// Options that win over every other layer
    pub overrides: OptionMap,
}

impl FormatRequest {
    pub fn new(document: TextDocument) -> Self {
        FormatRequest {
            document,
            range: None,
            force: false,
            overrides: OptionMap::new(),
        }
    }

    pub fn with_range(mut self, range: std::ops::Range<usize>) -> Self {
        self.range = Some(range);
        self
    }

    pub fn forced(mut self) -> Self {
        self.force = true;
        self
    }

    pub fn with_overrides(mut self, overrides: OptionMap) -> Self {
        self.overrides = overrides;
        self
    }
}

enum Outcome {
    Formatted { text: String, config_failed: bool },
    Skipped(FormatterStatus),
}

/// Editor-facing formatting pipeline
pub struct FormatService {
    resolver: Arc<ModuleResolver>,
    ignore: Arc<IgnoreMatcherCache>,
    registrations: RegistrationCache,
    settings: Arc<dyn SettingsProvider>,
    workspace: WorkspaceFolders,
    status: Arc<dyn StatusSink>,
    watcher: Mutex<Option<Arc<dyn FileWatcher>>>,
    watched_ignore_files: Mutex<HashSet<PathBuf>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl FormatService {
    pub fn new(
        resolver: Arc<ModuleResolver>,
        settings: Arc<dyn SettingsProvider>,
        registrar: Arc<dyn ProviderRegistrar>,
        status: Arc<dyn StatusSink>,
    ) -> Self {
        FormatService {
            resolver,
            ignore: Arc::new(IgnoreMatcherCache::new()),
            registrations: RegistrationCache::new(registrar),
            settings,
            workspace: WorkspaceFolders::default(),
            status,
            watcher: Mutex::new(None),
            watched_ignore_files: Mutex::new(HashSet::new()),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Use `folders` as the open workspace folders
    pub fn with_workspace_folders(mut self, folders: impl IntoIterator<Item = PathBuf>) -> Self {
        self.workspace = WorkspaceFolders::new(folders);
        self
    }

    pub fn workspace(&self) -> &WorkspaceFolders {
        &self.workspace
    }

    pub fn resolver(&self) -> &ModuleResolver {
        &self.resolver
    }

    pub fn ignore_cache(&self) -> &IgnoreMatcherCache {
        &self.ignore
    }

    pub fn registrations(&self) -> &RegistrationCache {
        &self.registrations
    }

    /// Format the request, returning the original text when nothing was formatted
    pub async fn format(&self, request: &FormatRequest) -> String {
        self.execute(request)
            .await
            .unwrap_or_else(|| request.document.text.clone())
    }

    /// Minimal edit for formatting the whole document
    ///
    /// Documents outside the active selectors get a no-op so that other
    /// formatters can be tried.
    pub async fn provide_full_document_edits(&self, document: &TextDocument) -> EditResult {
        let registration = self.registration_for(document).await;
        if !registration.map_or(false, |r| r.selectors.score(document) > 0) {
            debug!(uri = %document.uri, "Document not matched by formatter selectors");
            return EditResult::NoOp;
        }

        let request = FormatRequest::new(document.clone());
        self.edits(&request, EditMode::Minimal).await
    }

    /// Full-document replacement after formatting `range`
    pub async fn provide_range_edits(&self, document: &TextDocument, range: Range) -> EditResult {
        let registration = self.registration_for(document).await;
        if !registration.map_or(false, |r| r.selectors.range_score(document) > 0) {
            debug!(uri = %document.uri, "Document not matched by range selectors");
            return EditResult::NoOp;
        }

        let start = document.offset_at(range.start);
        let end = document.offset_at(range.end);
        let request = FormatRequest::new(document.clone()).with_range(start..end);
        self.edits(&request, EditMode::FullDocument).await
    }

    /// Format regardless of ignore files and pragma requirements
    pub async fn force_format(&self, document: &TextDocument) -> EditResult {
        info!("Forced formatting will not use ignore files.");
        let request = FormatRequest::new(document.clone()).forced();
        self.edits(&request, EditMode::FullDocument).await
    }

    async fn edits(&self, request: &FormatRequest, mode: EditMode) -> EditResult {
        match self.execute(request).await {
            Some(formatted) => EditComputer.compute(&request.document, &formatted, mode),
            None => EditResult::NoOp,
        }
    }

    async fn execute(&self, request: &FormatRequest) -> Option<String> {
        let started = Instant::now();
        info!("Formatting {}", request.document.uri);

        match self.run(request).await {
            Ok(Outcome::Formatted {
                text,
                config_failed,
            }) => {
                info!("Formatting completed in {}ms.", started.elapsed().as_millis());
                self.status.update(if config_failed {
                    FormatterStatus::Warn
                } else {
                    FormatterStatus::Success
                });
                Some(text)
            }
            Ok(Outcome::Skipped(status)) => {
                self.status.update(status);
                None
            }
            Err(e) => {
                match &e {
                    FormatError::ConfigRequiredMissing(_) => info!("{}", e),
                    _ => error!("{}", e),
                }
                self.status.update(e.status());
                None
            }
        }
    }

    async fn run(&self, request: &FormatRequest) -> FormatResult<Outcome> {
        let document = &request.document;
        let settings = self.settings.settings(Some(&document.uri));
        if !request.force && settings.is_language_disabled(&document.language_id) {
            info!("Formatting disabled for language {}", document.language_id);
            return Ok(Outcome::Skipped(FormatterStatus::Disabled));
        }

        let path = document.fs_path();
        let root = path.as_deref().and_then(|p| self.workspace.folder_for(p));
        let handle = self
            .module_for(path.as_deref(), root.as_deref(), &settings)
            .await
            .ok_or(FormatError::ModuleNotFound {
                only_local: settings.only_use_local_version,
            })?;

        let mut config_failed = false;
        let project = match ConfigResolver
            .load_project(&handle, path.as_deref(), &settings, root.as_deref())
            .await
        {
            ProjectConfig::Disabled => {
                let target = path.clone().unwrap_or_else(|| PathBuf::from(document.uri.as_str()));
                return Err(FormatError::ConfigRequiredMissing(target));
            }
            ProjectConfig::Failed(e) => {
                error!("{}", e);
                self.status.update(FormatterStatus::Error);
                config_failed = true;
                None
            }
            ProjectConfig::Found(options) => Some(options),
            ProjectConfig::Missing => None,
        };
        let plugins = plugin_names(project.as_ref());

        let mut file_info = None;
        if let Some(path) = path.as_deref() {
            let ignore_file = settings.ignore_file(root.as_deref());
            if let Some((ignore_file, is_default)) = &ignore_file {
                self.watch_ignore_file(ignore_file);
                if !request.force && self.ignore.is_ignored(path, ignore_file, *is_default).await {
                    info!("File is ignored, skipping.");
                    return Ok(Outcome::Skipped(FormatterStatus::Ignored));
                }
            }

            file_info = self
                .file_info(&handle, path, &settings, ignore_file.map(|(f, _)| f), &plugins)
                .await;
            if !request.force && file_info.as_ref().map_or(false, |info| info.ignored) {
                info!("File is ignored, skipping.");
                return Ok(Outcome::Skipped(FormatterStatus::Ignored));
            }
        }

        let parser = ParserSelector
            .select(
                &handle,
                path.as_deref(),
                &document.language_id,
                file_info.as_ref(),
                &plugins,
            )
            .await?;

        let resolved = ConfigResolver.merge(
            project.as_ref(),
            &settings.editor_defaults(),
            &RequestOptions {
                parser,
                filepath: path.clone(),
                range: request
                    .range
                    .as_ref()
                    .map(|r| document.utf16_offset(r.start)..document.utf16_offset(r.end)),
                force: request.force,
            },
            &request.overrides,
        );
        debug!(options = ?resolved.options(), "Formatter options");

        let text = handle
            .format(&document.text, resolved.options())
            .await
            .map_err(|e| {
                let message = e.to_string();
                FormatError::FormatInvocationFailed(match path.as_deref() {
                    Some(path) => annotate_with_path(&message, path),
                    None => message,
                })
            })?;

        Ok(Outcome::Formatted {
            text,
            config_failed,
        })
    }

    async fn module_for(
        &self,
        path: Option<&Path>,
        root: Option<&Path>,
        settings: &Settings,
    ) -> Option<FormatterModuleHandle> {
        let resolver_settings = settings.resolver_settings(root);
        match path {
            Some(path) => self.resolver.resolve(path, &resolver_settings).await,
            None => self.resolver.resolve_global(&resolver_settings).await,
        }
    }

    async fn file_info(
        &self,
        handle: &FormatterModuleHandle,
        path: &Path,
        settings: &Settings,
        ignore_path: Option<PathBuf>,
        plugins: &[String],
    ) -> Option<FileInfo> {
        let options = FileInfoOptions {
            ignore_path,
            plugins: plugins.to_vec(),
            resolve_config: true,
            with_node_modules: settings.with_node_modules,
        };
        match handle.file_info(path, &options).await {
            Ok(info) => {
                debug!(?info, "File info");
                info
            }
            Err(e) => {
                warn!("File info unavailable for {}: {}", path.display(), e);
                None
            }
        }
    }

    async fn registration_for(&self, document: &TextDocument) -> Option<Arc<WorkspaceRegistration>> {
        let root = document
            .fs_path()
            .and_then(|path| self.workspace.folder_for(&path));
        self.ensure_registered(root.as_deref(), Some(document)).await
    }

    /// Registration for `root`, creating it on first use
    ///
    /// `None` for `root` is the global registration. Returns `None`, with an
    /// error status, when no formatter module can be resolved.
    pub async fn ensure_registered(
        &self,
        root: Option<&Path>,
        document: Option<&TextDocument>,
    ) -> Option<Arc<WorkspaceRegistration>> {
        if let Some(registration) = self.registrations.get(root).await {
            return Some(registration);
        }

        let settings = self.settings.settings(document.map(|d| &d.uri));
        let Some(handle) = self.module_for(root, root, &settings).await else {
            let e = FormatError::ModuleNotFound {
                only_local: settings.only_use_local_version,
            };
            error!("{}", e);
            self.status.update(e.status());
            return None;
        };

        let mut plugins = Vec::new();
        let document_path = document.and_then(|d| d.fs_path());
        if let Some(path) = document_path.as_deref() {
            // plugins are not loaded implicitly from version 3 on
            if handle.is_above_v3() && handle.has(Capability::ResolveConfig) {
                match ConfigResolver.load_project(&handle, Some(path), &settings, root).await {
                    ProjectConfig::Failed(e) => {
                        error!("{}", e);
                        self.status.update(FormatterStatus::Error);
                    }
                    ProjectConfig::Disabled => self.status.update(FormatterStatus::Disabled),
                    project => plugins = project.plugins(),
                }
            }
        }

        let info = match handle.support_info(&plugins).await {
            Ok(info) => info,
            Err(e) => {
                error!("Failed to read formatter language support: {}", e);
                self.status.update(FormatterStatus::Error);
                return None;
            }
        };
        let selectors = build_selectors(&info, root, &settings);
        debug!(?selectors, "Formatter selectors");
        Some(
            self.registrations
                .register(root, selectors, settings.formatter_priority)
                .await,
        )
    }

    /// Register the global formatter used outside any workspace
    pub async fn register_global(&self) -> Option<Arc<WorkspaceRegistration>> {
        self.ensure_registered(None, None).await
    }

    /// Readiness of the active document, also shown on the status surface
    ///
    /// Returns `None` and hides the status when there is no active file
    /// document. Without a formatter for it the error status stays shown.
    pub async fn handle_active_document(&self, document: Option<&TextDocument>) -> Option<Readiness> {
        let Some(path) = document.and_then(|d| d.fs_path()) else {
            self.status.hide();
            return None;
        };
        let document = document?;

        let settings = self.settings.settings(Some(&document.uri));
        let readiness = if settings.is_language_disabled(&document.language_id) {
            Readiness::Disabled
        } else {
            let root = self.workspace.folder_for(&path);
            let Some(registration) = self.ensure_registered(root.as_deref(), Some(document)).await
            else {
                return None;
            };

            let ignored = match settings.ignore_file(root.as_deref()) {
                Some((ignore_file, is_default)) => {
                    self.watch_ignore_file(&ignore_file);
                    self.ignore.is_ignored(&path, &ignore_file, is_default).await
                }
                None => false,
            };
            if ignored {
                Readiness::Ignored
            } else if registration.selectors.score(document) > 0 {
                Readiness::Ready
            } else {
                Readiness::Disabled
            }
        };

        self.status.update(readiness.status());
        Some(readiness)
    }

    /// Subscribe to manifest and formatter configuration changes
    ///
    /// Ignore files are subscribed lazily as they are first used. Tasks hold
    /// a weak reference and end when the service is dropped.
    pub fn register_watchers(self: &Arc<Self>, watcher: Arc<dyn FileWatcher>) -> FormatResult<()> {
        let manifests = watcher.watch(WatchPattern::glob("**/package.json")?)?;
        let configs = watcher.watch(WatchPattern::file_names(&watched_config_files())?)?;
        *self.watcher.lock() = Some(watcher);

        let weak = Arc::downgrade(self);
        let manifest_task = spawn_listener(manifests, move |event| {
            let weak = weak.clone();
            async move {
                if let Some(service) = weak.upgrade() {
                    service.on_manifest_event(&event).await;
                }
            }
        });

        let weak = Arc::downgrade(self);
        let config_task = spawn_listener(configs, move |event| {
            let weak = weak.clone();
            async move {
                if let Some(service) = weak.upgrade() {
                    service.on_config_file_event(&event).await;
                }
            }
        });

        self.tasks.lock().extend([manifest_task, config_task]);
        Ok(())
    }

    fn watch_ignore_file(&self, ignore_file: &Path) {
        let Some(watcher) = self.watcher.lock().clone() else {
            return;
        };
        if !self.watched_ignore_files.lock().insert(ignore_file.to_path_buf()) {
            return;
        }

        match watcher.watch(WatchPattern::path(ignore_file)) {
            Ok(subscription) => {
                let cache = Arc::clone(&self.ignore);
                let task = spawn_listener(subscription, move |event| {
                    let cache = Arc::clone(&cache);
                    async move { cache.handle_event(&event).await }
                });
                self.tasks.lock().push(task);
            }
            Err(e) => warn!("Cannot watch ignore file {}: {}", ignore_file.display(), e),
        }
    }

    /// A package manifest was created, changed or deleted
    pub async fn on_manifest_event(&self, event: &WatchEvent) {
        debug!(kind = ?event.kind, path = %event.path.display(), "Package manifest changed");
        if let Some(dir) = event.path.parent() {
            self.resolver.invalidate_tree(dir).await;
        }
        self.reset_registration(&event.path).await;
    }

    /// A formatter configuration file was created, changed or deleted
    pub async fn on_config_file_event(&self, event: &WatchEvent) {
        debug!(kind = ?event.kind, path = %event.path.display(), "Formatter configuration changed");
        self.reset_registration(&event.path).await;
    }

    async fn reset_registration(&self, changed: &Path) {
        let root = self.workspace.folder_for(changed);
        self.registrations.invalidate(root.as_deref()).await;
        self.status.update(FormatterStatus::Ready);
    }

    /// Apply a settings change
    ///
    /// `enable` takes effect only after a restart. Any other change drops
    /// every registration and cached module.
    pub async fn on_settings_changed(&self, previous: &Settings, current: &Settings) {
        if previous.enable != current.enable {
            warn!("Changing the enable setting requires a restart to take effect");
        }
        let unchanged = Settings {
            enable: current.enable,
            ..previous.clone()
        } == *current;
        if unchanged {
            return;
        }

        info!("Settings changed, resetting formatters");
        self.registrations.invalidate_all().await;
        self.resolver.invalidate_all().await;
        self.status.update(FormatterStatus::Ready);
    }
}

impl Drop for FormatService {
    fn drop(&mut self) {
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
    }
}

fn spawn_listener<F, Fut>(mut subscription: WatchSubscription, handler: F) -> JoinHandle<()>
where
    F: Fn(WatchEvent) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(event) = subscription.next().await {
            handler(event).await;
        }
    })
}
