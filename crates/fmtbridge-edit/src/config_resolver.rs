//! Effective formatter options for one format call
//!
//! Three layers are merged: editor defaults, the project's configuration file,
//! and explicit caller overrides. Editor defaults apply only when the project
//! has no configuration at all, so they never dilute explicit project intent.

use std::collections::BTreeMap;
use std::ops::Range;
use std::path::{Path, PathBuf};

use fmtbridge_module::{
    resolve_project_config, Capability, FormatterModuleHandle, ModuleResult, OptionMap,
};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::FormatError;
use crate::settings::Settings;

/// Where an option value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provenance {
    Override,
    ProjectFile,
    EditorDefault,
}

/// Options for one format operation, with the source of each
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedConfig {
    options: OptionMap,
    provenance: BTreeMap<String, Provenance>,
    has_project_config: bool,
}

impl ResolvedConfig {
    pub fn options(&self) -> &OptionMap {
        &self.options
    }

    pub fn into_options(self) -> OptionMap {
        self.options
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    pub fn provenance(&self, key: &str) -> Option<Provenance> {
        self.provenance.get(key).copied()
    }

    pub fn has_project_config(&self) -> bool {
        self.has_project_config
    }

    fn layer(&mut self, options: &OptionMap, provenance: Provenance) {
        for (key, value) in options {
            self.set(key, value.clone(), provenance);
        }
    }

    fn set(&mut self, key: &str, value: Value, provenance: Provenance) {
        self.options.insert(key.to_string(), value);
        self.provenance.insert(key.to_string(), provenance);
    }
}

/// Result of project configuration lookup for a document
#[derive(Debug)]
pub enum ProjectConfig {
    /// Configuration was found
    Found(OptionMap),
    /// No configuration applies
    Missing,
    /// `requireConfig` is set and nothing was found
    Disabled,
    /// Discovery failed
    Failed(FormatError),
}

impl ProjectConfig {
    /// Options when found
    pub fn options(&self) -> Option<&OptionMap> {
        match self {
            ProjectConfig::Found(options) => Some(options),
            _ => None,
        }
    }

    /// String plugin names declared by the project
    pub fn plugins(&self) -> Vec<String> {
        plugin_names(self.options())
    }
}

/// Outcome of [`ConfigResolver::resolve`]
#[derive(Debug)]
pub enum ConfigResolution {
    Resolved(ResolvedConfig),
    Error(FormatError),
    Disabled,
}

/// Per-request inputs to option merging
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub parser: String,
    pub filepath: Option<PathBuf>,
    /// Range to format in UTF-16 code units
    pub range: Option<Range<usize>>,
    /// Clear `requirePragma`
    pub force: bool,
}

/// Builds [`ResolvedConfig`]s; never caches
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigResolver;

impl ConfigResolver {
    /// Look up the project configuration for `path`
    ///
    /// Uses the module's own discovery when it has one, native discovery
    /// otherwise.
    pub async fn load_project(
        &self,
        handle: &FormatterModuleHandle,
        path: Option<&Path>,
        settings: &Settings,
        root: Option<&Path>,
    ) -> ProjectConfig {
        let found = match path {
            Some(path) => match discover(handle, path, settings, root).await {
                Ok(found) => found,
                Err(e) => {
                    return ProjectConfig::Failed(FormatError::config_failed(path, e.to_string()))
                }
            },
            None => None,
        };

        match found {
            Some(options) => {
                info!("Detected project configuration, editor defaults will not be used");
                ProjectConfig::Found(options)
            }
            None if settings.require_config => {
                info!("Require config set to true and no config present. Skipping file.");
                ProjectConfig::Disabled
            }
            None => {
                info!("No project configuration detected, falling back to editor defaults");
                ProjectConfig::Missing
            }
        }
    }

    /// Merge the layers into the effective options
    ///
    /// Order, later wins: editor defaults (only without project config),
    /// range, project file, parser and file path, caller overrides. A forced
    /// request then clears `requirePragma`.
    pub fn merge(
        &self,
        project: Option<&OptionMap>,
        editor_defaults: &OptionMap,
        request: &RequestOptions,
        overrides: &OptionMap,
    ) -> ResolvedConfig {
        let mut resolved = ResolvedConfig {
            has_project_config: project.is_some(),
            ..Default::default()
        };

        if project.is_none() {
            resolved.layer(editor_defaults, Provenance::EditorDefault);
        }
        if let Some(range) = &request.range {
            resolved.set("rangeStart", Value::from(range.start), Provenance::Override);
            resolved.set("rangeEnd", Value::from(range.end), Provenance::Override);
        }
        if let Some(project) = project {
            resolved.layer(project, Provenance::ProjectFile);
        }
        resolved.set("parser", Value::String(request.parser.clone()), Provenance::Override);
        if let Some(filepath) = &request.filepath {
            resolved.set(
                "filepath",
                Value::String(filepath.display().to_string()),
                Provenance::Override,
            );
        }
        resolved.layer(overrides, Provenance::Override);

        if request.force && resolved.get("requirePragma") == Some(&Value::Bool(true)) {
            resolved.options.insert("requirePragma".into(), Value::Bool(false));
        }

        debug!(options = ?resolved.options, "Resolved formatter options");
        resolved
    }

    /// Load and merge in one step
    pub async fn resolve(
        &self,
        handle: &FormatterModuleHandle,
        path: Option<&Path>,
        settings: &Settings,
        root: Option<&Path>,
        request: &RequestOptions,
        overrides: &OptionMap,
    ) -> ConfigResolution {
        match self.load_project(handle, path, settings, root).await {
            ProjectConfig::Failed(e) => ConfigResolution::Error(e),
            ProjectConfig::Disabled => ConfigResolution::Disabled,
            project => ConfigResolution::Resolved(self.merge(
                project.options(),
                &settings.editor_defaults(),
                request,
                overrides,
            )),
        }
    }
}

async fn discover(
    handle: &FormatterModuleHandle,
    path: &Path,
    settings: &Settings,
    root: Option<&Path>,
) -> ModuleResult<Option<OptionMap>> {
    let options = settings.resolve_config_options(root);
    if handle.has(Capability::ResolveConfig) {
        handle.resolve_config(path, &options).await
    } else {
        resolve_project_config(path, &options).await
    }
}

/// Plugin names in `options`, skipping non-string entries
pub fn plugin_names(options: Option<&OptionMap>) -> Vec<String> {
    match options.and_then(|o| o.get("plugins")) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}
