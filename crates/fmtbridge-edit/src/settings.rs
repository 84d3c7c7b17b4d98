//! Editor-level settings
//!
//! Settings are a flat camelCase key/value object, the same shape the editor
//! keeps under its `prettier` section. They can be loaded from YAML or JSON
//! files and are served to the pipeline through [`SettingsProvider`].

use std::path::{Path, PathBuf};

use fmtbridge_module::{
    expand_setting_path, OptionMap, PackageManager, ResolveConfigOptions, ResolverSettings,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::error::{FormatError, FormatResult};

/// Ignore file name used when none is configured
pub const DEFAULT_IGNORE_PATH: &str = ".prettierignore";

/// Formatting defaults configured in the editor
///
/// Only the options that are explicitly set reach the formatter, and only
/// when the project has no configuration of its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorDefaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub print_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_tabs: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semi: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single_quote: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsx_single_quote: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_props: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailing_comma: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bracket_spacing: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bracket_same_line: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrow_parens: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prose_wrap: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_of_line: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_whitespace_sensitivity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedded_language_formatting: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vue_indent_script_and_style: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single_attribute_per_line: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experimental_ternaries: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert_pragma: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_pragma: Option<bool>,
}

impl EditorDefaults {
    /// The explicitly set defaults as formatter options
    pub fn to_options(&self) -> OptionMap {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map.into_iter().collect(),
            _ => OptionMap::new(),
        }
    }
}

/// Settings for the formatting pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Changing this takes effect only after a restart
    pub enable: bool,
    /// Language identifiers never formatted
    pub disable_languages: Vec<String>,
    /// Never fall back to the bundled formatter
    pub only_use_local_version: bool,
    /// Skip files without project configuration
    pub require_config: bool,
    /// Ignore file location; `null` disables ignore files
    pub ignore_path: Option<String>,
    /// Extra glob patterns, relative to the workspace root, to format
    pub document_selectors: Vec<String>,
    pub formatter_priority: i32,
    pub use_editor_config: bool,
    pub with_node_modules: bool,
    pub resolve_global_modules: bool,
    pub package_manager: PackageManager,
    /// Explicit formatter package directory
    pub prettier_path: Option<String>,
    /// Explicit configuration file, bypassing discovery
    pub config_path: Option<String>,
    pub status_item_text: String,
    #[serde(flatten)]
    pub defaults: EditorDefaults,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            enable: true,
            disable_languages: Vec::new(),
            only_use_local_version: false,
            require_config: false,
            ignore_path: Some(DEFAULT_IGNORE_PATH.to_string()),
            document_selectors: Vec::new(),
            formatter_priority: 1,
            use_editor_config: true,
            with_node_modules: false,
            resolve_global_modules: false,
            package_manager: PackageManager::default(),
            prettier_path: None,
            config_path: None,
            status_item_text: "Prettier".to_string(),
            defaults: EditorDefaults::default(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML or JSON file, chosen by extension
    pub async fn load_from_file(path: &Path) -> FormatResult<Settings> {
        debug!("Loading settings from {}", path.display());
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            FormatError::settings(format!(
                "Failed to read settings file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let settings: Settings = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            Some("json") => serde_json::from_str(&content)?,
            _ => {
                return Err(FormatError::settings(
                    "Unsupported settings file format. Use .yaml, .yml, or .json",
                ))
            }
        };
        settings.validate()?;

        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Reject values the formatter cannot accept
    pub fn validate(&self) -> FormatResult<()> {
        if self.defaults.tab_width == Some(0) {
            return Err(FormatError::settings("tabWidth must be greater than 0"));
        }
        if self.defaults.print_width == Some(0) {
            return Err(FormatError::settings("printWidth must be greater than 0"));
        }
        Ok(())
    }

    /// Whether formatting is turned off for `language_id`
    pub fn is_language_disabled(&self, language_id: &str) -> bool {
        self.disable_languages.iter().any(|l| l == language_id)
    }

    /// Editor-level formatting defaults as formatter options
    pub fn editor_defaults(&self) -> OptionMap {
        self.defaults.to_options()
    }

    /// Module resolution settings, with `prettierPath` expanded against `root`
    pub fn resolver_settings(&self, root: Option<&Path>) -> ResolverSettings {
        ResolverSettings {
            only_use_local_version: self.only_use_local_version,
            module_path: self
                .prettier_path
                .as_deref()
                .and_then(|raw| expand_setting_path(raw, root)),
            resolve_global_modules: self.resolve_global_modules,
            package_manager: self.package_manager,
        }
    }

    /// Options for project configuration discovery
    pub fn resolve_config_options(&self, root: Option<&Path>) -> ResolveConfigOptions {
        ResolveConfigOptions {
            editorconfig: self.use_editor_config,
            config: self
                .config_path
                .as_deref()
                .and_then(|raw| expand_setting_path(raw, root)),
        }
    }

    /// Configured ignore file expanded against `root`, with whether it is the default
    pub fn ignore_file(&self, root: Option<&Path>) -> Option<(PathBuf, bool)> {
        let raw = self.ignore_path.as_deref()?;
        let path = expand_setting_path(raw, root)?;
        Some((path, raw.trim() == DEFAULT_IGNORE_PATH))
    }
}

/// Source of settings, optionally scoped to a document
pub trait SettingsProvider: Send + Sync {
    fn settings(&self, scope: Option<&Url>) -> Settings;
}

/// Settings shared by every scope, replaceable at runtime
#[derive(Debug, Default)]
pub struct StaticSettings {
    settings: RwLock<Settings>,
}

impl StaticSettings {
    pub fn new(settings: Settings) -> Self {
        StaticSettings {
            settings: RwLock::new(settings),
        }
    }

    /// Replace the settings, returning the previous value
    pub fn replace(&self, settings: Settings) -> Settings {
        std::mem::replace(&mut *self.settings.write(), settings)
    }
}

impl SettingsProvider for StaticSettings {
    fn settings(&self, _scope: Option<&Url>) -> Settings {
        self.settings.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert!(settings.enable);
        assert_eq!(settings.ignore_path.as_deref(), Some(".prettierignore"));
        assert_eq!(settings.formatter_priority, 1);
        assert!(settings.use_editor_config);
        assert!(settings.editor_defaults().is_empty());
    }

    #[test]
    fn test_null_ignore_path_disables_ignore_file() {
        let settings: Settings = serde_json::from_str(r#"{"ignorePath": null}"#).unwrap();
        assert!(settings.ignore_file(Some(Path::new("/ws"))).is_none());
    }

    #[test]
    fn test_only_set_defaults_become_options() {
        let settings: Settings =
            serde_json::from_str(r#"{"semi": false, "tabWidth": 4, "requireConfig": true}"#).unwrap();
        let options = settings.editor_defaults();
        assert_eq!(options.len(), 2);
        assert_eq!(options.get("semi"), Some(&Value::Bool(false)));
        assert_eq!(options.get("tabWidth"), Some(&Value::from(4)));
        assert!(settings.require_config);
    }

    #[test]
    fn test_paths_expand_against_root() {
        let settings = Settings {
            prettier_path: Some("tools/prettier".into()),
            config_path: Some("/etc/prettierrc.json".into()),
            ..Default::default()
        };
        let root = Path::new("/ws");
        assert_eq!(
            settings.resolver_settings(Some(root)).module_path,
            Some(PathBuf::from("/ws/tools/prettier"))
        );
        assert_eq!(
            settings.resolve_config_options(Some(root)).config,
            Some(PathBuf::from("/etc/prettierrc.json"))
        );
        assert_eq!(
            settings.ignore_file(Some(root)),
            Some((PathBuf::from("/ws/.prettierignore"), true))
        );
        assert!(settings.ignore_file(None).is_none());
    }

    #[tokio::test]
    async fn test_load_yaml_and_json() {
        let temp = TempDir::new().unwrap();
        let yaml = temp.path().join("settings.yaml");
        fs::write(&yaml, "onlyUseLocalVersion: true\nsingleQuote: true\npackageManager: pnpm\n").unwrap();
        let loaded = Settings::load_from_file(&yaml).await.unwrap();
        assert!(loaded.only_use_local_version);
        assert_eq!(loaded.defaults.single_quote, Some(true));
        assert_eq!(loaded.package_manager, PackageManager::Pnpm);

        let json = temp.path().join("settings.json");
        fs::write(&json, r#"{"disableLanguages": ["markdown"]}"#).unwrap();
        let loaded = Settings::load_from_file(&json).await.unwrap();
        assert!(loaded.is_language_disabled("markdown"));
    }

    #[tokio::test]
    async fn test_load_rejects_unknown_format_and_invalid_values() {
        let temp = TempDir::new().unwrap();
        let toml = temp.path().join("settings.toml");
        fs::write(&toml, "semi = true").unwrap();
        assert!(matches!(
            Settings::load_from_file(&toml).await,
            Err(FormatError::Settings(_))
        ));

        let bad = temp.path().join("bad.json");
        fs::write(&bad, r#"{"tabWidth": 0}"#).unwrap();
        assert!(matches!(
            Settings::load_from_file(&bad).await,
            Err(FormatError::Settings(_))
        ));
    }

    #[test]
    fn test_static_settings_replace() {
        let provider = StaticSettings::new(Settings::default());
        let previous = provider.replace(Settings {
            require_config: true,
            ..Default::default()
        });
        assert!(!previous.require_config);
        assert!(provider.settings(None).require_config);
    }
}
