//! Core data types shared between the formatter module and its callers

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Formatter options keyed by option name (`semi`, `tabWidth`, `parser`, ...)
pub type OptionMap = BTreeMap<String, serde_json::Value>;

/// Where a loaded formatter module came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleOrigin {
    /// Installed in the project's own dependency tree
    Local,
    /// Shipped together with the editor integration
    Bundled,
    /// Installed in the package manager's global module root
    Global,
}

impl fmt::Display for ModuleOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleOrigin::Local => write!(f, "local"),
            ModuleOrigin::Bundled => write!(f, "bundled"),
            ModuleOrigin::Global => write!(f, "global"),
        }
    }
}

/// One entry of the formatter's language-support table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportLanguage {
    /// Human readable language name
    #[serde(default)]
    pub name: String,
    /// Parsers able to handle this language, preferred first
    #[serde(default)]
    pub parsers: Vec<String>,
    /// File extensions including the leading dot
    #[serde(default)]
    pub extensions: Vec<String>,
    /// Exact file names (e.g. `.prettierrc`, `package.json`)
    #[serde(default)]
    pub filenames: Vec<String>,
    /// Editor language identifiers mapped to this language
    #[serde(default)]
    pub vscode_language_ids: Vec<String>,
    /// Group this language belongs to, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

/// Result of the formatter's `getSupportInfo` capability
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupportInfo {
    #[serde(default)]
    pub languages: Vec<SupportLanguage>,
}

/// Result of the formatter's `getFileInfo` capability
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    /// Whether the formatter's own ignore rules exclude the file
    #[serde(default)]
    pub ignored: bool,
    /// Parser inferred from the file name and project plugins
    #[serde(default)]
    pub inferred_parser: Option<String>,
}

/// Options passed to the `getFileInfo` capability
#[derive(Debug, Clone, Default)]
pub struct FileInfoOptions {
    /// Ignore file to consult
    pub ignore_path: Option<PathBuf>,
    /// Plugin names to load before inferring the parser
    pub plugins: Vec<String>,
    /// Honor project configuration when inferring the parser
    pub resolve_config: bool,
    /// Process files inside `node_modules`
    pub with_node_modules: bool,
}

/// Options passed to the `resolveConfig` capability
#[derive(Debug, Clone, Default)]
pub struct ResolveConfigOptions {
    /// Take `.editorconfig` files into account
    pub editorconfig: bool,
    /// Use this configuration file instead of searching for one
    pub config: Option<PathBuf>,
}

/// Optional capabilities a formatter module may provide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    FileInfo,
    ResolveConfig,
    ResolveConfigFile,
}

/// Set of optional capabilities advertised by a module
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub file_info: bool,
    pub resolve_config: bool,
    pub resolve_config_file: bool,
}

impl Capabilities {
    /// Every optional capability
    pub fn all() -> Self {
        Capabilities {
            file_info: true,
            resolve_config: true,
            resolve_config_file: true,
        }
    }

    /// Whether `capability` is present
    pub fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::FileInfo => self.file_info,
            Capability::ResolveConfig => self.resolve_config,
            Capability::ResolveConfigFile => self.resolve_config_file,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_support_info_deserializes_formatter_output() {
        let raw = r#"{
            "languages": [
                {
                    "name": "TypeScript",
                    "parsers": ["typescript", "babel-ts"],
                    "extensions": [".ts", ".cts", ".mts"],
                    "vscodeLanguageIds": ["typescript"],
                    "tmScope": "source.ts"
                }
            ],
            "options": []
        }"#;

        let info: SupportInfo = serde_json::from_str(raw).unwrap();
        assert_eq!(info.languages.len(), 1);
        assert_eq!(info.languages[0].parsers[0], "typescript");
        assert_eq!(info.languages[0].vscode_language_ids, vec!["typescript"]);
        assert!(info.languages[0].filenames.is_empty());
    }

    #[test]
    fn test_file_info_null_parser() {
        let info: FileInfo =
            serde_json::from_str(r#"{"ignored": false, "inferredParser": null}"#).unwrap();
        assert!(!info.ignored);
        assert!(info.inferred_parser.is_none());
    }

    #[test]
    fn test_capabilities_lookup() {
        let caps = Capabilities {
            file_info: true,
            ..Default::default()
        };
        assert!(caps.has(Capability::FileInfo));
        assert!(!caps.has(Capability::ResolveConfig));
        assert!(Capabilities::all().has(Capability::ResolveConfigFile));
    }

    #[test]
    fn test_origin_display() {
        assert_eq!(ModuleOrigin::Bundled.to_string(), "bundled");
    }
}
