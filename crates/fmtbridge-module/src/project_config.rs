//! Project configuration discovery
//!
//! Walks up from a document looking for the formatter's configuration files,
//! parses the first one found, and applies its `overrides` for the document.

use std::path::{Path, PathBuf};

use globset::Glob;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::editorconfig::{resolve_editorconfig, EDITORCONFIG_FILE};
use crate::error::{ModuleError, ModuleResult};
use crate::install::{PackageManifest, MANIFEST_FILE};
use crate::types::{OptionMap, ResolveConfigOptions};

/// Configuration file names in lookup order within one directory
pub const CONFIG_FILES: &[&str] = &[
    MANIFEST_FILE,
    ".prettierrc",
    ".prettierrc.json",
    ".prettierrc.yaml",
    ".prettierrc.yml",
    ".prettierrc.json5",
    ".prettierrc.toml",
    ".prettierrc.js",
    ".prettierrc.cjs",
    ".prettierrc.mjs",
    "prettier.config.js",
    "prettier.config.cjs",
    "prettier.config.mjs",
];

/// Every file whose change can alter the resolved configuration
pub fn watched_config_files() -> Vec<&'static str> {
    let mut files = CONFIG_FILES.to_vec();
    files.push(EDITORCONFIG_FILE);
    files
}

#[derive(Debug, Default, Deserialize)]
#[serde(untagged)]
enum Patterns {
    #[default]
    None,
    One(String),
    Many(Vec<String>),
}

impl Patterns {
    fn iter(&self) -> impl Iterator<Item = &str> {
        let items: Vec<&str> = match self {
            Patterns::None => Vec::new(),
            Patterns::One(p) => vec![p.as_str()],
            Patterns::Many(ps) => ps.iter().map(String::as_str).collect(),
        };
        items.into_iter()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Override {
    #[serde(default)]
    files: Patterns,
    #[serde(default)]
    exclude_files: Patterns,
    #[serde(default)]
    options: OptionMap,
}

/// A parsed configuration file
#[derive(Debug, Default)]
pub struct ConfigFile {
    pub path: PathBuf,
    options: OptionMap,
    overrides: Vec<Override>,
}

impl ConfigFile {
    /// Parse `value` read from `path`
    fn from_value(path: &Path, value: Value) -> ModuleResult<Self> {
        let mut options = match value {
            Value::Object(map) => map.into_iter().collect::<OptionMap>(),
            Value::Null => OptionMap::new(),
            other => {
                return Err(ModuleError::config_discovery(
                    path,
                    format!("expected an object, found {}", other),
                ))
            }
        };

        let overrides = match options.remove("overrides") {
            Some(raw) => serde_json::from_value(raw)
                .map_err(|e| ModuleError::config_discovery(path, format!("invalid overrides: {}", e)))?,
            None => Vec::new(),
        };

        Ok(ConfigFile {
            path: path.to_path_buf(),
            options,
            overrides,
        })
    }

    /// Load and parse the configuration file at `path`
    pub async fn load(path: &Path) -> ModuleResult<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        if name == MANIFEST_FILE {
            let manifest = PackageManifest::read(path).await?;
            return match manifest.prettier {
                Some(Value::String(shared)) => Err(ModuleError::config_discovery(
                    path,
                    format!("shared configuration package '{}' cannot be loaded", shared),
                )),
                Some(value) => Self::from_value(path, value),
                None => Ok(ConfigFile {
                    path: path.to_path_buf(),
                    ..Default::default()
                }),
            };
        }

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if matches!(extension, "js" | "cjs" | "mjs") {
            return Err(ModuleError::config_discovery(
                path,
                "JavaScript configuration files cannot be evaluated",
            ));
        }

        let content = tokio::fs::read_to_string(path).await?;
        let value = match extension {
            "json" => serde_json::from_str(&content)?,
            "json5" => json5::from_str(&content)?,
            "yaml" | "yml" => serde_yaml::from_str(&content)?,
            "toml" => toml::from_str(&content)?,
            // extensionless `.prettierrc` holds JSON or YAML
            _ => match serde_json::from_str(&content) {
                Ok(value) => value,
                Err(_) => serde_yaml::from_str(&content)?,
            },
        };
        Self::from_value(path, value)
    }

    /// Options for `file`, with matching overrides applied in order
    pub fn options_for(&self, file: &Path) -> ModuleResult<OptionMap> {
        let mut options = self.options.clone();
        let base = self.path.parent().unwrap_or(Path::new(""));
        let relative = file
            .strip_prefix(base)
            .unwrap_or(file)
            .to_string_lossy()
            .replace('\\', "/");
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        for entry in &self.overrides {
            let included = any_match(&entry.files, &relative, &file_name)?;
            let excluded = any_match(&entry.exclude_files, &relative, &file_name)?;
            if included && !excluded {
                options.extend(entry.options.clone());
            }
        }
        Ok(options)
    }
}

/// Patterns without a separator match the file name at any depth
fn any_match(patterns: &Patterns, relative: &str, file_name: &str) -> ModuleResult<bool> {
    for pattern in patterns.iter() {
        let matcher = Glob::new(pattern)?.compile_matcher();
        let target = if pattern.contains('/') { relative } else { file_name };
        if matcher.is_match(target) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Nearest configuration file applying to a file in `start`
pub async fn find_config_file(start: &Path) -> ModuleResult<Option<PathBuf>> {
    for dir in start.ancestors() {
        for name in CONFIG_FILES {
            let candidate = dir.join(name);
            if !tokio::fs::try_exists(&candidate).await? {
                continue;
            }
            if *name == MANIFEST_FILE {
                // a manifest only counts when it carries formatter settings
                match PackageManifest::read(&candidate).await {
                    Ok(manifest) if manifest.prettier.is_some() => return Ok(Some(candidate)),
                    Ok(_) => continue,
                    Err(e) => {
                        debug!("Skipping unreadable {}: {}", candidate.display(), e);
                        continue;
                    }
                }
            }
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}

/// Project configuration for `file`, `None` when nothing applies
///
/// `.editorconfig` values sit beneath the formatter's own file.
pub async fn resolve_project_config(
    file: &Path,
    options: &ResolveConfigOptions,
) -> ModuleResult<Option<OptionMap>> {
    let start = file.parent().unwrap_or(file);

    let config_path = match &options.config {
        Some(explicit) => Some(explicit.clone()),
        None => find_config_file(start).await?,
    };
    let from_file = match &config_path {
        Some(path) => {
            debug!("Using configuration file {}", path.display());
            Some(ConfigFile::load(path).await?.options_for(file)?)
        }
        None => None,
    };

    let from_editorconfig = if options.editorconfig {
        resolve_editorconfig(file).await?
    } else {
        None
    };

    Ok(match (from_editorconfig, from_file) {
        (None, None) => None,
        (Some(base), None) => Some(base),
        (None, Some(file_options)) => Some(file_options),
        (Some(mut base), Some(file_options)) => {
            base.extend(file_options);
            Some(base)
        }
    })
}
