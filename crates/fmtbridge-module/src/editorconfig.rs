//! `.editorconfig` support for project configuration
//!
//! Only the properties with a formatter counterpart are read: `indent_style`,
//! `indent_size`, `tab_width`, `max_line_length`, `end_of_line` and
//! `quote_type`.

use std::path::Path;

use globset::GlobBuilder;
use serde_json::Value;
use tracing::debug;

use crate::error::ModuleResult;
use crate::paths::relative_to;
use crate::types::OptionMap;

pub const EDITORCONFIG_FILE: &str = ".editorconfig";

#[derive(Debug, Default)]
struct EditorConfigFile {
    root: bool,
    sections: Vec<Section>,
}

#[derive(Debug)]
struct Section {
    pattern: String,
    properties: Vec<(String, String)>,
}

fn parse(content: &str) -> EditorConfigFile {
    let mut file = EditorConfigFile::default();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            file.sections.push(Section {
                pattern: header.trim().to_string(),
                properties: Vec::new(),
            });
            continue;
        }
        let Some((key, value)) = line.split_once('=').or_else(|| line.split_once(':')) else {
            continue;
        };
        let key = key.trim().to_lowercase();
        let value = value.trim().to_lowercase();
        match file.sections.last_mut() {
            Some(section) => section.properties.push((key, value)),
            None if key == "root" => file.root = value == "true",
            None => {}
        }
    }
    file
}

/// Whether a section header applies to `relative` (a `/`-separated path)
fn section_matches(pattern: &str, relative: &str) -> bool {
    let glob = if let Some(anchored) = pattern.strip_prefix('/') {
        anchored.to_string()
    } else if pattern.contains('/') {
        pattern.to_string()
    } else {
        format!("**/{}", pattern)
    };

    match GlobBuilder::new(&glob).literal_separator(true).build() {
        Ok(glob) => glob.compile_matcher().is_match(relative),
        Err(e) => {
            debug!("Skipping invalid .editorconfig section [{}]: {}", pattern, e);
            false
        }
    }
}

/// Collect the properties applying to `file`, innermost file last
async fn collect(file: &Path) -> ModuleResult<Vec<(String, String)>> {
    let Some(start) = file.parent() else {
        return Ok(Vec::new());
    };

    let mut layers = Vec::new();
    for dir in start.ancestors() {
        let path = dir.join(EDITORCONFIG_FILE);
        if !tokio::fs::try_exists(&path).await? {
            continue;
        }
        let parsed = parse(&tokio::fs::read_to_string(&path).await?);
        let root = parsed.root;
        layers.push((dir.to_path_buf(), parsed));
        if root {
            break;
        }
    }

    let mut properties = Vec::new();
    for (dir, parsed) in layers.into_iter().rev() {
        let Some(relative) = relative_to(file, &dir) else {
            continue;
        };
        let relative = relative.to_string_lossy().replace('\\', "/");
        for section in parsed.sections {
            if section_matches(&section.pattern, &relative) {
                properties.extend(section.properties);
            }
        }
    }
    Ok(properties)
}

fn to_options(properties: &[(String, String)]) -> OptionMap {
    let mut options = OptionMap::new();
    let mut indent_size = None;
    let mut tab_width = None;

    for (key, value) in properties {
        match key.as_str() {
            "indent_style" => match value.as_str() {
                "tab" => {
                    options.insert("useTabs".into(), Value::Bool(true));
                }
                "space" => {
                    options.insert("useTabs".into(), Value::Bool(false));
                }
                _ => {}
            },
            "indent_size" => indent_size = Some(value.clone()),
            "tab_width" => tab_width = value.parse::<u64>().ok(),
            "max_line_length" => {
                if let Ok(width) = value.parse::<u64>() {
                    options.insert("printWidth".into(), Value::from(width));
                }
            }
            "end_of_line" => {
                if matches!(value.as_str(), "lf" | "crlf" | "cr") {
                    options.insert("endOfLine".into(), Value::String(value.clone()));
                }
            }
            "quote_type" => match value.as_str() {
                "single" => {
                    options.insert("singleQuote".into(), Value::Bool(true));
                }
                "double" => {
                    options.insert("singleQuote".into(), Value::Bool(false));
                }
                _ => {}
            },
            _ => {}
        }
    }

    let width = match indent_size.as_deref() {
        Some("tab") | None => tab_width,
        Some(size) => size.parse::<u64>().ok(),
    };
    if let Some(width) = width {
        options.insert("tabWidth".into(), Value::from(width));
    }
    options
}

/// Formatter options derived from the `.editorconfig` files above `file`
///
/// Returns `None` when no applicable property was found.
pub async fn resolve_editorconfig(file: &Path) -> ModuleResult<Option<OptionMap>> {
    let properties = collect(file).await?;
    let options = to_options(&properties);
    Ok(if options.is_empty() { None } else { Some(options) })
}
