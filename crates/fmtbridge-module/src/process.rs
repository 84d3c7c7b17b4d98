//! Formatter module backed by the formatter's command line
//!
//! Each call spawns `node <entry>` with flags derived from the option map and
//! talks to it over stdin/stdout. Project configuration is discovered natively
//! and handed to the formatter explicitly, so the child always runs with
//! `--no-config --no-editorconfig`. Ignore files are checked before the call,
//! so the child also gets an ignore path that matches nothing.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::error::{ModuleError, ModuleResult};
use crate::module::{FormatterModule, ModuleInstall, ModuleLoader};
use crate::project_config::{find_config_file, resolve_project_config};
use crate::types::{
    Capabilities, FileInfo, FileInfoOptions, OptionMap, ResolveConfigOptions, SupportInfo,
};

/// Option keys that never become command line flags
const PASSTHROUGH_SKIP: &[&str] = &["filepath", "plugins", "overrides", "$schema"];

/// `tabWidth` -> `tab-width`
fn kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Translate an option map into formatter command line flags
pub fn option_flags(options: &OptionMap) -> Vec<String> {
    let mut flags = Vec::new();

    if let Some(path) = options.get("filepath").and_then(Value::as_str) {
        flags.push("--stdin-filepath".to_string());
        flags.push(path.to_string());
    }
    for plugin in plugin_names(options) {
        flags.push("--plugin".to_string());
        flags.push(plugin);
    }

    for (key, value) in options {
        if PASSTHROUGH_SKIP.contains(&key.as_str()) {
            continue;
        }
        let flag = kebab_case(key);
        match value {
            Value::Bool(true) => flags.push(format!("--{}", flag)),
            Value::Bool(false) => flags.push(format!("--no-{}", flag)),
            Value::Number(n) => {
                flags.push(format!("--{}", flag));
                flags.push(n.to_string());
            }
            Value::String(s) => {
                flags.push(format!("--{}", flag));
                flags.push(s.clone());
            }
            Value::Null | Value::Array(_) | Value::Object(_) => {
                debug!("Option {} has no command line form, skipping", key);
            }
        }
    }
    flags
}

fn plugin_names(options: &OptionMap) -> Vec<String> {
    match options.get("plugins") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::String(single)) => vec![single.clone()],
        _ => Vec::new(),
    }
}

/// Ignore file handed to the formatter so that its own ignore lookup matches nothing
#[cfg(windows)]
pub const NO_IGNORE_FILE: &str = "NUL";
#[cfg(not(windows))]
pub const NO_IGNORE_FILE: &str = "/dev/null";

/// Full argument list for formatting stdin with `options`
///
/// Ignore rules and configuration are applied before the call, so the child
/// is told to skip its own discovery of both.
pub fn format_args(options: &OptionMap) -> Vec<String> {
    let mut args = option_flags(options);
    args.extend(
        [
            "--no-config",
            "--no-editorconfig",
            "--ignore-path",
            NO_IGNORE_FILE,
            "--with-node-modules",
        ]
        .map(str::to_string),
    );
    args
}

/// A formatter installation driven through its command line
///
/// Invocations are unbounded unless a timeout is set.
pub struct ProcessModule {
    node: PathBuf,
    entry: PathBuf,
    timeout: Option<Duration>,
}

impl ProcessModule {
    pub fn new(node: impl Into<PathBuf>, entry: impl Into<PathBuf>) -> Self {
        ProcessModule {
            node: node.into(),
            entry: entry.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Run the formatter with `args`, feeding `stdin` when given
    async fn run(&self, args: &[String], stdin: Option<&str>) -> ModuleResult<String> {
        debug!(entry = %self.entry.display(), ?args, "Invoking formatter");

        let mut child = Command::new(&self.node)
            .arg(&self.entry)
            .args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
            pipe.write_all(input.as_bytes()).await?;
            pipe.shutdown().await?;
        }

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| {
                    ModuleError::invocation(format!(
                        "Formatter timed out after {}s",
                        limit.as_secs()
                    ))
                })??,
            None => child.wait_with_output().await?,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(ModuleError::invocation(if stderr.is_empty() {
                format!("Formatter exited with {}", output.status)
            } else {
                stderr
            }));
        }

        String::from_utf8(output.stdout).map_err(|e| ModuleError::invalid_output(e.to_string()))
    }
}

#[async_trait]
impl FormatterModule for ProcessModule {
    async fn format(&self, text: &str, options: &OptionMap) -> ModuleResult<String> {
        self.run(&format_args(options), Some(text)).await
    }

    async fn support_info(&self, plugins: &[String]) -> ModuleResult<SupportInfo> {
        let mut args = vec!["--support-info".to_string()];
        for plugin in plugins {
            args.push("--plugin".to_string());
            args.push(plugin.clone());
        }
        let stdout = self.run(&args, None).await?;
        serde_json::from_str(&stdout).map_err(|e| ModuleError::invalid_output(e.to_string()))
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::all()
    }

    async fn file_info(&self, path: &Path, options: &FileInfoOptions) -> ModuleResult<FileInfo> {
        let mut args = vec!["--file-info".to_string(), path.display().to_string()];
        if let Some(ignore_path) = &options.ignore_path {
            args.push("--ignore-path".to_string());
            args.push(ignore_path.display().to_string());
        }
        if options.with_node_modules {
            args.push("--with-node-modules".to_string());
        }
        for plugin in &options.plugins {
            args.push("--plugin".to_string());
            args.push(plugin.clone());
        }
        let stdout = self.run(&args, None).await?;
        serde_json::from_str(&stdout).map_err(|e| ModuleError::invalid_output(e.to_string()))
    }

    async fn resolve_config(
        &self,
        path: &Path,
        options: &ResolveConfigOptions,
    ) -> ModuleResult<Option<OptionMap>> {
        resolve_project_config(path, options).await
    }

    async fn resolve_config_file(&self, path: &Path) -> ModuleResult<Option<PathBuf>> {
        find_config_file(path.parent().unwrap_or(path)).await
    }
}

/// Loads installs as [`ProcessModule`]s run by a node executable
#[derive(Debug, Clone, Default)]
pub struct ProcessModuleLoader {
    node: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl ProcessModuleLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `node` instead of looking it up on `PATH`
    pub fn with_node(mut self, node: impl Into<PathBuf>) -> Self {
        self.node = Some(node.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn node(&self, install: &ModuleInstall) -> ModuleResult<PathBuf> {
        match &self.node {
            Some(node) => Ok(node.clone()),
            None => which::which("node")
                .map_err(|e| ModuleError::load_failed(&install.path, format!("node not found: {}", e))),
        }
    }
}

#[async_trait]
impl ModuleLoader for ProcessModuleLoader {
    async fn load(&self, install: &ModuleInstall) -> ModuleResult<Arc<dyn FormatterModule>> {
        let entry = install
            .entry
            .clone()
            .ok_or_else(|| ModuleError::load_failed(&install.path, "package declares no entry point"))?;
        if !tokio::fs::try_exists(&entry).await? {
            return Err(ModuleError::load_failed(
                &install.path,
                format!("entry point {} does not exist", entry.display()),
            ));
        }

        let node = self.node(install)?;
        debug!(
            origin = %install.origin,
            entry = %entry.display(),
            "Loaded formatter module"
        );

        let mut module = ProcessModule::new(node, entry);
        if let Some(timeout) = self.timeout {
            module = module.with_timeout(timeout);
        }
        Ok(Arc::new(module))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ModuleOrigin;

    fn options(value: Value) -> OptionMap {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_kebab_case() {
        assert_eq!(kebab_case("tabWidth"), "tab-width");
        assert_eq!(kebab_case("semi"), "semi");
        assert_eq!(kebab_case("experimentalTernaries"), "experimental-ternaries");
    }

    #[test]
    fn test_option_flags() {
        let flags = option_flags(&options(serde_json::json!({
            "filepath": "/ws/a.ts",
            "parser": "typescript",
            "semi": false,
            "singleQuote": true,
            "tabWidth": 4,
            "plugins": ["prettier-plugin-organize-imports"]
        })));

        assert_eq!(&flags[..2], &["--stdin-filepath", "/ws/a.ts"]);
        assert_eq!(&flags[2..4], &["--plugin", "prettier-plugin-organize-imports"]);
        assert!(flags.contains(&"--no-semi".to_string()));
        assert!(flags.contains(&"--single-quote".to_string()));
        let width = flags.iter().position(|f| f == "--tab-width").unwrap();
        assert_eq!(flags[width + 1], "4");
        assert!(!flags.iter().any(|f| f == "--filepath" || f == "--plugins"));
    }

    #[tokio::test]
    async fn test_loader_rejects_missing_entry() {
        let temp = tempfile::TempDir::new().unwrap();
        let install = ModuleInstall {
            path: temp.path().to_path_buf(),
            version: None,
            entry: Some(temp.path().join("bin/prettier.cjs")),
            origin: ModuleOrigin::Local,
        };

        let loader = ProcessModuleLoader::new().with_node("/usr/bin/node");
        let result = loader.load(&install).await;
        assert!(matches!(result, Err(ModuleError::LoadFailed { .. })));
    }

    #[tokio::test]
    async fn test_loader_without_entry() {
        let install = ModuleInstall {
            path: PathBuf::from("/nowhere"),
            version: None,
            entry: None,
            origin: ModuleOrigin::Bundled,
        };
        let result = ProcessModuleLoader::new().load(&install).await;
        assert!(matches!(result, Err(ModuleError::LoadFailed { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_format_through_child_process() {
        // `sh` stands in for node: the entry script echoes stdin back upper-cased.
        let temp = tempfile::TempDir::new().unwrap();
        let script = temp.path().join("fmt.sh");
        std::fs::write(&script, "tr a-z A-Z\n").unwrap();

        let module = ProcessModule::new("/bin/sh", &script);
        let out = module.format("const a = 1", &OptionMap::new()).await.unwrap();
        assert_eq!(out, "CONST A = 1");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_invocation_reports_stderr() {
        let temp = tempfile::TempDir::new().unwrap();
        let script = temp.path().join("fail.sh");
        std::fs::write(&script, "echo 'SyntaxError: Unexpected token (1:5)' >&2\nexit 2\n").unwrap();

        let module = ProcessModule::new("/bin/sh", &script);
        let err = module.format("x", &OptionMap::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "SyntaxError: Unexpected token (1:5)");
    }
}
