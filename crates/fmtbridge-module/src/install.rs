//! Locating formatter packages on disk

use std::path::{Path, PathBuf};

use semver::Version;
use serde::Deserialize;
use tracing::debug;

use crate::error::{ModuleError, ModuleResult};
use crate::module::ModuleInstall;
use crate::types::ModuleOrigin;

/// Manifest file name marking a project or package root
pub const MANIFEST_FILE: &str = "package.json";

/// Directory holding a project's installed dependencies
pub const MODULES_DIR: &str = "node_modules";

/// The subset of a package manifest this crate reads
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageManifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub bin: Option<serde_json::Value>,
    #[serde(default)]
    pub main: Option<String>,
    /// Formatter configuration embedded in the manifest
    #[serde(default)]
    pub prettier: Option<serde_json::Value>,
}

impl PackageManifest {
    /// Read and parse the manifest at `path`
    pub async fn read(path: &Path) -> ModuleResult<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Executable entry point relative to the package directory
    ///
    /// `bin` may be a single path or a map of command names; the command
    /// named like `package` wins, then the first entry, then `main`.
    pub fn entry(&self, package: &str) -> Option<PathBuf> {
        match &self.bin {
            Some(serde_json::Value::String(bin)) => return Some(PathBuf::from(bin)),
            Some(serde_json::Value::Object(map)) => {
                let chosen = map
                    .get(package)
                    .or_else(|| map.values().next())
                    .and_then(|v| v.as_str());
                if let Some(bin) = chosen {
                    return Some(PathBuf::from(bin));
                }
            }
            _ => {}
        }
        self.main.as_ref().map(PathBuf::from)
    }
}

/// Read the package installed in `dir`
pub async fn read_install(dir: &Path, package: &str, origin: ModuleOrigin) -> ModuleResult<ModuleInstall> {
    let manifest_path = dir.join(MANIFEST_FILE);
    let manifest = PackageManifest::read(&manifest_path)
        .await
        .map_err(|e| ModuleError::load_failed(dir, e.to_string()))?;

    let version = match manifest.version.as_deref() {
        Some(raw) => Some(Version::parse(raw)?),
        None => None,
    };
    let entry = manifest.entry(package).map(|p| dir.join(p));

    Ok(ModuleInstall {
        path: dir.to_path_buf(),
        version,
        entry,
        origin,
    })
}

/// Search upward from `start` for a local installation of `package`
pub async fn find_local_install(start: &Path, package: &str) -> ModuleResult<Option<ModuleInstall>> {
    for dir in start.ancestors() {
        let candidate = dir.join(MODULES_DIR).join(package);
        if tokio::fs::try_exists(candidate.join(MANIFEST_FILE)).await? {
            debug!(path = %candidate.display(), "Found local formatter install");
            return read_install(&candidate, package, ModuleOrigin::Local).await.map(Some);
        }
    }
    Ok(None)
}

/// Nearest directory at or above `path` that holds a package manifest
///
/// Falls back to the directory containing `path` when no manifest exists.
pub fn project_root(path: &Path) -> PathBuf {
    let start = if path.is_dir() {
        path
    } else {
        path.parent().unwrap_or(path)
    };
    start
        .ancestors()
        .find(|dir| dir.join(MANIFEST_FILE).is_file())
        .unwrap_or(start)
        .to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_package(root: &Path, version: &str) -> PathBuf {
        let dir = root.join("node_modules").join("prettier");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("package.json"),
            format!(
                r#"{{"name": "prettier", "version": "{}", "bin": "./bin/prettier.cjs"}}"#,
                version
            ),
        )
        .unwrap();
        dir
    }

    #[tokio::test]
    async fn test_find_local_install_walks_upward() {
        let temp = TempDir::new().unwrap();
        let pkg = write_package(temp.path(), "3.2.5");
        let nested = temp.path().join("src").join("deep");
        fs::create_dir_all(&nested).unwrap();

        let install = find_local_install(&nested, "prettier").await.unwrap().unwrap();
        assert_eq!(install.path, pkg);
        assert_eq!(install.version, Some(Version::new(3, 2, 5)));
        assert_eq!(install.entry, Some(pkg.join("./bin/prettier.cjs")));
        assert_eq!(install.origin, ModuleOrigin::Local);
    }

    #[tokio::test]
    async fn test_find_local_install_none() {
        let temp = TempDir::new().unwrap();
        let found = find_local_install(temp.path(), "prettier").await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_invalid_version_is_an_error() {
        let temp = TempDir::new().unwrap();
        write_package(temp.path(), "not-a-version");
        let result = find_local_install(temp.path(), "prettier").await;
        assert!(matches!(result, Err(ModuleError::Version(_))));
    }

    #[test]
    fn test_manifest_entry_map() {
        let manifest: PackageManifest = serde_json::from_str(
            r#"{"bin": {"other": "o.js", "prettier": "bin/prettier.cjs"}, "main": "index.js"}"#,
        )
        .unwrap();
        assert_eq!(manifest.entry("prettier"), Some(PathBuf::from("bin/prettier.cjs")));

        let manifest: PackageManifest = serde_json::from_str(r#"{"main": "index.js"}"#).unwrap();
        assert_eq!(manifest.entry("prettier"), Some(PathBuf::from("index.js")));
    }

    #[test]
    fn test_project_root() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("package.json"), "{}").unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(&src).unwrap();
        let file = src.join("index.ts");
        fs::write(&file, "").unwrap();

        assert_eq!(project_root(&file), temp.path());
    }
}
