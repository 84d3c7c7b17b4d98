//! Global package-manager installs

use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{ModuleError, ModuleResult};
use crate::install::{read_install, MANIFEST_FILE, MODULES_DIR};
use crate::module::ModuleInstall;
use crate::types::ModuleOrigin;

/// Package manager used to look up globally installed modules
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    #[default]
    Npm,
    Yarn,
    Pnpm,
}

impl PackageManager {
    pub fn command(&self) -> &'static str {
        match self {
            PackageManager::Npm => "npm",
            PackageManager::Yarn => "yarn",
            PackageManager::Pnpm => "pnpm",
        }
    }

    fn root_args(&self) -> &'static [&'static str] {
        match self {
            PackageManager::Npm | PackageManager::Pnpm => &["root", "-g"],
            PackageManager::Yarn => &["global", "dir"],
        }
    }

    /// Turn the command's output into the directory holding global packages
    fn modules_dir(&self, output: &str) -> Option<PathBuf> {
        let line = output.lines().map(str::trim).find(|l| !l.is_empty())?;
        let dir = PathBuf::from(line);
        Some(match self {
            PackageManager::Yarn => dir.join(MODULES_DIR),
            _ => dir,
        })
    }
}

/// Ask the package manager for its global module directory
pub async fn global_modules_dir(manager: PackageManager) -> ModuleResult<Option<PathBuf>> {
    let program = match which::which(manager.command()) {
        Ok(program) => program,
        Err(e) => {
            debug!("{} not found on PATH: {}", manager.command(), e);
            return Ok(None);
        }
    };

    let output = Command::new(program)
        .args(manager.root_args())
        .stdin(Stdio::null())
        .stderr(Stdio::piped())
        .stdout(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        warn!(
            "{} could not report its global module root: {}",
            manager.command(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
        return Ok(None);
    }

    let stdout = String::from_utf8(output.stdout)
        .map_err(|e| ModuleError::invalid_output(e.to_string()))?;
    Ok(manager.modules_dir(&stdout))
}

/// Globally installed copy of `package`, if any
pub async fn find_global_install(
    manager: PackageManager,
    package: &str,
) -> ModuleResult<Option<ModuleInstall>> {
    let Some(root) = global_modules_dir(manager).await? else {
        return Ok(None);
    };
    find_in_modules_dir(&root, package).await
}

pub(crate) async fn find_in_modules_dir(
    root: &Path,
    package: &str,
) -> ModuleResult<Option<ModuleInstall>> {
    let dir = root.join(package);
    if !tokio::fs::try_exists(dir.join(MANIFEST_FILE)).await? {
        return Ok(None);
    }
    read_install(&dir, package, ModuleOrigin::Global).await.map(Some)
}
