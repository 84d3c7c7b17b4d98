//! Path helpers for user-supplied settings

use std::path::{Path, PathBuf};

/// Expand a configured path
///
/// A leading `~` is replaced by the home directory, absolute paths are kept,
/// and relative paths are joined onto `relative_to`. Returns `None` for an
/// empty setting, or for a relative one without a base directory.
pub fn expand_setting_path(raw: &str, relative_to: Option<&Path>) -> Option<PathBuf> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Some(rest) = strip_home_prefix(raw) {
        let home = dirs::home_dir()?;
        return Some(if rest.is_empty() {
            home
        } else {
            home.join(rest)
        });
    }

    let path = Path::new(raw);
    if path.is_absolute() {
        return Some(path.to_path_buf());
    }
    relative_to.map(|base| base.join(path))
}

fn strip_home_prefix(raw: &str) -> Option<&str> {
    let rest = raw.strip_prefix('~')?;
    if rest.is_empty() {
        return Some(rest);
    }
    rest.strip_prefix('/').or_else(|| rest.strip_prefix('\\'))
}

/// `path` relative to `base`, when `path` lies under it
pub fn relative_to<'a>(path: &'a Path, base: &Path) -> Option<&'a Path> {
    path.strip_prefix(base).ok()
}
