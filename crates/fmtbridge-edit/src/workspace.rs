//! Workspace folders open in the editor

use std::path::{Path, PathBuf};

use parking_lot::RwLock;

/// The set of open workspace folders
#[derive(Debug, Default)]
pub struct WorkspaceFolders {
    folders: RwLock<Vec<PathBuf>>,
}

impl WorkspaceFolders {
    pub fn new(folders: impl IntoIterator<Item = PathBuf>) -> Self {
        WorkspaceFolders {
            folders: RwLock::new(folders.into_iter().collect()),
        }
    }

    pub fn add(&self, folder: PathBuf) {
        let mut folders = self.folders.write();
        if !folders.contains(&folder) {
            folders.push(folder);
        }
    }

    pub fn remove(&self, folder: &Path) {
        self.folders.write().retain(|f| f != folder);
    }

    pub fn folders(&self) -> Vec<PathBuf> {
        self.folders.read().clone()
    }

    /// Innermost workspace folder containing `path`
    pub fn folder_for(&self, path: &Path) -> Option<PathBuf> {
        self.folders
            .read()
            .iter()
            .filter(|folder| path.starts_with(folder))
            .max_by_key(|folder| folder.components().count())
            .cloned()
    }
}
