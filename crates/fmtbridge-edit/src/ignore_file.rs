//! Ignore file matchers and their cache
//!
//! Each ignore file gets one [`IgnoreMatcher`], built lazily with
//! `ignore::gitignore` and tested against paths relative to the ignore file's
//! directory. A missing or unreadable file produces the null matcher, which
//! ignores nothing. Entries are never evicted, only superseded when the file
//! changes or is deleted.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fmtbridge_module::paths::relative_to;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use parking_lot::Mutex;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::watch::{WatchEvent, WatchEventKind};

/// Compiled rules of one ignore file
#[derive(Debug)]
pub struct IgnoreMatcher {
    source: PathBuf,
    exists: bool,
    rules: Option<Gitignore>,
}

impl IgnoreMatcher {
    /// Matcher that ignores nothing
    pub fn null(source: impl Into<PathBuf>) -> Self {
        IgnoreMatcher {
            source: source.into(),
            exists: false,
            rules: None,
        }
    }

    /// Build from the file at `source`
    pub async fn load(source: &Path) -> Self {
        let content = match tokio::fs::read_to_string(source).await {
            Ok(content) => content,
            Err(e) => {
                debug!("No ignore rules from {}: {}", source.display(), e);
                return Self::null(source);
            }
        };
        Self::from_content(source, &content)
    }

    /// Build from `content` as if read from `source`
    pub fn from_content(source: &Path, content: &str) -> Self {
        let base = source.parent().unwrap_or(Path::new(""));
        let mut builder = GitignoreBuilder::new(base);
        for line in content.lines() {
            if let Err(e) = builder.add_line(Some(source.to_path_buf()), line) {
                warn!("Skipping invalid pattern in {}: {}", source.display(), e);
            }
        }

        match builder.build() {
            Ok(rules) => IgnoreMatcher {
                source: source.to_path_buf(),
                exists: true,
                rules: Some(rules),
            },
            Err(e) => {
                warn!("Failed to build ignore rules from {}: {}", source.display(), e);
                IgnoreMatcher {
                    source: source.to_path_buf(),
                    exists: true,
                    rules: None,
                }
            }
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Whether the ignore file was present when this matcher was built
    pub fn exists(&self) -> bool {
        self.exists
    }

    /// Whether `file` is excluded
    ///
    /// Files outside the ignore file's directory are never excluded.
    pub fn is_match(&self, file: &Path) -> bool {
        let Some(rules) = &self.rules else {
            return false;
        };
        let base = self.source.parent().unwrap_or(Path::new(""));
        let Some(relative) = relative_to(file, base) else {
            return false;
        };
        if relative.as_os_str().is_empty() {
            return false;
        }
        rules.matched_path_or_any_parents(relative, false).is_ignore()
    }
}

/// Cache of ignore matchers keyed by ignore file path
#[derive(Debug, Default)]
pub struct IgnoreMatcherCache {
    matchers: RwLock<HashMap<PathBuf, Arc<IgnoreMatcher>>>,
    warned: Mutex<HashSet<PathBuf>>,
}

impl IgnoreMatcherCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached matcher for `ignore_file`, if loaded
    pub async fn get(&self, ignore_file: &Path) -> Option<Arc<IgnoreMatcher>> {
        self.matchers.read().await.get(ignore_file).cloned()
    }

    /// Matcher for `ignore_file`, loading it on first use
    pub async fn matcher(&self, ignore_file: &Path) -> Arc<IgnoreMatcher> {
        if let Some(matcher) = self.get(ignore_file).await {
            return matcher;
        }
        let loaded = Arc::new(IgnoreMatcher::load(ignore_file).await);
        self.matchers
            .write()
            .await
            .entry(ignore_file.to_path_buf())
            .or_insert(loaded)
            .clone()
    }

    /// Whether `file` is excluded by `ignore_file`
    ///
    /// A missing ignore file at a non-default location is reported once.
    pub async fn is_ignored(&self, file: &Path, ignore_file: &Path, is_default: bool) -> bool {
        let matcher = self.matcher(ignore_file).await;
        if !matcher.exists() {
            if !is_default && self.warned.lock().insert(ignore_file.to_path_buf()) {
                warn!(
                    "Configured ignorePath {} does not exist",
                    ignore_file.display()
                );
            }
            return false;
        }
        matcher.is_match(file)
    }

    /// Reload one ignore file
    pub async fn invalidate(&self, ignore_file: &Path) {
        let reloaded = Arc::new(IgnoreMatcher::load(ignore_file).await);
        self.matchers
            .write()
            .await
            .insert(ignore_file.to_path_buf(), reloaded);
        debug!("Reloaded ignore rules from {}", ignore_file.display());
    }

    /// Reload every cached ignore file
    pub async fn invalidate_all(&self) {
        let paths: Vec<PathBuf> = self.matchers.read().await.keys().cloned().collect();
        for path in paths {
            self.invalidate(&path).await;
        }
    }

    /// Apply a watch event for an ignore file
    pub async fn handle_event(&self, event: &WatchEvent) {
        match event.kind {
            WatchEventKind::Created | WatchEventKind::Changed => self.invalidate(&event.path).await,
            WatchEventKind::Deleted => {
                self.matchers
                    .write()
                    .await
                    .insert(event.path.clone(), Arc::new(IgnoreMatcher::null(&event.path)));
                debug!("Ignore file {} deleted", event.path.display());
            }
        }
    }
}
