//! Filesystem watch subscriptions
//!
//! A [`FileWatcher`] hands out [`WatchSubscription`]s for a path or glob.
//! Events arrive on the subscription's channel; dropping the subscription
//! cancels it.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use globset::{Glob, GlobMatcher};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::error::FormatResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchEventKind {
    Created,
    Changed,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub kind: WatchEventKind,
    pub path: PathBuf,
}

impl WatchEvent {
    pub fn new(kind: WatchEventKind, path: impl Into<PathBuf>) -> Self {
        WatchEvent {
            kind,
            path: path.into(),
        }
    }
}

/// What a subscription listens for
#[derive(Debug, Clone)]
pub enum WatchPattern {
    /// Exactly this file
    Path(PathBuf),
    /// Any path matching the glob
    Glob { raw: String, matcher: GlobMatcher },
}

impl WatchPattern {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        WatchPattern::Path(path.into())
    }

    pub fn glob(raw: &str) -> FormatResult<Self> {
        Ok(WatchPattern::Glob {
            raw: raw.to_string(),
            matcher: Glob::new(raw)?.compile_matcher(),
        })
    }

    /// Glob matching any of `names` at any depth
    pub fn file_names(names: &[&str]) -> FormatResult<Self> {
        Self::glob(&format!("**/{{{}}}", names.join(",")))
    }

    pub fn matches(&self, path: &Path) -> bool {
        match self {
            WatchPattern::Path(expected) => expected == path,
            WatchPattern::Glob { matcher, .. } => matcher.is_match(path),
        }
    }
}

impl std::fmt::Display for WatchPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WatchPattern::Path(path) => write!(f, "{}", path.display()),
            WatchPattern::Glob { raw, .. } => write!(f, "{}", raw),
        }
    }
}

struct Subscriber {
    id: u64,
    pattern: WatchPattern,
    sender: mpsc::UnboundedSender<WatchEvent>,
}

/// Routes events to the subscriptions whose pattern matches
#[derive(Default)]
struct Dispatcher {
    next_id: AtomicU64,
    subscribers: Mutex<Vec<Subscriber>>,
}

impl Dispatcher {
    fn subscribe(self: &Arc<Self>, pattern: WatchPattern) -> WatchSubscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::unbounded_channel();
        debug!(id, %pattern, "Watch subscription added");
        self.subscribers.lock().push(Subscriber {
            id,
            pattern,
            sender,
        });
        WatchSubscription {
            id,
            receiver,
            dispatcher: Arc::downgrade(self),
        }
    }

    /// Deliver `event`, returning how many subscriptions received it
    fn dispatch(&self, event: &WatchEvent) -> usize {
        let mut delivered = 0;
        self.subscribers.lock().retain(|subscriber| {
            if !subscriber.pattern.matches(&event.path) {
                return true;
            }
            match subscriber.sender.send(event.clone()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(_) => false,
            }
        });
        delivered
    }

    fn cancel(&self, id: u64) {
        self.subscribers.lock().retain(|s| s.id != id);
    }

    fn len(&self) -> usize {
        self.subscribers.lock().len()
    }
}

/// A cancellable stream of watch events
pub struct WatchSubscription {
    id: u64,
    receiver: mpsc::UnboundedReceiver<WatchEvent>,
    dispatcher: Weak<Dispatcher>,
}

impl WatchSubscription {
    /// Next event, `None` once the watcher is gone
    pub async fn next(&mut self) -> Option<WatchEvent> {
        self.receiver.recv().await
    }

    /// Next event if one is already queued
    pub fn try_next(&mut self) -> Option<WatchEvent> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for WatchSubscription {
    fn drop(&mut self) {
        if let Some(dispatcher) = self.dispatcher.upgrade() {
            dispatcher.cancel(self.id);
        }
    }
}

/// Source of filesystem change events
pub trait FileWatcher: Send + Sync {
    fn watch(&self, pattern: WatchPattern) -> FormatResult<WatchSubscription>;
}

/// Watcher fed by the `notify` crate
///
/// Workspace roots are watched recursively. Exact paths outside every root get
/// a non-recursive watch on their directory.
pub struct NotifyWatcher {
    watcher: Mutex<RecommendedWatcher>,
    dispatcher: Arc<Dispatcher>,
    roots: Vec<PathBuf>,
}

impl NotifyWatcher {
    pub fn new(roots: &[PathBuf]) -> FormatResult<Self> {
        let dispatcher = Arc::new(Dispatcher::default());
        let sink = Arc::clone(&dispatcher);

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<notify::Event, notify::Error>| match res {
                Ok(event) => {
                    let kind = match event.kind {
                        EventKind::Create(_) => WatchEventKind::Created,
                        EventKind::Modify(_) => WatchEventKind::Changed,
                        EventKind::Remove(_) => WatchEventKind::Deleted,
                        _ => return,
                    };
                    for path in event.paths {
                        sink.dispatch(&WatchEvent { kind, path });
                    }
                }
                Err(e) => error!("File watching error: {}", e),
            },
            notify::Config::default(),
        )?;

        for root in roots {
            watcher.watch(root, RecursiveMode::Recursive)?;
            debug!("Watching {}", root.display());
        }

        Ok(NotifyWatcher {
            watcher: Mutex::new(watcher),
            dispatcher,
            roots: roots.to_vec(),
        })
    }
}

impl FileWatcher for NotifyWatcher {
    fn watch(&self, pattern: WatchPattern) -> FormatResult<WatchSubscription> {
        if let WatchPattern::Path(path) = &pattern {
            let covered = self.roots.iter().any(|root| path.starts_with(root));
            if let (false, Some(dir)) = (covered, path.parent()) {
                if let Err(e) = self.watcher.lock().watch(dir, RecursiveMode::NonRecursive) {
                    debug!("Cannot watch {}: {}", dir.display(), e);
                }
            }
        }
        Ok(self.dispatcher.subscribe(pattern))
    }
}

/// Watcher driven by events the host forwards
#[derive(Default)]
pub struct ManualWatcher {
    dispatcher: Arc<Dispatcher>,
}

impl ManualWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver an event, returning how many subscriptions received it
    pub fn emit(&self, event: WatchEvent) -> usize {
        self.dispatcher.dispatch(&event)
    }

    /// Number of live subscriptions
    pub fn subscriptions(&self) -> usize {
        self.dispatcher.len()
    }
}

impl FileWatcher for ManualWatcher {
    fn watch(&self, pattern: WatchPattern) -> FormatResult<WatchSubscription> {
        Ok(self.dispatcher.subscribe(pattern))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_matching() {
        let manifest = WatchPattern::glob("**/package.json").unwrap();
        assert!(manifest.matches(Path::new("/ws/package.json")));
        assert!(manifest.matches(Path::new("/ws/packages/a/package.json")));
        assert!(!manifest.matches(Path::new("/ws/package.json5")));

        let configs = WatchPattern::file_names(&[".prettierrc", ".editorconfig"]).unwrap();
        assert!(configs.matches(Path::new("/ws/src/.editorconfig")));
        assert!(!configs.matches(Path::new("/ws/.prettierrc.json")));

        let exact = WatchPattern::path("/ws/.prettierignore");
        assert!(exact.matches(Path::new("/ws/.prettierignore")));
        assert!(!exact.matches(Path::new("/ws/sub/.prettierignore")));
    }

    #[test]
    fn test_manual_dispatch() {
        let watcher = ManualWatcher::new();
        let mut manifests = watcher.watch(WatchPattern::glob("**/package.json").unwrap()).unwrap();
        let mut ignore = watcher.watch(WatchPattern::path("/ws/.prettierignore")).unwrap();

        let delivered = watcher.emit(WatchEvent::new(WatchEventKind::Changed, "/ws/package.json"));
        assert_eq!(delivered, 1);
        assert_eq!(
            manifests.try_next(),
            Some(WatchEvent::new(WatchEventKind::Changed, "/ws/package.json"))
        );
        assert!(ignore.try_next().is_none());
    }

    #[test]
    fn test_drop_cancels() {
        let watcher = ManualWatcher::new();
        let subscription = watcher.watch(WatchPattern::path("/ws/a")).unwrap();
        assert_eq!(watcher.subscriptions(), 1);
        drop(subscription);
        assert_eq!(watcher.subscriptions(), 0);
        assert_eq!(watcher.emit(WatchEvent::new(WatchEventKind::Deleted, "/ws/a")), 0);
    }

    #[tokio::test]
    async fn test_next_awaits_event() {
        let watcher = ManualWatcher::new();
        let mut subscription = watcher.watch(WatchPattern::path("/ws/a")).unwrap();
        watcher.emit(WatchEvent::new(WatchEventKind::Created, "/ws/a"));
        let event = subscription.next().await.unwrap();
        assert_eq!(event.kind, WatchEventKind::Created);
    }
}
