//! Per-workspace formatter registrations

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::selector::Selectors;

/// Host side of provider registration
///
/// `root` is `None` for the global registration used without a workspace.
pub trait ProviderRegistrar: Send + Sync {
    fn register(&self, root: Option<&Path>, selectors: &Selectors, priority: i32);

    fn unregister(&self, root: Option<&Path>);
}

/// Registrar for hosts that do not route requests by selector
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRegistrar;

impl ProviderRegistrar for NoopRegistrar {
    fn register(&self, _root: Option<&Path>, _selectors: &Selectors, _priority: i32) {}

    fn unregister(&self, _root: Option<&Path>) {}
}

/// Formatting activated for one workspace root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceRegistration {
    pub root: Option<PathBuf>,
    pub selectors: Selectors,
    /// Logical activation time, increasing across registrations
    pub activation: u64,
}

/// Active registrations, at most one per root
pub struct RegistrationCache {
    registrations: RwLock<HashMap<Option<PathBuf>, Arc<WorkspaceRegistration>>>,
    clock: AtomicU64,
    registrar: Arc<dyn ProviderRegistrar>,
}

impl RegistrationCache {
    pub fn new(registrar: Arc<dyn ProviderRegistrar>) -> Self {
        RegistrationCache {
            registrations: RwLock::new(HashMap::new()),
            clock: AtomicU64::new(0),
            registrar,
        }
    }

    pub async fn get(&self, root: Option<&Path>) -> Option<Arc<WorkspaceRegistration>> {
        self.registrations
            .read()
            .await
            .get(&root.map(Path::to_path_buf))
            .cloned()
    }

    /// Activate `selectors` for `root`, replacing any earlier registration
    pub async fn register(
        &self,
        root: Option<&Path>,
        selectors: Selectors,
        priority: i32,
    ) -> Arc<WorkspaceRegistration> {
        let key = root.map(Path::to_path_buf);
        let mut registrations = self.registrations.write().await;
        if registrations.remove(&key).is_some() {
            self.registrar.unregister(root);
        }

        self.registrar.register(root, &selectors, priority);
        let registration = Arc::new(WorkspaceRegistration {
            root: key.clone(),
            selectors,
            activation: self.clock.fetch_add(1, Ordering::Relaxed) + 1,
        });
        registrations.insert(key, Arc::clone(&registration));

        match root {
            Some(root) => info!("Enabling formatter for workspace {}", root.display()),
            None => info!("Enabling formatter globally"),
        }
        registration
    }

    /// Deactivate the registration for `root`
    pub async fn invalidate(&self, root: Option<&Path>) {
        let removed = self
            .registrations
            .write()
            .await
            .remove(&root.map(Path::to_path_buf));
        if removed.is_some() {
            self.registrar.unregister(root);
            debug!(root = ?root, "Registration invalidated");
        }
    }

    /// Deactivate every registration
    pub async fn invalidate_all(&self) {
        let mut registrations = self.registrations.write().await;
        for root in registrations.keys() {
            self.registrar.unregister(root.as_deref());
        }
        registrations.clear();
        debug!("All registrations invalidated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingRegistrar {
        calls: Mutex<Vec<String>>,
    }

    impl ProviderRegistrar for RecordingRegistrar {
        fn register(&self, root: Option<&Path>, _selectors: &Selectors, priority: i32) {
            self.calls.lock().push(format!("register {:?} {}", root, priority));
        }

        fn unregister(&self, root: Option<&Path>) {
            self.calls.lock().push(format!("unregister {:?}", root));
        }
    }

    #[tokio::test]
    async fn test_reregistering_deactivates_first() {
        let registrar = Arc::new(RecordingRegistrar::default());
        let cache = RegistrationCache::new(registrar.clone());
        let root = Path::new("/ws");

        let first = cache.register(Some(root), Selectors::default(), 1).await;
        let second = cache.register(Some(root), Selectors::default(), 1).await;
        assert!(second.activation > first.activation);
        assert_eq!(
            *registrar.calls.lock(),
            vec![
                "register Some(\"/ws\") 1".to_string(),
                "unregister Some(\"/ws\")".to_string(),
                "register Some(\"/ws\") 1".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_invalidate() {
        let cache = RegistrationCache::new(Arc::new(NoopRegistrar));
        cache.register(Some(Path::new("/a")), Selectors::default(), 1).await;
        cache.register(None, Selectors::default(), 1).await;

        cache.invalidate(Some(Path::new("/a"))).await;
        assert!(cache.get(Some(Path::new("/a"))).await.is_none());
        assert!(cache.get(None).await.is_some());

        cache.invalidate_all().await;
        assert!(cache.get(None).await.is_none());
    }
}
