use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use imageset::repo::memory::MemoryImageRecords;
use imageset::{AttrMap, FieldConfig, ParentId, Reconciler};
use storage::memory::MemoryStore;
use storage::{DiskRegistry, ObjectStore, StorageError};

/// One field wired to in-memory ports, ready to reconcile.
pub struct TestField {
    pub repo: Arc<MemoryImageRecords>,
    pub store: Arc<MemoryStore>,
    pub parent: ParentId,
    pub reconciler: Reconciler,
}

impl TestField {
    pub fn spawn(config: FieldConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::spawn_with_store(config, store.clone(), store)
    }

    /// Wire an arbitrary store under the configured disk name while keeping
    /// a `MemoryStore` handle for assertions.
    pub fn spawn_with_store(
        config: FieldConfig,
        disk_store: Arc<dyn ObjectStore>,
        assert_store: Arc<MemoryStore>,
    ) -> Self {
        let repo = Arc::new(MemoryImageRecords::new());
        let parent = ParentId::new("parent-1");
        repo.add_parent(&parent);

        let mut disks = DiskRegistry::new();
        disks.register(config.disk.clone(), disk_store);

        let reconciler = Reconciler::new(repo.clone(), Arc::new(disks), config);

        Self {
            repo,
            store: assert_store,
            parent,
            reconciler,
        }
    }
}

/// Attribute map literal.
pub fn attrs(pairs: &[(&str, Value)]) -> AttrMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// Store wrapper that fails `put` once its budget is exhausted. Reads and
/// deletes pass through, so earlier effects stay observable.
pub struct FlakyStore {
    inner: Arc<MemoryStore>,
    puts_left: AtomicUsize,
}

impl FlakyStore {
    pub fn new(inner: Arc<MemoryStore>, allowed_puts: usize) -> Self {
        Self {
            inner,
            puts_left: AtomicUsize::new(allowed_puts),
        }
    }
}

#[async_trait]
impl ObjectStore for FlakyStore {
    async fn put(&self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        let allowed = self
            .puts_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if !allowed {
            return Err(StorageError::Io(std::io::Error::other(
                "injected write failure",
            )));
        }
        self.inner.put(path, data).await
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        self.inner.get(path).await
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        self.inner.exists(path).await
    }

    async fn delete(&self, path: &str) -> Result<bool, StorageError> {
        self.inner.delete(path).await
    }

    async fn size(&self, path: &str) -> Result<u64, StorageError> {
        self.inner.size(path).await
    }
}
