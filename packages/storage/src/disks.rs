use std::collections::HashMap;
use std::sync::Arc;

use crate::error::StorageError;
use crate::traits::ObjectStore;

/// Named-disk lookup.
///
/// Maps disk names (`"public"`, `"s3"`, ...) to their backing stores so
/// callers can be configured with a disk name instead of holding a store
/// directly. Built once at startup and shared behind an `Arc`.
#[derive(Default)]
pub struct DiskRegistry {
    disks: HashMap<String, Arc<dyn ObjectStore>>,
}

impl DiskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a store under a disk name, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, store: Arc<dyn ObjectStore>) -> &mut Self {
        self.disks.insert(name.into(), store);
        self
    }

    /// Look up a disk by name.
    pub fn disk(&self, name: &str) -> Result<Arc<dyn ObjectStore>, StorageError> {
        self.disks
            .get(name)
            .cloned()
            .ok_or_else(|| StorageError::UnknownDisk(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    #[tokio::test]
    async fn register_and_lookup() {
        let mut registry = DiskRegistry::new();
        registry.register("public", Arc::new(MemoryStore::new()));

        let disk = registry.disk("public").unwrap();
        disk.put("a.txt", b"x").await.unwrap();
        assert!(disk.exists("a.txt").await.unwrap());
    }

    #[test]
    fn unknown_disk_errors() {
        let registry = DiskRegistry::new();
        assert!(matches!(
            registry.disk("nope"),
            Err(StorageError::UnknownDisk(_))
        ));
    }

    #[tokio::test]
    async fn register_replaces_existing() {
        let first = Arc::new(MemoryStore::new());
        first.put("stale.txt", b"x").await.unwrap();

        let mut registry = DiskRegistry::new();
        registry.register("public", first);
        registry.register("public", Arc::new(MemoryStore::new()));

        // Lookups resolve to the replacement store.
        let disk = registry.disk("public").unwrap();
        assert!(!disk.exists("stale.txt").await.unwrap());
    }
}
