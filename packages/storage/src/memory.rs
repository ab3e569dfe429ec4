use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::path::validate_object_path;
use crate::traits::ObjectStore;

/// In-memory object store.
///
/// Used by tests and as a reference backend; contents are lost on drop.
#[derive(Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        let normalized = validate_object_path(path)?;
        self.objects
            .write()
            .expect("lock poisoned")
            .insert(normalized, data.to_vec());
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let normalized = validate_object_path(path)?;
        self.objects
            .read()
            .expect("lock poisoned")
            .get(&normalized)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(normalized))
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        let normalized = validate_object_path(path)?;
        Ok(self
            .objects
            .read()
            .expect("lock poisoned")
            .contains_key(&normalized))
    }

    async fn delete(&self, path: &str) -> Result<bool, StorageError> {
        let normalized = validate_object_path(path)?;
        Ok(self
            .objects
            .write()
            .expect("lock poisoned")
            .remove(&normalized)
            .is_some())
    }

    async fn size(&self, path: &str) -> Result<u64, StorageError> {
        let normalized = validate_object_path(path)?;
        self.objects
            .read()
            .expect("lock poisoned")
            .get(&normalized)
            .map(|data| data.len() as u64)
            .ok_or_else(|| StorageError::NotFound(normalized))
    }
}
