use async_trait::async_trait;

use crate::error::StorageError;

/// Path-addressed object storage.
///
/// Objects are keyed by normalized virtual paths (see
/// [`crate::path::validate_object_path`]). Writes are durable once `put`
/// returns; overwriting an existing path is silent.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store bytes under the given path, overwriting any previous object.
    async fn put(&self, path: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Retrieve all bytes for an object.
    async fn get(&self, path: &str) -> Result<Vec<u8>, StorageError>;

    /// Check whether an object exists.
    async fn exists(&self, path: &str) -> Result<bool, StorageError>;

    /// Delete an object by path.
    ///
    /// Returns `true` if the object was deleted, `false` if it did not exist.
    async fn delete(&self, path: &str) -> Result<bool, StorageError>;

    /// Get the size of an object in bytes.
    async fn size(&self, path: &str) -> Result<u64, StorageError>;
}
