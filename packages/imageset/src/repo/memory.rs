use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use super::{AttrMap, ImageRecord, ImageRecords, ParentId, RecordId, RepoError};

/// In-memory image record repository.
///
/// Reference implementation of the persistence port; backs the test suite.
/// Parents must be registered before their relation can be touched, matching
/// the fail-fast contract for a missing relation.
pub struct MemoryImageRecords {
    relations: Mutex<HashMap<ParentId, Vec<ImageRecord>>>,
    next_id: AtomicU64,
}

impl Default for MemoryImageRecords {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryImageRecords {
    pub fn new() -> Self {
        Self {
            relations: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a parent with an empty relation.
    pub fn add_parent(&self, parent: &ParentId) {
        self.relations
            .lock()
            .expect("lock poisoned")
            .entry(parent.clone())
            .or_default();
    }

    /// Insert a pre-existing record under a parent, returning its id.
    /// Test seeding helper; goes around the reconciler on purpose.
    pub fn seed(&self, parent: &ParentId, attrs: AttrMap) -> RecordId {
        let id = self.allocate_id();
        self.relations
            .lock()
            .expect("lock poisoned")
            .entry(parent.clone())
            .or_default()
            .push(ImageRecord {
                id: id.clone(),
                attrs,
            });
        id
    }

    /// Snapshot of a parent's records, for assertions.
    pub fn snapshot(&self, parent: &ParentId) -> Vec<ImageRecord> {
        self.relations
            .lock()
            .expect("lock poisoned")
            .get(parent)
            .cloned()
            .unwrap_or_default()
    }

    fn allocate_id(&self) -> RecordId {
        RecordId::new(self.next_id.fetch_add(1, Ordering::Relaxed).to_string())
    }
}

#[async_trait]
impl ImageRecords for MemoryImageRecords {
    async fn list(&self, parent: &ParentId) -> Result<Vec<ImageRecord>, RepoError> {
        self.relations
            .lock()
            .expect("lock poisoned")
            .get(parent)
            .cloned()
            .ok_or_else(|| RepoError::RelationMissing(parent.clone()))
    }

    async fn create(&self, parent: &ParentId, attrs: AttrMap) -> Result<ImageRecord, RepoError> {
        let id = self.allocate_id();
        let record = ImageRecord {
            id: id.clone(),
            attrs,
        };

        let mut relations = self.relations.lock().expect("lock poisoned");
        let records = relations
            .get_mut(parent)
            .ok_or_else(|| RepoError::RelationMissing(parent.clone()))?;
        records.push(record.clone());

        Ok(record)
    }

    async fn update(
        &self,
        parent: &ParentId,
        id: &RecordId,
        attrs: AttrMap,
    ) -> Result<(), RepoError> {
        let mut relations = self.relations.lock().expect("lock poisoned");
        let records = relations
            .get_mut(parent)
            .ok_or_else(|| RepoError::RelationMissing(parent.clone()))?;

        let record = records
            .iter_mut()
            .find(|r| r.id == *id)
            .ok_or_else(|| RepoError::RecordMissing {
                parent: parent.clone(),
                id: id.clone(),
            })?;

        // Column-wise update, untouched columns keep their values.
        for (key, value) in attrs {
            record.attrs.insert(key, value);
        }

        Ok(())
    }

    async fn delete_many(&self, parent: &ParentId, ids: &[RecordId]) -> Result<(), RepoError> {
        let mut relations = self.relations.lock().expect("lock poisoned");
        let records = relations
            .get_mut(parent)
            .ok_or_else(|| RepoError::RelationMissing(parent.clone()))?;

        records.retain(|r| !ids.contains(&r.id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(pairs: &[(&str, serde_json::Value)]) -> AttrMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn list_fails_for_unknown_parent() {
        let repo = MemoryImageRecords::new();
        let parent = ParentId::new("p1");
        assert!(matches!(
            repo.list(&parent).await,
            Err(RepoError::RelationMissing(_))
        ));
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids() {
        let repo = MemoryImageRecords::new();
        let parent = ParentId::new("p1");
        repo.add_parent(&parent);

        let a = repo.create(&parent, AttrMap::new()).await.unwrap();
        let b = repo.create(&parent, AttrMap::new()).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(repo.list(&parent).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_merges_columns() {
        let repo = MemoryImageRecords::new();
        let parent = ParentId::new("p1");
        repo.add_parent(&parent);
        let id = repo.seed(
            &parent,
            attrs(&[("url", json!("a.png")), ("caption", json!("old"))]),
        );

        repo.update(&parent, &id, attrs(&[("caption", json!("new"))]))
            .await
            .unwrap();

        let records = repo.snapshot(&parent);
        assert_eq!(records[0].attr("caption"), Some(&json!("new")));
        assert_eq!(records[0].attr("url"), Some(&json!("a.png")));
    }

    #[tokio::test]
    async fn update_unknown_record_errors() {
        let repo = MemoryImageRecords::new();
        let parent = ParentId::new("p1");
        repo.add_parent(&parent);

        let result = repo
            .update(&parent, &RecordId::new("99"), AttrMap::new())
            .await;
        assert!(matches!(result, Err(RepoError::RecordMissing { .. })));
    }

    #[tokio::test]
    async fn delete_many_removes_only_given_ids() {
        let repo = MemoryImageRecords::new();
        let parent = ParentId::new("p1");
        repo.add_parent(&parent);
        let keep = repo.seed(&parent, AttrMap::new());
        let doomed = repo.seed(&parent, AttrMap::new());

        repo.delete_many(&parent, &[doomed]).await.unwrap();

        let records = repo.snapshot(&parent);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, keep);
    }
}
