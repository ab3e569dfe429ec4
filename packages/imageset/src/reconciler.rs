use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument};

use storage::{DiskRegistry, ObjectStore, StorageError};

use crate::config::{Cardinality, FieldConfig};
use crate::filename::{delete_stored, store_upload};
use crate::filter::prepare_attrs;
use crate::payload::{SubmittedItem, Submission};
use crate::repo::{AttrMap, ImageRecord, ImageRecords, ParentId, RecordId, RepoError};

#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Payload shape does not match the configured cardinality.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Reconciles a parent's image records against a form submission.
///
/// One instance serves one field: the persistence port is bound to the
/// relation, the disk registry resolves the configured disk, and the config
/// names the payload keys. A submission describes the desired end-state;
/// reconciliation applies the minimal delete/create/update operations, in
/// that order, without touching records the client did not reference.
pub struct Reconciler {
    repo: Arc<dyn ImageRecords>,
    disks: Arc<DiskRegistry>,
    config: FieldConfig,
}

impl Reconciler {
    pub fn new(repo: Arc<dyn ImageRecords>, disks: Arc<DiskRegistry>, config: FieldConfig) -> Self {
        Self {
            repo,
            disks,
            config,
        }
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    /// Entry point, invoked once per form save.
    ///
    /// Operations run sequentially with no internal transaction: a failure in
    /// a later phase (or a later item of a batch) leaves earlier effects
    /// committed and propagates unchanged. Callers wanting atomicity must
    /// wrap the whole call in their own transactional boundary.
    #[instrument(skip(self, submission), fields(parent = %parent))]
    pub async fn apply_form_submission(
        &self,
        parent: &ParentId,
        submission: Submission,
    ) -> Result<(), ReconcileError> {
        let store = self.disks.disk(&self.config.disk)?;
        let current = self.repo.list(parent).await?;

        match (self.config.cardinality, submission) {
            (Cardinality::Many, Submission::Many(items)) => {
                self.apply_many(parent, store.as_ref(), &current, &items)
                    .await
            }
            (Cardinality::One, Submission::One(item)) => {
                self.apply_one(parent, store.as_ref(), &current, &item).await
            }
            (Cardinality::Many, Submission::One(_)) => Err(ReconcileError::MalformedPayload(
                "field manages a list of images but a single item was submitted".into(),
            )),
            (Cardinality::One, Submission::Many(_)) => Err(ReconcileError::MalformedPayload(
                "field manages a single image but a list was submitted".into(),
            )),
        }
    }

    /// Plural mode: three fixed phases. Deletes go first so a recreated item
    /// cannot trip unique constraints; create and update sets are disjoint by
    /// primary-key presence.
    async fn apply_many(
        &self,
        parent: &ParentId,
        store: &dyn ObjectStore,
        current: &[ImageRecord],
        items: &[SubmittedItem],
    ) -> Result<(), ReconcileError> {
        let current_ids: Vec<RecordId> = current.iter().map(|record| record.id.clone()).collect();

        self.delete_removed(parent, &current_ids, items).await?;
        self.create_new(parent, store, items).await?;
        self.update_existing(parent, store, &current_ids, items)
            .await?;

        Ok(())
    }

    /// Single mode: the one submitted item either targets the existing
    /// record (via its primary key, or via the hidden marker when no key was
    /// sent) and is updated in place, or the old record is deleted and a
    /// fresh one created from the upload.
    async fn apply_one(
        &self,
        parent: &ParentId,
        store: &dyn ObjectStore,
        current: &[ImageRecord],
        item: &SubmittedItem,
    ) -> Result<(), ReconcileError> {
        let marker_key = self.config.hidden_marker_key();

        let target = match item.record_id(&self.config.primary_key) {
            Some(id) => {
                // An id the parent does not own is neither created, updated,
                // nor allowed to displace the current record.
                let Some(record) = current.iter().find(|record| record.id == id) else {
                    return Ok(());
                };
                Some(record)
            }
            // No key submitted: the marker still pins the current record.
            None if item.marker(&marker_key).is_some() => current.first(),
            None => None,
        };

        if let Some(record) = target {
            let mut attrs = prepare_attrs(item, &self.config);
            self.replace_marked_file(store, item, &mut attrs).await?;

            if !attrs.is_empty() {
                self.repo.update(parent, &record.id, attrs).await?;
            }
            return Ok(());
        }

        let current_ids: Vec<RecordId> = current.iter().map(|record| record.id.clone()).collect();
        if !current_ids.is_empty() {
            debug!(count = current_ids.len(), "deleting replaced image record");
            self.repo.delete_many(parent, &current_ids).await?;
        }

        if let Some(upload) = item.upload(&self.config.image_field) {
            let mut attrs = prepare_attrs(item, &self.config);
            let path = store_upload(store, upload, &self.config.directory).await?;
            attrs.insert(self.config.image_field.clone(), Value::String(path));

            let created = self.repo.create(parent, attrs).await?;
            debug!(id = %created.id, "created image record");
        }

        Ok(())
    }

    /// Phase 1: delete every current record the submission no longer names.
    async fn delete_removed(
        &self,
        parent: &ParentId,
        current_ids: &[RecordId],
        items: &[SubmittedItem],
    ) -> Result<(), ReconcileError> {
        let submitted_ids: HashSet<RecordId> = items
            .iter()
            .filter_map(|item| item.record_id(&self.config.primary_key))
            .collect();

        let ids_to_delete: Vec<RecordId> = current_ids
            .iter()
            .filter(|id| !submitted_ids.contains(id))
            .cloned()
            .collect();

        if ids_to_delete.is_empty() {
            return Ok(());
        }

        debug!(count = ids_to_delete.len(), "deleting removed image records");
        self.repo.delete_many(parent, &ids_to_delete).await?;
        Ok(())
    }

    /// Phase 2: create a record for every item that has no primary key and
    /// carries a fresh upload without a hidden marker.
    async fn create_new(
        &self,
        parent: &ParentId,
        store: &dyn ObjectStore,
        items: &[SubmittedItem],
    ) -> Result<(), ReconcileError> {
        let marker_key = self.config.hidden_marker_key();

        for item in items {
            if item.record_id(&self.config.primary_key).is_some() {
                continue;
            }
            let Some(upload) = item.upload(&self.config.image_field) else {
                continue;
            };
            if item.contains_key(&marker_key) {
                continue;
            }

            let mut attrs = prepare_attrs(item, &self.config);
            let path = store_upload(store, upload, &self.config.directory).await?;
            attrs.insert(self.config.image_field.clone(), Value::String(path));

            let created = self.repo.create(parent, attrs).await?;
            debug!(id = %created.id, "created image record");
        }

        Ok(())
    }

    /// Phase 3: update every item whose primary key matches a current
    /// record. The stored file is replaced only when the item carries both a
    /// fresh upload and the hidden marker naming the old path; otherwise the
    /// image attribute stays untouched.
    async fn update_existing(
        &self,
        parent: &ParentId,
        store: &dyn ObjectStore,
        current_ids: &[RecordId],
        items: &[SubmittedItem],
    ) -> Result<(), ReconcileError> {
        for item in items {
            let Some(id) = item.record_id(&self.config.primary_key) else {
                continue;
            };
            // An id the parent does not own is neither created nor updated.
            if !current_ids.contains(&id) {
                continue;
            }

            let mut attrs = prepare_attrs(item, &self.config);
            self.replace_marked_file(store, item, &mut attrs).await?;

            if attrs.is_empty() {
                continue;
            }

            self.repo.update(parent, &id, attrs).await?;
        }

        Ok(())
    }

    /// Delete-old-then-store-new file replacement, triggered only when the
    /// item carries both a fresh upload and the hidden marker with the old
    /// path. Writes the new path into the image attribute.
    async fn replace_marked_file(
        &self,
        store: &dyn ObjectStore,
        item: &SubmittedItem,
        attrs: &mut AttrMap,
    ) -> Result<(), ReconcileError> {
        let marker_key = self.config.hidden_marker_key();

        if let (Some(upload), Some(old_path)) = (
            item.upload(&self.config.image_field),
            item.marker(&marker_key),
        ) {
            delete_stored(store, old_path).await?;
            let path = store_upload(store, upload, &self.config.directory).await?;
            debug!(old_path, new_path = %path, "replaced stored file");
            attrs.insert(self.config.image_field.clone(), Value::String(path));
        }

        Ok(())
    }
}
