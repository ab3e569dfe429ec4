use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub mod memory;

/// Attribute map persisted onto an image record.
pub type AttrMap = serde_json::Map<String, Value>;

/// Identity of the owning parent record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParentId(String);

impl ParentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalized primary-key value of an image record.
///
/// Submitted ids arrive as JSON numbers or strings; both normalize to their
/// canonical string form so set arithmetic works across representations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Normalize a submitted primary-key value. Null and blank strings count
    /// as "no id supplied".
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(Self(n.to_string())),
            Value::String(s) if !s.trim().is_empty() => Some(Self(s.trim().to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A persisted image record: primary key plus its attribute columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRecord {
    pub id: RecordId,
    pub attrs: AttrMap,
}

impl ImageRecord {
    /// Attribute value by column name.
    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key)
    }
}

#[derive(Debug, Error)]
pub enum RepoError {
    /// The parent has no such relation (misconfiguration, not a soft miss).
    #[error("relation not found for parent {0}")]
    RelationMissing(ParentId),

    #[error("image record {id} not found for parent {parent}")]
    RecordMissing { parent: ParentId, id: RecordId },

    #[error("persistence backend error: {0}")]
    Backend(String),
}

/// Persistence port for the image records of one relation.
///
/// One implementation is bound to one relation (e.g. `product.images`); the
/// parent id selects whose records are touched. Adapters map these calls onto
/// the real ORM; [`memory::MemoryImageRecords`] is the in-process reference.
#[async_trait]
pub trait ImageRecords: Send + Sync {
    /// Current records under the parent's relation.
    async fn list(&self, parent: &ParentId) -> Result<Vec<ImageRecord>, RepoError>;

    /// Create a record under the parent's relation, returning it with its
    /// assigned primary key.
    async fn create(&self, parent: &ParentId, attrs: AttrMap) -> Result<ImageRecord, RepoError>;

    /// Update the given columns of one record.
    async fn update(
        &self,
        parent: &ParentId,
        id: &RecordId,
        attrs: AttrMap,
    ) -> Result<(), RepoError>;

    /// Delete the records with the given ids.
    async fn delete_many(&self, parent: &ParentId, ids: &[RecordId]) -> Result<(), RepoError>;
}
