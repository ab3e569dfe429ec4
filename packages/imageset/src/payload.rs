use std::collections::BTreeMap;

use serde_json::Value;

use crate::repo::RecordId;

/// An uploaded file handle: the client-supplied filename plus full content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub filename: String,
    pub content: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }
}

/// One attribute value in a submitted item.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmittedValue {
    /// A plain form value.
    Json(Value),
    /// A freshly uploaded file.
    Upload(Upload),
}

/// Desired end-state for one image record, as submitted by the form.
///
/// A raw attribute mapping; which keys mean what (primary key, image
/// attribute, hidden marker) is decided by the field configuration at
/// reconcile time. Missing keys are a valid "nothing to do" signal, never an
/// error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmittedItem {
    values: BTreeMap<String, SubmittedValue>,
}

impl SubmittedItem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_value(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.values.insert(key.into(), SubmittedValue::Json(value));
        self
    }

    pub fn set_upload(&mut self, key: impl Into<String>, upload: Upload) -> &mut Self {
        self.values
            .insert(key.into(), SubmittedValue::Upload(upload));
        self
    }

    pub fn with_value(mut self, key: impl Into<String>, value: Value) -> Self {
        self.set_value(key, value);
        self
    }

    pub fn with_upload(mut self, key: impl Into<String>, upload: Upload) -> Self {
        self.set_upload(key, upload);
        self
    }

    /// Plain JSON value under `key`, if the key holds one.
    pub fn json(&self, key: &str) -> Option<&Value> {
        match self.values.get(key) {
            Some(SubmittedValue::Json(value)) => Some(value),
            _ => None,
        }
    }

    /// Upload under `key`, if the key holds one.
    pub fn upload(&self, key: &str) -> Option<&Upload> {
        match self.values.get(key) {
            Some(SubmittedValue::Upload(upload)) => Some(upload),
            _ => None,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Normalized primary-key value under `pk_key`, if present and non-blank.
    pub fn record_id(&self, pk_key: &str) -> Option<RecordId> {
        self.json(pk_key).and_then(RecordId::from_value)
    }

    /// Hidden-marker value under `marker_key`: the previous stored path.
    pub fn marker(&self, marker_key: &str) -> Option<&str> {
        match self.json(marker_key) {
            Some(Value::String(path)) if !path.trim().is_empty() => Some(path.trim()),
            _ => None,
        }
    }
}

/// A full form submission for one field: a single desired item or an ordered
/// batch, matching the field's cardinality.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    One(SubmittedItem),
    Many(Vec<SubmittedItem>),
}
