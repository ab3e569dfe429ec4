//! JSON-shaped admin form field managing a set of related image records.
//!
//! A parent entity owns image sub-records through a relation; one form field
//! submits the desired end-state of that collection (a single item or an
//! ordered batch). The [`reconciler::Reconciler`] diffs the submission
//! against the persisted records and applies deletes, creates (storing fresh
//! uploads under collision-free names), and in-place updates (optionally
//! replacing stored files) through explicit persistence and storage ports.

pub mod config;
pub mod filename;
pub mod filter;
pub mod payload;
pub mod reconciler;
pub mod repo;

pub use config::{Cardinality, FieldConfig};
pub use payload::{SubmittedItem, SubmittedValue, Submission, Upload};
pub use reconciler::{ReconcileError, Reconciler};
pub use repo::{AttrMap, ImageRecord, ImageRecords, ParentId, RecordId, RepoError};
