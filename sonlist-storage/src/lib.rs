//! Document storage facade for sonlist.
//!
//! Lists and items live in one flat collection of JSON documents. The
//! service talks to storage only through [`DocumentStore`], so backends are
//! interchangeable:
//!
//! - [`MemoryStore`]: collections held behind a tokio `RwLock`
//! - [`SqliteStore`]: one table of JSON bodies in a SQLite file
//!
//! Both evaluate filters with the same matcher ([`matches`]), which
//! understands plain equality, the logical operators, comparison operators
//! in query and expression form, and the string expressions the filter
//! compiler emits (`$indexOfCP`, `$toLower`, `$toUpper`).
//!
//! Writes may carry a [`UniqueConstraint`]. The store enforces it while it
//! holds its write lock, so two concurrent writers cannot both claim a
//! unique value.

mod error;
mod matcher;
mod memory;
mod sqlite;
mod unique;
mod update;

pub use error::{StorageError, StorageResult};
pub use matcher::{lookup_path, matches};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use unique::UniqueConstraint;
pub use update::apply_update;

use async_trait::async_trait;
use sonlist_types::{document_id, fields::ID_FIELD, Document, DocumentId};

/// Outcome of a delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteResult {
    pub deleted_count: u64,
}

/// Data access facade over a document database.
///
/// Filters are predicate trees as produced by the filter compiler; updates
/// support `$set` and `$unset`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns the first document matching `filter`, in insertion order.
    async fn find_one(&self, collection: &str, filter: &Document) -> StorageResult<Option<Document>>;

    /// Returns every document matching `filter`, in insertion order.
    async fn find(&self, collection: &str, filter: &Document) -> StorageResult<Vec<Document>>;

    /// Inserts a document and returns its id. An `_id` is assigned if absent.
    async fn insert_one(
        &self,
        collection: &str,
        doc: Document,
        unique: Option<&UniqueConstraint>,
    ) -> StorageResult<String>;

    /// Inserts documents atomically: either all are stored or none.
    async fn insert_many(
        &self,
        collection: &str,
        docs: Vec<Document>,
        unique: Option<&UniqueConstraint>,
    ) -> StorageResult<Vec<String>>;

    /// Updates the first match and returns it as it is after the update.
    async fn find_one_and_update(
        &self,
        collection: &str,
        filter: &Document,
        update: &Document,
        unique: Option<&UniqueConstraint>,
    ) -> StorageResult<Option<Document>>;

    async fn delete_one(&self, collection: &str, filter: &Document) -> StorageResult<DeleteResult>;

    async fn delete_many(&self, collection: &str, filter: &Document) -> StorageResult<DeleteResult>;

    /// True if `value` is acceptable as a document id for this store.
    fn is_valid_id(&self, value: &str) -> bool {
        DocumentId::is_valid(value)
    }
}

/// Assigns a fresh `_id` unless the document already has one.
pub(crate) fn stamp_id(doc: &mut Document) -> String {
    if let Some(id) = document_id(doc) {
        return id.to_string();
    }
    let id = DocumentId::new().to_string();
    doc.insert(ID_FIELD.into(), id.clone().into());
    id
}

/// Builds an `{_id: id}` filter.
pub fn id_filter(id: &str) -> Document {
    let mut filter = Document::new();
    filter.insert(ID_FIELD.into(), id.into());
    filter
}
