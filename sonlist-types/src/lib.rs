//! Core type definitions for sonlist.
//!
//! This crate defines the fundamental types shared by every other crate:
//! - Document identifiers (UUID v7)
//! - The generic [`Document`] shape stored in the flat collection
//! - Reserved field names and well-known identities

pub mod fields;
mod ids;

pub use ids::DocumentId;

/// A stored document: a JSON object whose `_id` holds its [`DocumentId`].
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Returns true if `doc` is a list: it carries a schema or has no list reference.
pub fn is_list(doc: &Document) -> bool {
    doc.contains_key(fields::SCHEMA_FIELD) || !doc.contains_key(fields::LIST_REF_FIELD)
}

/// Returns the document's id as a string, if present.
pub fn document_id(doc: &Document) -> Option<&str> {
    doc.get(fields::ID_FIELD).and_then(|v| v.as_str())
}
