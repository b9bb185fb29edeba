//! List model for sonlist.
//!
//! Defines how a list's schema text becomes a [`SchemaDef`] and how
//! candidate items are checked against it:
//! - [`SchemaDef`] / [`FieldSpec`]: the compiled field-property map
//! - [`Validator`]: strict and partial validation with sanitizing transforms
//!   (type check, case folding, uniqueness, one-way hashing)
//! - [`UniqueLookup`]: the collaborator consulted for `unique` fields
//! - [`ListRecord`]: a typed view of a stored list document
//!
//! Schemas are never cached: callers compile the stored text on every
//! validation so edits take effect immediately.

mod error;
mod list;
mod lookup;
mod schema;
mod validate;

pub use error::{SchemaError, SchemaResult, ValidationError, ValidationResult};
pub use list::{get_str, ListRecord};
pub use lookup::{NoLookup, UniqueLookup};
pub use schema::{FieldProperty, FieldSpec, FieldType, SchemaDef};
pub use validate::{ValidationMode, Validator};
