use crate::error::{StorageError, StorageResult};
use crate::matcher::values_equal;
use sonlist_types::fields::{ID_FIELD, SCHEMA_FIELD};
use sonlist_types::Document;

/// Uniqueness rule enforced atomically on write.
///
/// No two documents that share the same `scope_field` value may hold equal
/// values in any of `fields`. Documents lacking a field are not compared on
/// it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueConstraint {
    pub scope_field: String,
    pub fields: Vec<String>,
}

impl UniqueConstraint {
    pub fn new(scope_field: impl Into<String>, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            scope_field: scope_field.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fails if `candidate` collides with any of `others`. A document with
    /// the candidate's own `_id` is skipped, as is any list document (one
    /// carrying a `schema`), since child lists are not items of their parent.
    pub fn check<'a>(
        &self,
        candidate: &Document,
        others: impl IntoIterator<Item = &'a Document>,
    ) -> StorageResult<()> {
        let scope = candidate.get(&self.scope_field);
        let id = candidate.get(ID_FIELD);
        for other in others {
            if other.contains_key(SCHEMA_FIELD) || (id.is_some() && other.get(ID_FIELD) == id) {
                continue;
            }
            if other.get(&self.scope_field) != scope {
                continue;
            }
            for field in &self.fields {
                let Some(value) = candidate.get(field) else {
                    continue;
                };
                if other.get(field).is_some_and(|taken| values_equal(taken, value)) {
                    return Err(StorageError::UniqueViolation {
                        field: field.clone(),
                        value: value.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
