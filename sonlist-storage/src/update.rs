use crate::error::{StorageError, StorageResult};
use serde_json::Value;
use sonlist_types::fields::ID_FIELD;
use sonlist_types::Document;

/// Applies an update document (`$set` / `$unset`) to `doc`.
///
/// The `_id` field cannot be changed.
pub fn apply_update(doc: &mut Document, update: &Document) -> StorageResult<()> {
    for (op, arg) in update {
        let Value::Object(fields) = arg else {
            return Err(StorageError::InvalidUpdate(format!("{op} expects an object")));
        };
        if fields.contains_key(ID_FIELD) {
            return Err(StorageError::InvalidUpdate(format!("{ID_FIELD} is immutable")));
        }
        match op.as_str() {
            "$set" => {
                for (key, value) in fields {
                    doc.insert(key.clone(), value.clone());
                }
            }
            "$unset" => {
                for key in fields.keys() {
                    doc.remove(key);
                }
            }
            other => return Err(StorageError::UnsupportedOperator(other.to_string())),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_and_unset() {
        let mut doc = json!({ "_id": "1", "a": 1, "b": 2 }).as_object().cloned().unwrap();
        let update = json!({ "$set": { "a": 5, "c": 3 }, "$unset": { "b": "" } });
        apply_update(&mut doc, update.as_object().unwrap()).unwrap();
        assert_eq!(serde_json::Value::Object(doc), json!({ "_id": "1", "a": 5, "c": 3 }));
    }

    #[test]
    fn id_is_immutable() {
        let mut doc = Document::new();
        let update = json!({ "$set": { "_id": "x" } });
        assert!(apply_update(&mut doc, update.as_object().unwrap()).is_err());
    }
}
