use async_trait::async_trait;
use serde_json::Value;

/// Collaborator answering "does another item of this list hold this value?".
///
/// The storage layer enforces the same rule atomically on write; this lookup
/// lets validation reject a duplicate early with a precise error.
#[async_trait]
pub trait UniqueLookup: Send + Sync {
    /// Returns true if an item of `list_id` other than `exclude` already
    /// stores `value` in `field`.
    async fn is_taken(
        &self,
        list_id: &str,
        field: &str,
        value: &Value,
        exclude: Option<&str>,
    ) -> Result<bool, String>;
}

/// A lookup that never reports a duplicate.
///
/// Used for schemas without unique fields (such as the list meta-schema).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLookup;

#[async_trait]
impl UniqueLookup for NoLookup {
    async fn is_taken(
        &self,
        _list_id: &str,
        _field: &str,
        _value: &Value,
        _exclude: Option<&str>,
    ) -> Result<bool, String> {
        Ok(false)
    }
}
