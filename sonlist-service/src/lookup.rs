use async_trait::async_trait;
use serde_json::{json, Value};
use sonlist_model::UniqueLookup;
use sonlist_storage::DocumentStore;
use sonlist_types::fields::{ID_FIELD, LIST_REF_FIELD, SCHEMA_FIELD};
use sonlist_types::Document;

/// Answers uniqueness questions by querying the document store.
pub(crate) struct StoreLookup<'a> {
    pub store: &'a dyn DocumentStore,
    pub collection: &'a str,
}

#[async_trait]
impl UniqueLookup for StoreLookup<'_> {
    async fn is_taken(
        &self,
        list_id: &str,
        field: &str,
        value: &Value,
        exclude: Option<&str>,
    ) -> Result<bool, String> {
        let mut filter = Document::new();
        filter.insert(LIST_REF_FIELD.into(), list_id.into());
        filter.insert(field.into(), json!({ "$eq": value }));
        // Child lists share the parent's listid but are not its items.
        filter.insert(SCHEMA_FIELD.into(), json!({ "$exists": false }));
        if let Some(id) = exclude {
            filter.insert(ID_FIELD.into(), json!({ "$ne": id }));
        }
        self.store
            .find_one(self.collection, &filter)
            .await
            .map(|found| found.is_some())
            .map_err(|e| e.to_string())
    }
}
