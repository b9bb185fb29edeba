use crate::error::StorageResult;
use crate::matcher::matches;
use crate::unique::UniqueConstraint;
use crate::update::apply_update;
use crate::{stamp_id, DeleteResult, DocumentStore};
use async_trait::async_trait;
use sonlist_types::Document;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// In-process store. Each collection is a vector in insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in `collection`.
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }
}

fn filter_docs<'a>(docs: &'a [Document], filter: &Document) -> StorageResult<Vec<&'a Document>> {
    let mut out = Vec::new();
    for doc in docs {
        if matches(doc, filter)? {
            out.push(doc);
        }
    }
    Ok(out)
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_one(&self, collection: &str, filter: &Document) -> StorageResult<Option<Document>> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(None);
        };
        for doc in docs {
            if matches(doc, filter)? {
                return Ok(Some(doc.clone()));
            }
        }
        Ok(None)
    }

    async fn find(&self, collection: &str, filter: &Document) -> StorageResult<Vec<Document>> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(filter_docs(docs, filter)?.into_iter().cloned().collect())
    }

    async fn insert_one(
        &self,
        collection: &str,
        mut doc: Document,
        unique: Option<&UniqueConstraint>,
    ) -> StorageResult<String> {
        let id = stamp_id(&mut doc);
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        if let Some(rule) = unique {
            rule.check(&doc, docs.iter())?;
        }
        docs.push(doc);
        debug!("Inserted {} into {}", id, collection);
        Ok(id)
    }

    async fn insert_many(
        &self,
        collection: &str,
        mut docs: Vec<Document>,
        unique: Option<&UniqueConstraint>,
    ) -> StorageResult<Vec<String>> {
        let ids: Vec<String> = docs.iter_mut().map(stamp_id).collect();
        let mut collections = self.collections.write().await;
        let stored = collections.entry(collection.to_string()).or_default();
        if let Some(rule) = unique {
            for (i, doc) in docs.iter().enumerate() {
                rule.check(doc, stored.iter().chain(&docs[..i]))?;
            }
        }
        stored.extend(docs);
        debug!("Inserted {} documents into {}", ids.len(), collection);
        Ok(ids)
    }

    async fn find_one_and_update(
        &self,
        collection: &str,
        filter: &Document,
        update: &Document,
        unique: Option<&UniqueConstraint>,
    ) -> StorageResult<Option<Document>> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(None);
        };
        let mut position = None;
        for (i, doc) in docs.iter().enumerate() {
            if matches(doc, filter)? {
                position = Some(i);
                break;
            }
        }
        let Some(position) = position else {
            return Ok(None);
        };

        let mut updated = docs[position].clone();
        apply_update(&mut updated, update)?;
        if let Some(rule) = unique {
            rule.check(&updated, docs.iter())?;
        }
        docs[position] = updated.clone();
        Ok(Some(updated))
    }

    async fn delete_one(&self, collection: &str, filter: &Document) -> StorageResult<DeleteResult> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(DeleteResult::default());
        };
        for i in 0..docs.len() {
            if matches(&docs[i], filter)? {
                docs.remove(i);
                return Ok(DeleteResult { deleted_count: 1 });
            }
        }
        Ok(DeleteResult::default())
    }

    async fn delete_many(&self, collection: &str, filter: &Document) -> StorageResult<DeleteResult> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(DeleteResult::default());
        };
        let mut keep = Vec::with_capacity(docs.len());
        for doc in docs.iter() {
            keep.push(!matches(doc, filter)?);
        }
        let before = docs.len();
        let mut flags = keep.into_iter();
        docs.retain(|_| flags.next().unwrap_or(true));
        let deleted_count = (before - docs.len()) as u64;
        debug!("Deleted {} documents from {}", deleted_count, collection);
        Ok(DeleteResult { deleted_count })
    }
}
