//! SQLite backend. Documents are stored as JSON bodies in one table keyed by
//! collection and id; filters are evaluated by the shared matcher.

use crate::error::{StorageError, StorageResult};
use crate::matcher::matches;
use crate::unique::UniqueConstraint;
use crate::update::apply_update;
use crate::{stamp_id, DeleteResult, DocumentStore};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use sonlist_types::fields::ID_FIELD;
use sonlist_types::Document;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Persistent document store backed by SQLite.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (or creates) a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        info!("Opened document store at {:?}", path);
        Self::with_connection(conn)
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StorageResult<Self> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS documents (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                body TEXT NOT NULL,
                UNIQUE(collection, id)
            );
            ",
        )?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` on the connection from the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&mut Connection) -> StorageResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| StorageError::LockPoisoned)?;
            f(&mut guard)
        })
        .await
        .map_err(|e| StorageError::Task(e.to_string()))?
    }
}

/// Loads a collection in insertion order as `(seq, document)` pairs.
fn load(conn: &Connection, collection: &str) -> StorageResult<Vec<(i64, Document)>> {
    let mut stmt = conn.prepare("SELECT seq, body FROM documents WHERE collection = ?1 ORDER BY seq")?;
    let rows = stmt.query_map(params![collection], |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut out = Vec::new();
    for row in rows {
        let (seq, body) = row?;
        out.push((seq, decode(&body)?));
    }
    Ok(out)
}

/// Loads only the documents matching `filter`.
fn load_matching(
    conn: &Connection,
    collection: &str,
    filter: &Document,
) -> StorageResult<Vec<(i64, Document)>> {
    // `{_id: "..."}` is answered by the index instead of a scan.
    if filter.len() == 1 {
        if let Some(Value::String(id)) = filter.get(ID_FIELD) {
            let body: Option<(i64, String)> = conn
                .query_row(
                    "SELECT seq, body FROM documents WHERE collection = ?1 AND id = ?2",
                    params![collection, id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            return match body {
                Some((seq, body)) => Ok(vec![(seq, decode(&body)?)]),
                None => Ok(Vec::new()),
            };
        }
    }

    let mut out = Vec::new();
    for (seq, doc) in load(conn, collection)? {
        if matches(&doc, filter)? {
            out.push((seq, doc));
        }
    }
    Ok(out)
}

fn decode(body: &str) -> StorageResult<Document> {
    match serde_json::from_str(body)? {
        Value::Object(doc) => Ok(doc),
        other => Err(StorageError::InvalidData(format!("stored body is not an object: {other}"))),
    }
}

fn insert_row(conn: &Connection, collection: &str, id: &str, doc: &Document) -> StorageResult<()> {
    conn.execute(
        "INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3)",
        params![collection, id, serde_json::to_string(doc)?],
    )?;
    Ok(())
}

fn delete_rows(conn: &Connection, seqs: &[i64]) -> StorageResult<u64> {
    let mut stmt = conn.prepare("DELETE FROM documents WHERE seq = ?1")?;
    let mut deleted = 0;
    for seq in seqs {
        deleted += stmt.execute(params![seq])? as u64;
    }
    Ok(deleted)
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn find_one(&self, collection: &str, filter: &Document) -> StorageResult<Option<Document>> {
        let (collection, filter) = (collection.to_string(), filter.clone());
        self.with_conn(move |conn| {
            Ok(load_matching(conn, &collection, &filter)?
                .into_iter()
                .next()
                .map(|(_, doc)| doc))
        })
        .await
    }

    async fn find(&self, collection: &str, filter: &Document) -> StorageResult<Vec<Document>> {
        let (collection, filter) = (collection.to_string(), filter.clone());
        self.with_conn(move |conn| {
            Ok(load_matching(conn, &collection, &filter)?
                .into_iter()
                .map(|(_, doc)| doc)
                .collect())
        })
        .await
    }

    async fn insert_one(
        &self,
        collection: &str,
        doc: Document,
        unique: Option<&UniqueConstraint>,
    ) -> StorageResult<String> {
        let ids = self.insert_many(collection, vec![doc], unique).await?;
        ids.into_iter()
            .next()
            .ok_or_else(|| StorageError::InvalidData("insert returned no id".into()))
    }

    async fn insert_many(
        &self,
        collection: &str,
        mut docs: Vec<Document>,
        unique: Option<&UniqueConstraint>,
    ) -> StorageResult<Vec<String>> {
        let ids: Vec<String> = docs.iter_mut().map(stamp_id).collect();
        let (collection, unique) = (collection.to_string(), unique.cloned());
        let count = docs.len();

        let ids = self
            .with_conn(move |conn| {
                let tx = conn.transaction()?;
                if let Some(rule) = &unique {
                    let existing: Vec<Document> =
                        load(&tx, &collection)?.into_iter().map(|(_, doc)| doc).collect();
                    for (i, doc) in docs.iter().enumerate() {
                        rule.check(doc, existing.iter().chain(&docs[..i]))?;
                    }
                }
                for (id, doc) in ids.iter().zip(&docs) {
                    insert_row(&tx, &collection, id, doc)?;
                }
                tx.commit()?;
                Ok(ids)
            })
            .await?;
        debug!("Inserted {} documents", count);
        Ok(ids)
    }

    async fn find_one_and_update(
        &self,
        collection: &str,
        filter: &Document,
        update: &Document,
        unique: Option<&UniqueConstraint>,
    ) -> StorageResult<Option<Document>> {
        let (collection, filter, update) = (collection.to_string(), filter.clone(), update.clone());
        let unique = unique.cloned();

        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let Some((seq, mut doc)) = load_matching(&tx, &collection, &filter)?.into_iter().next() else {
                return Ok(None);
            };
            apply_update(&mut doc, &update)?;
            if let Some(rule) = &unique {
                let existing: Vec<Document> =
                    load(&tx, &collection)?.into_iter().map(|(_, doc)| doc).collect();
                rule.check(&doc, &existing)?;
            }
            tx.execute(
                "UPDATE documents SET body = ?1 WHERE seq = ?2",
                params![serde_json::to_string(&doc)?, seq],
            )?;
            tx.commit()?;
            Ok(Some(doc))
        })
        .await
    }

    async fn delete_one(&self, collection: &str, filter: &Document) -> StorageResult<DeleteResult> {
        let (collection, filter) = (collection.to_string(), filter.clone());
        self.with_conn(move |conn| {
            let seqs: Vec<i64> = load_matching(conn, &collection, &filter)?
                .into_iter()
                .take(1)
                .map(|(seq, _)| seq)
                .collect();
            Ok(DeleteResult {
                deleted_count: delete_rows(conn, &seqs)?,
            })
        })
        .await
    }

    async fn delete_many(&self, collection: &str, filter: &Document) -> StorageResult<DeleteResult> {
        let (collection, filter) = (collection.to_string(), filter.clone());
        let result = self
            .with_conn(move |conn| {
                let tx = conn.transaction()?;
                let seqs: Vec<i64> = load_matching(&tx, &collection, &filter)?
                    .into_iter()
                    .map(|(seq, _)| seq)
                    .collect();
                let deleted_count = delete_rows(&tx, &seqs)?;
                tx.commit()?;
                Ok(DeleteResult { deleted_count })
            })
            .await?;
        debug!("Deleted {} documents", result.deleted_count);
        Ok(result)
    }
}
