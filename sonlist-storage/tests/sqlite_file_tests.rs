use serde_json::json;
use sonlist_storage::{id_filter, DocumentStore, SqliteStore};
use tempfile::TempDir;

#[tokio::test]
async fn documents_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sonlist.db");

    let id = {
        let store = SqliteStore::open(&path).unwrap();
        let doc = json!({ "name": "groceries", "schema": "item: string" });
        store
            .insert_one("items", doc.as_object().cloned().unwrap(), None)
            .await
            .unwrap()
    };

    let store = SqliteStore::open(&path).unwrap();
    let found = store.find_one("items", &id_filter(&id)).await.unwrap().unwrap();
    assert_eq!(found["name"], json!("groceries"));
}

#[tokio::test]
async fn collections_are_isolated() {
    let dir = TempDir::new().unwrap();
    let store = SqliteStore::open(dir.path().join("iso.db")).unwrap();
    let doc = json!({ "_id": "same" }).as_object().cloned().unwrap();
    store.insert_one("a", doc.clone(), None).await.unwrap();
    store.insert_one("b", doc, None).await.unwrap();

    assert!(store.find_one("a", &id_filter("same")).await.unwrap().is_some());
    assert_eq!(store.delete_many("a", &id_filter("same")).await.unwrap().deleted_count, 1);
    assert!(store.find_one("b", &id_filter("same")).await.unwrap().is_some());
}
