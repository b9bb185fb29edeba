use crate::config::ServiceConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::lookup::StoreLookup;
use serde::Serialize;
use serde_json::{json, Value};
use sonlist_model::{get_str, ListRecord, SchemaDef, ValidationMode, Validator};
use sonlist_permissions::{Access, ListPermissions, PermissionError, PermissionEvaluator};
use sonlist_storage::{id_filter, DeleteResult, DocumentStore, UniqueConstraint};
use sonlist_types::fields::{
    BATCH_FIELD, CONF_PERM_FIELD, ID_FIELD, LIST_REF_FIELD, NAME_FIELD, OWNER_FIELD, READ_PERM_FIELD,
    SCHEMA_FIELD, WRITE_PERM_FIELD,
};
use sonlist_types::{document_id, is_list, Document, DocumentId};
use std::sync::Arc;
use tracing::{debug, info};

/// Result of a create: one document, or every entry of a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Created {
    One(Document),
    Many(Vec<Document>),
}

impl Created {
    pub fn documents(&self) -> Vec<&Document> {
        match self {
            Self::One(doc) => vec![doc],
            Self::Many(docs) => docs.iter().collect(),
        }
    }
}

/// A fetched document, with its children when it is a list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fetched {
    #[serde(flatten)]
    pub document: Document,
    #[serde(rename = "_items", skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Document>>,
}

/// Orchestrates permission checks, validation and storage for lists and
/// their items.
///
/// Schemas are compiled from the stored list on every request, so a schema
/// edit applies to the next write.
pub struct ItemService {
    store: Arc<dyn DocumentStore>,
    config: ServiceConfig,
    permissions: PermissionEvaluator,
}

impl ItemService {
    pub fn new(store: Arc<dyn DocumentStore>, config: ServiceConfig) -> Self {
        let permissions = config.evaluator();
        Self {
            store,
            config,
            permissions,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn permissions(&self) -> &PermissionEvaluator {
        &self.permissions
    }

    // ── Create ───────────────────────────────────────────────────

    /// Creates a list, an item, or a batch of items.
    ///
    /// A body without `listid`, or with a `schema`, is a list. A body with
    /// `_items` is a batch for the list named by its `listid`.
    pub async fn validate_and_create(&self, user: &str, body: Document) -> ServiceResult<Created> {
        if is_list(&body) {
            return self.create_list(user, body).await.map(Created::One);
        }

        let list_id = required_str(&body, LIST_REF_FIELD)?.to_string();
        let list = self.load_list(&list_id).await?;
        self.authorize(user, &list, Access::Write)?;
        let schema = compile_schema(&list)?;
        let lookup = self.lookup();
        let validator = Validator::new(&schema, &self.config.hash).with_lookup(&list_id, &lookup);
        let unique = unique_constraint(&schema);

        if body.contains_key(BATCH_FIELD) {
            let entries = batch_entries(body, &list_id)?;
            let mut docs = validator.validate_batch(entries, ValidationMode::Strict).await?;
            let ids = self
                .store
                .insert_many(&self.config.collection, docs.clone(), unique.as_ref())
                .await?;
            for (doc, id) in docs.iter_mut().zip(ids) {
                doc.insert(ID_FIELD.into(), id.into());
            }
            info!("Created {} items in list {}", docs.len(), list_id);
            return Ok(Created::Many(docs));
        }

        let mut doc = validator.validate(body, ValidationMode::Strict).await?;
        let id = self
            .store
            .insert_one(&self.config.collection, doc.clone(), unique.as_ref())
            .await?;
        debug!("Created item {} in list {}", id, list_id);
        doc.insert(ID_FIELD.into(), id.into());
        Ok(Created::One(doc))
    }

    async fn create_list(&self, user: &str, mut body: Document) -> ServiceResult<Document> {
        if self.permissions.is_anonymous(user) {
            return Err(PermissionError::Forbidden {
                user: user.to_string(),
                access: "create lists",
            }
            .into());
        }

        let parent = match body.remove(LIST_REF_FIELD) {
            None => None,
            Some(Value::String(parent)) => {
                let parent_list = self.load_list(&parent).await?;
                self.authorize(user, &parent_list, Access::Write)?;
                Some(parent)
            }
            Some(_) => return Err(ServiceError::BadRequest(format!("{LIST_REF_FIELD} must be a string"))),
        };

        let meta = SchemaDef::list_meta();
        let fields = Validator::new(&meta, &self.config.hash)
            .validate(body, ValidationMode::Strict)
            .await?;
        let mut record = ListRecord::new(DocumentId::new().to_string(), user);
        record.parent = parent;
        for (key, value) in fields {
            if let Value::String(value) = value {
                set_list_field(&mut record, &key, value);
            }
        }
        SchemaDef::compile(record.schema.as_str())?;

        let doc = record
            .to_document()
            .map_err(|e| ServiceError::BadRequest(e.to_string()))?;
        self.store
            .insert_one(&self.config.collection, doc.clone(), None)
            .await?;
        info!("Created list {} for {}", record.id, user);
        Ok(doc)
    }

    // ── Patch ────────────────────────────────────────────────────

    /// Applies a partial update to a list or an item.
    ///
    /// Only supplied fields are validated; a supplied key counts as present
    /// whatever its value.
    pub async fn validate_and_patch(
        &self,
        user: &str,
        item_id: &str,
        patch: Document,
    ) -> ServiceResult<Document> {
        let existing = self.load(item_id).await?;
        if patch.contains_key(LIST_REF_FIELD) {
            return Err(ServiceError::BadRequest(format!("{LIST_REF_FIELD} cannot be changed")));
        }

        if is_list(&existing) {
            let list = read_list(&existing)?;
            self.authorize(user, &list, Access::Configure)?;
            let meta = SchemaDef::list_meta();
            let fields = Validator::new(&meta, &self.config.hash)
                .validate(patch, ValidationMode::Partial)
                .await?;
            if let Some(Value::String(schema)) = fields.get(SCHEMA_FIELD) {
                SchemaDef::compile(schema.as_str())?;
            }
            let updated = self.set(item_id, fields, None).await?;
            info!("Reconfigured list {}", item_id);
            return Ok(updated);
        }

        let list_id = required_str(&existing, LIST_REF_FIELD)?.to_string();
        let list = self.load_list(&list_id).await?;
        self.authorize(user, &list, Access::Write)?;
        let schema = compile_schema(&list)?;
        let lookup = self.lookup();
        let fields = Validator::new(&schema, &self.config.hash)
            .with_lookup(&list_id, &lookup)
            .excluding(item_id)
            .validate(patch, ValidationMode::Partial)
            .await?;
        let updated = self.set(item_id, fields, unique_constraint(&schema)).await?;
        debug!("Patched item {} in list {}", item_id, list_id);
        Ok(updated)
    }

    async fn set(
        &self,
        id: &str,
        fields: Document,
        unique: Option<UniqueConstraint>,
    ) -> ServiceResult<Document> {
        let mut update = Document::new();
        update.insert("$set".into(), Value::Object(fields));
        self.store
            .find_one_and_update(&self.config.collection, &id_filter(id), &update, unique.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))
    }

    // ── Fetch ────────────────────────────────────────────────────

    /// Fetches a list or an item.
    ///
    /// For a list, the documents referencing it are returned as children,
    /// narrowed by `filter` if given, unless `exclude_children` is set.
    pub async fn fetch(
        &self,
        user: &str,
        item_id: &str,
        filter: Option<&str>,
        exclude_children: bool,
    ) -> ServiceResult<Fetched> {
        let document = self.load(item_id).await?;

        if !is_list(&document) {
            let list_id = required_str(&document, LIST_REF_FIELD)?;
            let list = self.load_list(list_id).await?;
            self.authorize(user, &list, Access::Read)?;
            return Ok(Fetched {
                document,
                children: None,
            });
        }

        let list = read_list(&document)?;
        self.authorize(user, &list, Access::Read)?;
        if exclude_children {
            return Ok(Fetched {
                document,
                children: None,
            });
        }

        let mut query = Document::new();
        query.insert(LIST_REF_FIELD.into(), item_id.into());
        if let Some(text) = filter.filter(|t| !t.trim().is_empty()) {
            let compiled = sonlist_filter::compile(text)?;
            query = and(query, compiled);
        }
        let children = self.store.find(&self.config.collection, &query).await?;
        debug!("Fetched list {} with {} children", item_id, children.len());
        Ok(Fetched {
            document,
            children: Some(children),
        })
    }

    // ── Delete ───────────────────────────────────────────────────

    /// Deletes an item, or a list together with everything beneath it.
    pub async fn delete_item(&self, user: &str, item_id: &str) -> ServiceResult<DeleteResult> {
        let document = self.load(item_id).await?;

        if is_list(&document) {
            let list = read_list(&document)?;
            self.authorize(user, &list, Access::Configure)?;
            let result = self.delete_tree(item_id).await?;
            info!("Deleted list {} ({} documents)", item_id, result.deleted_count);
            return Ok(result);
        }

        let list_id = required_str(&document, LIST_REF_FIELD)?;
        let list = self.load_list(list_id).await?;
        self.authorize(user, &list, Access::Write)?;
        Ok(self
            .store
            .delete_one(&self.config.collection, &id_filter(item_id))
            .await?)
    }

    /// Deletes everything (administrator) or every list the caller owns.
    pub async fn delete_all(&self, user: &str) -> ServiceResult<DeleteResult> {
        if self.permissions.is_admin(user) {
            let result = self
                .store
                .delete_many(&self.config.collection, &Document::new())
                .await?;
            info!("Administrator wiped {} documents", result.deleted_count);
            return Ok(result);
        }
        if self.permissions.is_anonymous(user) {
            return Err(PermissionError::Forbidden {
                user: user.to_string(),
                access: "delete lists",
            }
            .into());
        }

        let mut owned = Document::new();
        owned.insert(OWNER_FIELD.into(), user.into());
        owned.insert(SCHEMA_FIELD.into(), json!({ "$exists": true }));
        let lists = self.store.find(&self.config.collection, &owned).await?;

        let mut deleted_count = 0;
        for list in &lists {
            if let Some(id) = document_id(list) {
                deleted_count += self.delete_tree(id).await?.deleted_count;
            }
        }
        info!("Deleted {} lists owned by {}", lists.len(), user);
        Ok(DeleteResult { deleted_count })
    }

    /// Deletes a list, its child lists recursively, and all their items.
    async fn delete_tree(&self, list_id: &str) -> ServiceResult<DeleteResult> {
        let mut pending = vec![list_id.to_string()];
        let mut deleted_count = 0;

        while let Some(id) = pending.pop() {
            let mut children = Document::new();
            children.insert(LIST_REF_FIELD.into(), id.as_str().into());
            children.insert(SCHEMA_FIELD.into(), json!({ "$exists": true }));
            for child in self.store.find(&self.config.collection, &children).await? {
                if let Some(child_id) = document_id(&child) {
                    pending.push(child_id.to_string());
                }
            }

            let mut items = Document::new();
            items.insert(LIST_REF_FIELD.into(), id.as_str().into());
            deleted_count += self
                .store
                .delete_many(&self.config.collection, &items)
                .await?
                .deleted_count;
            deleted_count += self
                .store
                .delete_one(&self.config.collection, &id_filter(&id))
                .await?
                .deleted_count;
        }
        Ok(DeleteResult { deleted_count })
    }

    // ── Helpers ──────────────────────────────────────────────────

    fn lookup(&self) -> StoreLookup<'_> {
        StoreLookup {
            store: self.store.as_ref(),
            collection: &self.config.collection,
        }
    }

    /// Loads a document by id.
    async fn load(&self, id: &str) -> ServiceResult<Document> {
        if !self.store.is_valid_id(id) {
            return Err(ServiceError::InvalidId(id.to_string()));
        }
        self.store
            .find_one(&self.config.collection, &id_filter(id))
            .await?
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))
    }

    async fn load_list(&self, id: &str) -> ServiceResult<ListRecord> {
        let doc = self.load(id).await?;
        if !is_list(&doc) {
            return Err(ServiceError::NotAList(id.to_string()));
        }
        read_list(&doc)
    }

    fn authorize(&self, user: &str, list: &ListRecord, access: Access) -> ServiceResult<()> {
        let perms = ListPermissions {
            owner: &list.owner,
            conf: &list.conf_perm,
            write: &list.write_perm,
            read: &list.read_perm,
        };
        self.permissions.check(user, &perms, access)?;
        Ok(())
    }
}

fn read_list(doc: &Document) -> ServiceResult<ListRecord> {
    ListRecord::from_document(doc).map_err(|e| ServiceError::CorruptList {
        id: document_id(doc).unwrap_or_default().to_string(),
        reason: e.to_string(),
    })
}

fn compile_schema(list: &ListRecord) -> ServiceResult<SchemaDef> {
    SchemaDef::compile(list.schema.as_str()).map_err(|e| ServiceError::CorruptList {
        id: list.id.clone(),
        reason: e.to_string(),
    })
}

fn unique_constraint(schema: &SchemaDef) -> Option<UniqueConstraint> {
    let fields = schema.unique_fields();
    if fields.is_empty() {
        None
    } else {
        Some(UniqueConstraint::new(LIST_REF_FIELD, fields))
    }
}

fn required_str<'a>(doc: &'a Document, field: &str) -> ServiceResult<&'a str> {
    get_str(doc, field).ok_or_else(|| ServiceError::BadRequest(format!("{field} must be a string")))
}

/// Unpacks `{listid, _items: [...]}` and stamps each entry with the list id.
fn batch_entries(mut body: Document, list_id: &str) -> ServiceResult<Vec<Document>> {
    let Some(Value::Array(entries)) = body.remove(BATCH_FIELD) else {
        return Err(ServiceError::BadRequest(format!("{BATCH_FIELD} must be an array")));
    };
    body.remove(LIST_REF_FIELD);
    if let Some(extra) = body.keys().next() {
        return Err(ServiceError::BadRequest(format!(
            "unexpected field {extra:?} next to {BATCH_FIELD}"
        )));
    }

    entries
        .into_iter()
        .map(|entry| match entry {
            Value::Object(mut doc) => {
                doc.insert(LIST_REF_FIELD.into(), list_id.into());
                Ok(doc)
            }
            _ => Err(ServiceError::BadRequest(format!(
                "{BATCH_FIELD} entries must be objects"
            ))),
        })
        .collect()
}

/// Copies one validated meta-schema field onto a list record.
fn set_list_field(record: &mut ListRecord, key: &str, value: String) {
    match key {
        NAME_FIELD => record.name = Some(value),
        SCHEMA_FIELD => record.schema = value,
        CONF_PERM_FIELD => record.conf_perm = value,
        WRITE_PERM_FIELD => record.write_perm = value,
        READ_PERM_FIELD => record.read_perm = value,
        _ => {}
    }
}

fn and(left: Document, right: Document) -> Document {
    if right.is_empty() {
        return left;
    }
    let mut out = Document::new();
    out.insert("$and".into(), json!([left, right]));
    out
}
