use serde::{Deserialize, Serialize};
use sonlist_types::fields::PERM_LIST_OWNER;
use sonlist_types::Document;

/// A typed view of a list document.
///
/// Lists and items share one collection; a list is recognised by its
/// `schema` field (or by the absence of a `listid`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRecord {
    #[serde(rename = "_id")]
    pub id: String,
    /// Parent list, for lists nested under another list.
    #[serde(rename = "listid", default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub owner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Schema text, recompiled on every validation.
    #[serde(default)]
    pub schema: String,
    #[serde(rename = "confperm", default = "default_perm")]
    pub conf_perm: String,
    #[serde(rename = "writeperm", default = "default_perm")]
    pub write_perm: String,
    #[serde(rename = "readperm", default = "default_perm")]
    pub read_perm: String,
}

fn default_perm() -> String {
    PERM_LIST_OWNER.to_string()
}

impl ListRecord {
    /// A new top-level list with an empty schema and owner-only permissions.
    pub fn new(id: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent: None,
            owner: owner.into(),
            name: None,
            schema: String::new(),
            conf_perm: default_perm(),
            write_perm: default_perm(),
            read_perm: default_perm(),
        }
    }

    /// Reads a list from a stored document.
    pub fn from_document(doc: &Document) -> Result<Self, serde_json::Error> {
        serde_json::from_value(serde_json::Value::Object(doc.clone()))
    }

    /// Converts the record back into a document.
    pub fn to_document(&self) -> Result<Document, serde_json::Error> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            _ => Ok(Document::new()),
        }
    }
}

/// Extract a string field from a document.
pub fn get_str<'a>(doc: &'a Document, field: &str) -> Option<&'a str> {
    doc.get(field).and_then(|v| v.as_str())
}
