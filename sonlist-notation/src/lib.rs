//! Relaxed object notation ("son") for sonlist.
//!
//! Schemas and filters are written in a tolerant superset of JSON:
//! - outer braces are optional (`a: string` == `{a: string}`)
//! - keys need no quotes
//! - bare word values become strings (`type: number` → `"number"`)
//! - a key with no value is `true` (`{required}` → `{"required": true}`)
//!
//! [`parse`] turns such text into a strict [`serde_json`] object tree.
//! Compilers that accept either text or an already parsed tree take a
//! [`SonInput`].

mod error;
mod parser;

pub use error::{NotationError, NotationResult};
pub use parser::{parse, MAX_DEPTH};

use serde_json::{Map, Value};

/// Either relaxed text or a tree that has already been parsed.
#[derive(Debug, Clone, Copy)]
pub enum SonInput<'a> {
    Text(&'a str),
    Tree(&'a Value),
}

impl<'a> SonInput<'a> {
    /// Resolves the input into an object tree, parsing text if needed.
    pub fn into_object(self) -> NotationResult<Map<String, Value>> {
        match self {
            Self::Text(text) => parse(text),
            Self::Tree(Value::Object(map)) => Ok(map.clone()),
            Self::Tree(other) => Err(NotationError::NotAnObject {
                found: json_type_name(other),
            }),
        }
    }
}

impl<'a> From<&'a str> for SonInput<'a> {
    fn from(text: &'a str) -> Self {
        Self::Text(text)
    }
}

impl<'a> From<&'a String> for SonInput<'a> {
    fn from(text: &'a String) -> Self {
        Self::Text(text)
    }
}

impl<'a> From<&'a Value> for SonInput<'a> {
    fn from(tree: &'a Value) -> Self {
        match tree {
            // A JSON string holding notation is treated as text.
            Value::String(text) => Self::Text(text),
            other => Self::Tree(other),
        }
    }
}

/// Returns the JSON type name of a value (`"string"`, `"number"`, ...).
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
