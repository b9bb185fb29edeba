//! Filter compiler for sonlist.
//!
//! Filters are written in relaxed notation and compiled into a predicate
//! tree the document store evaluates. Compilation walks the tree depth-first
//! and expands the sonlist operators listed in [`Converter`]:
//!
//! ```
//! use serde_json::json;
//!
//! let tree = sonlist_filter::compile(r#"$contains: [$title, "milk"]"#).unwrap();
//! assert_eq!(
//!     serde_json::Value::Object(tree),
//!     json!({ "$gt": [{ "$indexOfCP": ["$title", "milk"] }, -1] })
//! );
//! ```
//!
//! Unknown `$` keys are passed through untouched (their children are still
//! compiled), and plain keys stay field equality predicates.

mod convert;
mod error;

pub use convert::{is_field_ref, Converter};
pub use error::{FilterError, FilterResult};

use serde_json::{Map, Value};
use sonlist_notation::SonInput;

/// Compiles relaxed filter text (or a parsed tree) into a store predicate.
pub fn compile<'a>(input: impl Into<SonInput<'a>>) -> FilterResult<Map<String, Value>> {
    let root = input.into().into_object()?;
    compile_object(root)
}

fn compile_object(object: Map<String, Value>) -> FilterResult<Map<String, Value>> {
    let mut out = Map::new();
    // Expansions whose key is already taken in this object.
    let mut extra = Vec::new();

    for (key, value) in object {
        match Converter::from_key(&key) {
            Some(converter) => {
                let (op, expr) = converter.expand(compile_value(value)?)?;
                if out.contains_key(&op) {
                    let mut clause = Map::new();
                    clause.insert(op, expr);
                    extra.push(Value::Object(clause));
                } else {
                    out.insert(op, expr);
                }
            }
            None => {
                out.insert(key, compile_value(value)?);
            }
        }
    }

    if !extra.is_empty() {
        let mut clauses = match out.remove("$and") {
            Some(Value::Array(existing)) => existing,
            Some(other) => vec![other],
            None => Vec::new(),
        };
        clauses.extend(extra);
        out.insert("$and".into(), Value::Array(clauses));
    }
    Ok(out)
}

fn compile_value(value: Value) -> FilterResult<Value> {
    match value {
        Value::Object(object) => Ok(Value::Object(compile_object(object)?)),
        Value::Array(items) => items
            .into_iter()
            .map(compile_value)
            .collect::<FilterResult<Vec<_>>>()
            .map(Value::Array),
        other => Ok(other),
    }
}
