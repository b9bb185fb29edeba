//! Filter evaluation shared by every backend.
//!
//! A filter is an object whose entries must all hold. Entry forms:
//!
//! - `field: value`: equality (a stored array matches if it contains `value`)
//! - `field: {$op: arg, ...}`: query operators on the field
//! - `$and` / `$or` / `$nor: [filter, ...]`, `$not: filter`
//! - `$expr: expression`, or an expression operator used directly
//!   (`{$gt: [expr, expr]}`): the expression must evaluate truthy
//!
//! Expressions reference fields as `"$path"` strings.

use crate::error::{StorageError, StorageResult};
use serde_json::{Map, Value};
use sonlist_types::Document;
use std::cmp::Ordering;

/// Returns true if `doc` satisfies every entry of `filter`.
pub fn matches(doc: &Document, filter: &Map<String, Value>) -> StorageResult<bool> {
    for (key, condition) in filter {
        if !matches_entry(doc, key, condition)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Resolves a dotted path (`a.b.0`) inside a document.
pub fn lookup_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = doc.get(parts.next()?)?;
    for part in parts {
        current = match current {
            Value::Object(map) => map.get(part)?,
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn matches_entry(doc: &Document, key: &str, condition: &Value) -> StorageResult<bool> {
    match key {
        "$and" => {
            for clause in clauses(key, condition)? {
                if !matches(doc, clause)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        "$or" => {
            for clause in clauses(key, condition)? {
                if matches(doc, clause)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        "$nor" => {
            for clause in clauses(key, condition)? {
                if matches(doc, clause)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        "$not" => match condition {
            Value::Object(clause) => Ok(!matches(doc, clause)?),
            _ => Err(StorageError::InvalidQuery("$not expects a filter object".into())),
        },
        "$expr" => Ok(truthy(&eval(doc, condition)?)),
        op if op.starts_with('$') => Ok(truthy(&eval_operator(doc, op, condition)?)),
        path => matches_field(lookup_path(doc, path), condition),
    }
}

fn clauses<'a>(op: &str, condition: &'a Value) -> StorageResult<Vec<&'a Map<String, Value>>> {
    let Value::Array(items) = condition else {
        return Err(StorageError::InvalidQuery(format!("{op} expects an array of filters")));
    };
    items
        .iter()
        .map(|item| {
            item.as_object()
                .ok_or_else(|| StorageError::InvalidQuery(format!("{op} expects an array of filters")))
        })
        .collect()
}

fn matches_field(value: Option<&Value>, condition: &Value) -> StorageResult<bool> {
    match condition {
        Value::Object(ops) if is_operator_object(ops) => {
            for (op, arg) in ops {
                if !matches_operator(value, op, arg)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        expected => Ok(equals_or_contains(value, expected)),
    }
}

fn is_operator_object(map: &Map<String, Value>) -> bool {
    !map.is_empty() && map.keys().all(|k| k.starts_with('$'))
}

fn matches_operator(value: Option<&Value>, op: &str, arg: &Value) -> StorageResult<bool> {
    Ok(match op {
        "$eq" => equals_or_contains(value, arg),
        "$ne" => !equals_or_contains(value, arg),
        "$gt" | "$gte" | "$lt" | "$lte" => match value {
            Some(v) if same_kind(v, arg) => ordering_holds(op, compare(v, arg)),
            _ => false,
        },
        "$in" => in_list(op, arg)?.iter().any(|item| equals_or_contains(value, item)),
        "$nin" => !in_list(op, arg)?.iter().any(|item| equals_or_contains(value, item)),
        "$exists" => truthy(arg) == value.is_some(),
        "$not" => !matches_field(value, arg)?,
        other => return Err(StorageError::UnsupportedOperator(other.to_string())),
    })
}

fn in_list<'a>(op: &str, arg: &'a Value) -> StorageResult<&'a Vec<Value>> {
    arg.as_array()
        .ok_or_else(|| StorageError::InvalidQuery(format!("{op} expects an array")))
}

fn equals_or_contains(value: Option<&Value>, expected: &Value) -> bool {
    match value {
        Some(Value::Array(items)) if !expected.is_array() => {
            items.iter().any(|item| values_equal(item, expected))
        }
        Some(v) => values_equal(v, expected),
        None => expected.is_null(),
    }
}

/// Equality that treats `1` and `1.0` as the same number.
pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => compare(a, b) == Ordering::Equal,
        _ => a == b,
    }
}

fn same_kind(a: &Value, b: &Value) -> bool {
    type_rank(a) == type_rank(b)
}

fn ordering_holds(op: &str, ordering: Ordering) -> bool {
    match op {
        "$gt" => ordering == Ordering::Greater,
        "$gte" => ordering != Ordering::Less,
        "$lt" => ordering == Ordering::Less,
        "$lte" => ordering != Ordering::Greater,
        "$eq" => ordering == Ordering::Equal,
        _ => ordering != Ordering::Equal,
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Object(_) => 3,
        Value::Array(_) => 4,
        Value::Bool(_) => 5,
    }
}

/// Total order across JSON values: values of different types order by type.
fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Null, Value::Null) => Ordering::Equal,
        _ if type_rank(a) != type_rank(b) => type_rank(a).cmp(&type_rank(b)),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        _ => true,
    }
}

// ── Expressions ──────────────────────────────────────────────────

fn eval(doc: &Document, expr: &Value) -> StorageResult<Value> {
    match expr {
        Value::String(s) if s.len() > 1 && s.starts_with('$') => {
            Ok(lookup_path(doc, &s[1..]).cloned().unwrap_or(Value::Null))
        }
        Value::Object(map) if map.len() == 1 && is_operator_object(map) => {
            let (op, arg) = map.iter().next().ok_or_else(|| {
                StorageError::InvalidQuery("empty expression".into())
            })?;
            eval_operator(doc, op, arg)
        }
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, value) in map {
                out.insert(key.clone(), eval(doc, value)?);
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => items
            .iter()
            .map(|item| eval(doc, item))
            .collect::<StorageResult<Vec<_>>>()
            .map(Value::Array),
        literal => Ok(literal.clone()),
    }
}

fn eval_operator(doc: &Document, op: &str, arg: &Value) -> StorageResult<Value> {
    let args = match arg {
        Value::Array(items) => items
            .iter()
            .map(|item| eval(doc, item))
            .collect::<StorageResult<Vec<_>>>()?,
        single => vec![eval(doc, single)?],
    };

    match op {
        "$eq" | "$ne" | "$gt" | "$gte" | "$lt" | "$lte" => {
            let [a, b] = pair(op, args)?;
            Ok(Value::Bool(ordering_holds(op, compare(&a, &b))))
        }
        "$and" => Ok(Value::Bool(args.iter().all(truthy))),
        "$or" => Ok(Value::Bool(args.iter().any(truthy))),
        "$not" => Ok(Value::Bool(!args.first().is_some_and(truthy))),
        "$in" => {
            let [needle, list] = pair(op, args)?;
            let list = list
                .as_array()
                .ok_or_else(|| StorageError::InvalidQuery("$in expects an array".into()))?;
            Ok(Value::Bool(list.iter().any(|item| values_equal(item, &needle))))
        }
        "$indexOfCP" => {
            let [haystack, needle] = pair(op, args)?;
            index_of_code_point(&haystack, &needle)
        }
        "$toLower" => fold_case(op, args, str::to_lowercase),
        "$toUpper" => fold_case(op, args, str::to_uppercase),
        other => Err(StorageError::UnsupportedOperator(other.to_string())),
    }
}

fn pair(op: &str, args: Vec<Value>) -> StorageResult<[Value; 2]> {
    <[Value; 2]>::try_from(args)
        .map_err(|_| StorageError::InvalidQuery(format!("{op} expects two arguments")))
}

/// Code-point index of `needle` in `haystack`, `-1` if absent, null if the
/// haystack is missing.
fn index_of_code_point(haystack: &Value, needle: &Value) -> StorageResult<Value> {
    let haystack = match haystack {
        Value::Null => return Ok(Value::Null),
        Value::String(s) => s,
        _ => return Err(StorageError::InvalidQuery("$indexOfCP expects a string".into())),
    };
    let Value::String(needle) = needle else {
        return Err(StorageError::InvalidQuery("$indexOfCP expects a string substring".into()));
    };
    let index = match haystack.find(needle.as_str()) {
        Some(byte) => haystack[..byte].chars().count() as i64,
        None => -1,
    };
    Ok(Value::from(index))
}

fn fold_case(op: &str, args: Vec<Value>, fold: fn(&str) -> String) -> StorageResult<Value> {
    let [value] = <[Value; 1]>::try_from(args)
        .map_err(|_| StorageError::InvalidQuery(format!("{op} expects one argument")))?;
    match value {
        Value::Null => Ok(Value::String(String::new())),
        Value::String(s) => Ok(Value::String(fold(&s))),
        Value::Number(n) => Ok(Value::String(n.to_string())),
        _ => Err(StorageError::InvalidQuery(format!("{op} expects a string"))),
    }
}
