//! Converters from sonlist filter operators to store expressions.

use crate::error::{FilterError, FilterResult};
use serde_json::{json, Value};

/// Operators expanded at compile time. Every other `$` key is left for the
/// store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Converter {
    /// `$contains: [ref, needle]`: substring match.
    Contains,
    /// `$contains_i`: case-insensitive substring match.
    ContainsI,
    /// `$isexactly: [ref, value]`: equality.
    IsExactly,
    /// `$isexactly_i`: case-insensitive equality.
    IsExactlyI,
}

impl Converter {
    pub const ALL: [Converter; 4] = [
        Self::Contains,
        Self::ContainsI,
        Self::IsExactly,
        Self::IsExactlyI,
    ];

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key() == key)
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::Contains => "$contains",
            Self::ContainsI => "$contains_i",
            Self::IsExactly => "$isexactly",
            Self::IsExactlyI => "$isexactly_i",
        }
    }

    fn folds_case(&self) -> bool {
        matches!(self, Self::ContainsI | Self::IsExactlyI)
    }

    /// Expands `operands` into a single-key store expression.
    pub fn expand(&self, operands: Value) -> FilterResult<(String, Value)> {
        let [left, right] = self.split(operands)?;
        let (left, right) = if self.folds_case() {
            (fold(left), fold(right))
        } else {
            (left, right)
        };

        match self {
            Self::Contains | Self::ContainsI => {
                if !is_text_operand(&left) || !is_text_operand(&right) {
                    return Err(self.invalid("operands must be strings or field references"));
                }
                Ok(("$gt".into(), json!([{ "$indexOfCP": [left, right] }, -1])))
            }
            Self::IsExactly | Self::IsExactlyI => Ok(("$eq".into(), json!([left, right]))),
        }
    }

    fn split(&self, operands: Value) -> FilterResult<[Value; 2]> {
        let Value::Array(items) = operands else {
            return Err(self.invalid("expected a two-element array"));
        };
        <[Value; 2]>::try_from(items).map_err(|_| self.invalid("expected a two-element array"))
    }

    fn invalid(&self, reason: &'static str) -> FilterError {
        FilterError::InvalidOperands {
            operator: self.key(),
            reason,
        }
    }
}

/// True for strings that name a field path (`$field`, `$a.b`).
pub fn is_field_ref(value: &Value) -> bool {
    matches!(value, Value::String(s) if s.len() > 1 && s.starts_with('$'))
}

fn is_text_operand(value: &Value) -> bool {
    value.is_string() || value.is_object()
}

/// Lowercases a literal now, or wraps a reference so the store lowercases it.
fn fold(operand: Value) -> Value {
    if is_field_ref(&operand) || operand.is_object() {
        return json!({ "$toLower": operand });
    }
    match operand {
        Value::String(s) => Value::String(s.to_lowercase()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_roundtrip() {
        for c in Converter::ALL {
            assert_eq!(Converter::from_key(c.key()), Some(c));
        }
        assert_eq!(Converter::from_key("$regex"), None);
    }

    #[test]
    fn lone_dollar_is_a_literal() {
        assert!(!is_field_ref(&json!("$")));
        assert!(is_field_ref(&json!("$a.b")));
    }

    #[test]
    fn fold_leaves_numbers_alone() {
        assert_eq!(fold(json!(3)), json!(3));
        assert_eq!(fold(json!("AbC")), json!("abc"));
        assert_eq!(fold(json!("$f")), json!({ "$toLower": "$f" }));
    }
}
