//! Item validation and sanitization against a compiled schema.

use crate::error::{ValidationError, ValidationResult};
use crate::lookup::{NoLookup, UniqueLookup};
use crate::schema::{FieldProperty, FieldSpec, FieldType, SchemaDef};
use serde_json::Value;
use sonlist_crypto::{hash_value, CryptoError, HashParams};
use sonlist_notation::json_type_name;
use sonlist_types::fields::LIST_REF_FIELD;
use sonlist_types::Document;
use std::collections::HashSet;
use zeroize::Zeroize;

static NO_LOOKUP: NoLookup = NoLookup;

/// How much of the schema an item must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Full items: required fields must be present.
    Strict,
    /// Partial updates: only supplied fields are checked. A supplied key
    /// counts as present even if its value is empty.
    Partial,
}

/// Validates and sanitizes items against one schema.
///
/// Every supplied schema field runs through its transforms in a fixed order
/// (type, lower, upper, unique, encrypt). The first violation aborts.
pub struct Validator<'a> {
    schema: &'a SchemaDef,
    hash_params: &'a HashParams,
    lookup: &'a dyn UniqueLookup,
    list_id: Option<&'a str>,
    exclude: Option<&'a str>,
}

impl<'a> Validator<'a> {
    /// Creates a validator with no uniqueness lookup.
    pub fn new(schema: &'a SchemaDef, hash_params: &'a HashParams) -> Self {
        Self {
            schema,
            hash_params,
            lookup: &NO_LOOKUP,
            list_id: None,
            exclude: None,
        }
    }

    /// Checks `unique` fields against other items of `list_id`.
    pub fn with_lookup(mut self, list_id: &'a str, lookup: &'a dyn UniqueLookup) -> Self {
        self.list_id = Some(list_id);
        self.lookup = lookup;
        self
    }

    /// Ignores `item_id` itself during uniqueness checks (for updates).
    pub fn excluding(mut self, item_id: &'a str) -> Self {
        self.exclude = Some(item_id);
        self
    }

    /// Validates one item and returns its sanitized form.
    pub async fn validate(&self, item: Document, mode: ValidationMode) -> ValidationResult<Document> {
        self.check_keys(&item, mode)?;

        let mut sanitized = Document::new();
        for (key, value) in item {
            let value = match self.schema.field(&key) {
                Some(field) => self.apply(field, value).await?,
                None => value,
            };
            sanitized.insert(key, value);
        }
        Ok(sanitized)
    }

    /// Validates a batch in order. The first failing entry aborts the batch.
    ///
    /// Entries of the same batch must not share a value in a `unique` field.
    pub async fn validate_batch(
        &self,
        items: Vec<Document>,
        mode: ValidationMode,
    ) -> ValidationResult<Vec<Document>> {
        let unique_fields = self.schema.unique_fields();
        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut out = Vec::with_capacity(items.len());

        for item in items {
            let sanitized = self.validate(item, mode).await?;
            for field in &unique_fields {
                if let Some(value) = sanitized.get(field) {
                    if !seen.insert((field.clone(), value.to_string())) {
                        return Err(ValidationError::NotUnique {
                            field: field.clone(),
                            value: value.clone(),
                        });
                    }
                }
            }
            out.push(sanitized);
        }
        Ok(out)
    }

    fn check_keys(&self, item: &Document, mode: ValidationMode) -> ValidationResult<()> {
        if mode == ValidationMode::Strict {
            if let Some(missing) = self.schema.required().iter().find(|f| !item.contains_key(*f)) {
                return Err(ValidationError::MissingField {
                    field: missing.clone(),
                });
            }
        }
        if let Some(unknown) = item
            .keys()
            .find(|k| k.as_str() != LIST_REF_FIELD && !self.schema.contains(k))
        {
            return Err(ValidationError::InvalidField {
                field: unknown.clone(),
            });
        }
        Ok(())
    }

    async fn apply(&self, field: &FieldSpec, mut value: Value) -> ValidationResult<Value> {
        for property in field.transforms() {
            value = match property {
                FieldProperty::Type => check_type(field, value)?,
                FieldProperty::Lower => fold_case(field, value, str::to_lowercase)?,
                FieldProperty::Upper => fold_case(field, value, str::to_uppercase)?,
                FieldProperty::Unique => self.check_unique(field, value).await?,
                FieldProperty::Encrypt => self.encrypt_off_thread(field, value).await?,
                FieldProperty::Required => value,
            };
        }
        Ok(value)
    }

    /// Argon2 is memory-hard, so hashing runs on the blocking pool rather
    /// than on an async worker.
    async fn encrypt_off_thread(&self, field: &FieldSpec, value: Value) -> ValidationResult<Value> {
        let params = self.hash_params.clone();
        let owned = field.clone();
        tokio::task::spawn_blocking(move || encrypt(&owned, value, &params))
            .await
            .map_err(|e| ValidationError::Hashing {
                field: field.name.clone(),
                source: CryptoError::Hashing(e.to_string()),
            })?
    }

    async fn check_unique(&self, field: &FieldSpec, value: Value) -> ValidationResult<Value> {
        let Some(list_id) = self.list_id else {
            return Ok(value);
        };
        let taken = self
            .lookup
            .is_taken(list_id, &field.name, &value, self.exclude)
            .await
            .map_err(|reason| ValidationError::Lookup {
                field: field.name.clone(),
                reason,
            })?;
        if taken {
            return Err(ValidationError::NotUnique {
                field: field.name.clone(),
                value,
            });
        }
        Ok(value)
    }
}

fn check_type(field: &FieldSpec, value: Value) -> ValidationResult<Value> {
    match field.field_type {
        Some(expected) if !expected.matches(&value) => Err(ValidationError::WrongType {
            field: field.name.clone(),
            expected: expected.name(),
            found: json_type_name(&value),
        }),
        _ => Ok(value),
    }
}

fn fold_case(field: &FieldSpec, value: Value, fold: fn(&str) -> String) -> ValidationResult<Value> {
    match value {
        Value::String(s) => Ok(Value::String(fold(&s))),
        other => Err(ValidationError::WrongType {
            field: field.name.clone(),
            expected: FieldType::String.name(),
            found: json_type_name(&other),
        }),
    }
}

fn encrypt(field: &FieldSpec, value: Value, params: &HashParams) -> ValidationResult<Value> {
    let mut plain = match value {
        Value::String(s) => s,
        other => other.to_string(),
    };
    let hash = hash_value(&plain, params);
    plain.zeroize();
    let hash = hash.map_err(|source| ValidationError::Hashing {
        field: field.name.clone(),
        source,
    })?;
    Ok(Value::String(hash))
}
