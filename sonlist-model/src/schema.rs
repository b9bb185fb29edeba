use crate::error::{SchemaError, SchemaResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sonlist_notation::SonInput;
use sonlist_types::fields;

/// The declared runtime type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Object,
    Array,
    /// A string that is always stored hashed. Exempt from the plain type check.
    EncryptedString,
}

impl FieldType {
    /// Parses a type keyword as written in a schema.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "object" => Some(Self::Object),
            "array" => Some(Self::Array),
            "encrypted_string" => Some(Self::EncryptedString),
            _ => None,
        }
    }

    /// Returns the keyword used in schema text.
    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
            Self::EncryptedString => "encrypted_string",
        }
    }

    /// Returns true if `value` has this runtime type.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
            Self::EncryptedString => true,
        }
    }
}

/// The closed set of properties a field may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldProperty {
    Type,
    Required,
    Unique,
    Lower,
    Upper,
    Encrypt,
}

impl FieldProperty {
    pub const ALL: [FieldProperty; 6] = [
        Self::Type,
        Self::Required,
        Self::Unique,
        Self::Lower,
        Self::Upper,
        Self::Encrypt,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Type => "type",
            Self::Required => "required",
            Self::Unique => "unique",
            Self::Lower => "lower",
            Self::Upper => "upper",
            Self::Encrypt => "encrypt",
        }
    }
}

/// Compiled properties of one schema field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    /// `None` for untyped fields, which accept any value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub lower: bool,
    #[serde(default)]
    pub upper: bool,
    #[serde(default)]
    pub encrypt: bool,
}

impl FieldSpec {
    /// An untyped field with no properties.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: None,
            required: false,
            unique: false,
            lower: false,
            upper: false,
            encrypt: false,
        }
    }

    /// Shorthand for a field of the given type.
    pub fn typed(name: impl Into<String>, field_type: FieldType) -> Self {
        Self::new(name).with_type(field_type)
    }

    pub fn with_type(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn lower(mut self) -> Self {
        self.lower = true;
        self
    }

    pub fn upper(mut self) -> Self {
        self.upper = true;
        self
    }

    pub fn encrypted(mut self) -> Self {
        self.encrypt = true;
        self
    }

    /// True if values of this field are stored hashed.
    pub fn encrypts(&self) -> bool {
        self.encrypt || self.field_type == Some(FieldType::EncryptedString)
    }

    /// The transforms applied to a supplied value, in application order.
    ///
    /// `required` is a presence rule, not a transform, and never appears.
    pub fn transforms(&self) -> Vec<FieldProperty> {
        let mut out = Vec::new();
        if matches!(self.field_type, Some(t) if t != FieldType::EncryptedString) {
            out.push(FieldProperty::Type);
        }
        if self.lower {
            out.push(FieldProperty::Lower);
        }
        if self.upper {
            out.push(FieldProperty::Upper);
        }
        if self.unique {
            out.push(FieldProperty::Unique);
        }
        if self.encrypts() {
            out.push(FieldProperty::Encrypt);
        }
        out
    }

    fn set_property(&mut self, property: FieldProperty, value: &Value) -> SchemaResult<()> {
        if property == FieldProperty::Type {
            return self.set_type(value);
        }
        let flag = value.as_bool().ok_or_else(|| SchemaError::InvalidPropertyValue {
            field: self.name.clone(),
            property: property.name(),
        })?;
        match property {
            FieldProperty::Required => self.required = flag,
            FieldProperty::Unique => self.unique = flag,
            FieldProperty::Lower => self.lower = flag,
            FieldProperty::Upper => self.upper = flag,
            FieldProperty::Encrypt => self.encrypt = flag,
            FieldProperty::Type => {}
        }
        Ok(())
    }

    fn set_type(&mut self, value: &Value) -> SchemaResult<()> {
        let type_name = value.as_str().ok_or_else(|| SchemaError::InvalidPropertyValue {
            field: self.name.clone(),
            property: FieldProperty::Type.name(),
        })?;
        let field_type = FieldType::from_name(type_name).ok_or_else(|| SchemaError::UnknownType {
            field: self.name.clone(),
            type_name: type_name.to_string(),
        })?;
        self.field_type = Some(field_type);
        Ok(())
    }
}

/// A compiled list schema: ordered field specs plus the required-field list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDef {
    fields: Vec<FieldSpec>,
    required: Vec<String>,
}

impl SchemaDef {
    /// Compiles relaxed schema text (or an already parsed tree).
    ///
    /// ```
    /// use sonlist_model::{FieldType, SchemaDef};
    ///
    /// let schema = SchemaDef::compile("title: {type: string, required}, secret: encrypted_string").unwrap();
    /// assert_eq!(schema.required(), ["title"]);
    /// assert_eq!(schema.field("secret").unwrap().field_type, Some(FieldType::EncryptedString));
    /// ```
    pub fn compile<'a>(input: impl Into<SonInput<'a>>) -> SchemaResult<Self> {
        let root = input.into().into_object()?;
        let mut schema = Self::default();
        for (name, spec) in &root {
            schema.push(compile_field(name, spec)?);
        }
        Ok(schema)
    }

    /// Builds a schema from already compiled field specs.
    pub fn from_fields(fields: impl IntoIterator<Item = FieldSpec>) -> Self {
        let mut schema = Self::default();
        for field in fields {
            schema.push(field);
        }
        schema
    }

    /// The schema every list document's own fields are validated against.
    pub fn list_meta() -> Self {
        Self::from_fields([
            FieldSpec::typed(fields::NAME_FIELD, FieldType::String),
            FieldSpec::typed(fields::SCHEMA_FIELD, FieldType::String),
            FieldSpec::typed(fields::CONF_PERM_FIELD, FieldType::String),
            FieldSpec::typed(fields::WRITE_PERM_FIELD, FieldType::String),
            FieldSpec::typed(fields::READ_PERM_FIELD, FieldType::String),
        ])
    }

    fn push(&mut self, field: FieldSpec) {
        self.fields.retain(|f| f.name != field.name);
        self.required.retain(|r| *r != field.name);
        if field.required {
            self.required.push(field.name.clone());
        }
        self.fields.push(field);
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Names of required fields, in declaration order.
    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Names of fields marked `unique`.
    pub fn unique_fields(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| f.unique)
            .map(|f| f.name.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn compile_field(name: &str, spec: &Value) -> SchemaResult<FieldSpec> {
    let mut field = FieldSpec::new(name);
    match spec {
        // `secret: encrypted_string`
        Value::String(_) => field.set_property(FieldProperty::Type, spec)?,
        // `{note}`
        Value::Bool(true) => {}
        Value::Object(properties) => compile_properties(&mut field, properties)?,
        _ => {
            return Err(SchemaError::InvalidFieldSpec {
                field: name.to_string(),
            })
        }
    }

    if field.unique && field.encrypts() {
        return Err(SchemaError::ConflictingProperties {
            field: name.to_string(),
        });
    }
    Ok(field)
}

fn compile_properties(field: &mut FieldSpec, properties: &Map<String, Value>) -> SchemaResult<()> {
    for (key, value) in properties {
        let property =
            FieldProperty::from_name(key).ok_or_else(|| SchemaError::InvalidSchemaParameter {
                parameter: key.clone(),
                field: field.name.clone(),
            })?;
        if value.is_object() {
            return Err(SchemaError::TooManyLevels {
                field: field.name.clone(),
            });
        }
        field.set_property(property, value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_names_roundtrip() {
        for property in FieldProperty::ALL {
            assert_eq!(FieldProperty::from_name(property.name()), Some(property));
        }
        assert_eq!(FieldProperty::from_name("index"), None);
    }

    #[test]
    fn type_names_roundtrip() {
        for t in [
            FieldType::String,
            FieldType::Number,
            FieldType::Boolean,
            FieldType::Object,
            FieldType::Array,
            FieldType::EncryptedString,
        ] {
            assert_eq!(FieldType::from_name(t.name()), Some(t));
        }
    }

    #[test]
    fn transforms_order_is_fixed() {
        let field = FieldSpec::typed("f", FieldType::String).lower().upper().encrypted();
        assert_eq!(
            field.transforms(),
            vec![
                FieldProperty::Type,
                FieldProperty::Lower,
                FieldProperty::Upper,
                FieldProperty::Encrypt
            ]
        );
    }

    #[test]
    fn encrypted_string_skips_type_check() {
        let field = FieldSpec::typed("f", FieldType::EncryptedString);
        assert_eq!(field.transforms(), vec![FieldProperty::Encrypt]);
    }

    #[test]
    fn redeclared_field_replaces_earlier_one() {
        let schema = SchemaDef::from_fields([
            FieldSpec::new("a").required(),
            FieldSpec::typed("a", FieldType::Number),
        ]);
        assert_eq!(schema.fields().len(), 1);
        assert!(schema.required().is_empty());
    }
}
