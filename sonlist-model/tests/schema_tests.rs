use pretty_assertions::assert_eq;
use serde_json::json;
use sonlist_model::{FieldProperty, FieldSpec, FieldType, SchemaDef, SchemaError};
use sonlist_notation::NotationError;

// ── Shorthand ────────────────────────────────────────────────────

#[test]
fn bare_names_are_untyped_fields() {
    let schema = SchemaDef::compile("name, note").unwrap();
    assert_eq!(
        schema.fields(),
        [FieldSpec::new("name"), FieldSpec::new("note")]
    );
    assert!(schema.required().is_empty());
}

#[test]
fn string_value_is_type_shorthand() {
    let schema = SchemaDef::compile("age: number, pass: encrypted_string").unwrap();
    assert_eq!(schema.field("age").unwrap().field_type, Some(FieldType::Number));
    assert!(schema.field("pass").unwrap().encrypts());
}

#[test]
fn property_map_with_flags() {
    let schema = SchemaDef::compile("email: {type: string, required, unique, lower}").unwrap();
    let email = schema.field("email").unwrap();
    assert_eq!(
        *email,
        FieldSpec::typed("email", FieldType::String)
            .required()
            .unique()
            .lower()
    );
    assert_eq!(schema.required(), ["email"]);
    assert_eq!(schema.unique_fields(), vec!["email".to_string()]);
}

#[test]
fn explicit_false_clears_a_flag() {
    let schema = SchemaDef::compile("a: {required: false}").unwrap();
    assert!(!schema.field("a").unwrap().required);
    assert!(schema.required().is_empty());
}

#[test]
fn braced_and_unbraced_compile_alike() {
    let a = SchemaDef::compile("title: {type: string, required}, done: boolean").unwrap();
    let b = SchemaDef::compile("{title: {type: string, required}, done: boolean}").unwrap();
    assert_eq!(a, b);
}

#[test]
fn compiles_from_a_parsed_tree() {
    let tree = json!({ "title": { "type": "string", "required": true } });
    let schema = SchemaDef::compile(&tree).unwrap();
    assert_eq!(schema.required(), ["title"]);
}

#[test]
fn empty_schema_has_no_fields() {
    let schema = SchemaDef::compile("").unwrap();
    assert!(schema.is_empty());
}

#[test]
fn field_order_is_declaration_order() {
    let schema = SchemaDef::compile("z, a: {required}, m: {required}").unwrap();
    let names: Vec<&str> = schema.fields().iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["z", "a", "m"]);
    assert_eq!(schema.required(), ["a", "m"]);
}

#[test]
fn encrypt_transform_is_last() {
    let schema = SchemaDef::compile("code: {type: string, upper, encrypt}").unwrap();
    assert_eq!(
        schema.field("code").unwrap().transforms(),
        vec![FieldProperty::Type, FieldProperty::Upper, FieldProperty::Encrypt]
    );
}

#[test]
fn list_meta_schema_covers_list_fields() {
    let meta = SchemaDef::list_meta();
    for name in ["name", "schema", "confperm", "writeperm", "readperm"] {
        assert_eq!(meta.field(name).unwrap().field_type, Some(FieldType::String));
    }
    assert!(meta.required().is_empty());
}

// ── Errors ───────────────────────────────────────────────────────

#[test]
fn unknown_property_is_invalid_parameter() {
    let err = SchemaDef::compile("a: {type: string, index}").unwrap_err();
    assert_eq!(
        err,
        SchemaError::InvalidSchemaParameter {
            parameter: "index".into(),
            field: "a".into(),
        }
    );
}

#[test]
fn nested_property_object_is_too_many_levels() {
    let err = SchemaDef::compile("a: {type: {of: string}}").unwrap_err();
    assert_eq!(err, SchemaError::TooManyLevels { field: "a".into() });
}

#[test]
fn unknown_type_is_rejected() {
    let err = SchemaDef::compile("a: date").unwrap_err();
    assert_eq!(
        err,
        SchemaError::UnknownType {
            field: "a".into(),
            type_name: "date".into(),
        }
    );
}

#[test]
fn non_boolean_flag_is_invalid_value() {
    let err = SchemaDef::compile("a: {required: 1}").unwrap_err();
    assert_eq!(
        err,
        SchemaError::InvalidPropertyValue {
            field: "a".into(),
            property: "required",
        }
    );
}

#[test]
fn number_field_spec_is_invalid() {
    let err = SchemaDef::compile("a: 3").unwrap_err();
    assert_eq!(err, SchemaError::InvalidFieldSpec { field: "a".into() });
}

#[test]
fn unique_and_encrypt_conflict() {
    let err = SchemaDef::compile("a: {unique, encrypt}").unwrap_err();
    assert_eq!(err, SchemaError::ConflictingProperties { field: "a".into() });

    let err = SchemaDef::compile("a: {type: encrypted_string, unique}").unwrap_err();
    assert_eq!(err, SchemaError::ConflictingProperties { field: "a".into() });
}

#[test]
fn malformed_text_carries_the_original() {
    let err = SchemaDef::compile("a: {type: string").unwrap_err();
    match err {
        SchemaError::Notation(inner) => assert_eq!(inner.text(), Some("a: {type: string")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn non_object_tree_is_rejected() {
    let tree = json!([1, 2]);
    let err = SchemaDef::compile(&tree).unwrap_err();
    assert_eq!(
        err,
        SchemaError::Notation(NotationError::NotAnObject { found: "array" })
    );
}

// ── Serde ────────────────────────────────────────────────────────

#[test]
fn field_type_serde_uses_snake_case() {
    let json = serde_json::to_string(&FieldType::EncryptedString).unwrap();
    assert_eq!(json, "\"encrypted_string\"");
}
