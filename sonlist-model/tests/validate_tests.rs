use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use sonlist_crypto::{verify_value, HashParams};
use sonlist_model::{SchemaDef, UniqueLookup, ValidationError, ValidationMode, Validator};
use sonlist_types::Document;
use std::sync::Mutex;

fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

fn params() -> HashParams {
    HashParams::insecure_fast()
}

/// Lookup backed by a fixed set of taken (field, value) pairs.
struct TakenValues {
    taken: Vec<(String, Value, String)>,
    calls: Mutex<Vec<Option<String>>>,
}

impl TakenValues {
    fn new(taken: &[(&str, Value, &str)]) -> Self {
        Self {
            taken: taken
                .iter()
                .map(|(f, v, id)| (f.to_string(), v.clone(), id.to_string()))
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl UniqueLookup for TakenValues {
    async fn is_taken(
        &self,
        _list_id: &str,
        field: &str,
        value: &Value,
        exclude: Option<&str>,
    ) -> Result<bool, String> {
        self.calls.lock().unwrap().push(exclude.map(str::to_string));
        Ok(self
            .taken
            .iter()
            .any(|(f, v, id)| f == field && v == value && Some(id.as_str()) != exclude))
    }
}

struct BrokenLookup;

#[async_trait]
impl UniqueLookup for BrokenLookup {
    async fn is_taken(
        &self,
        _list_id: &str,
        _field: &str,
        _value: &Value,
        _exclude: Option<&str>,
    ) -> Result<bool, String> {
        Err("store offline".into())
    }
}

// ── Strict mode ──────────────────────────────────────────────────

#[tokio::test]
async fn strict_accepts_a_complete_item() {
    let schema = SchemaDef::compile("title: {type: string, required}, done: boolean").unwrap();
    let params = params();
    let item = doc(json!({ "title": "milk", "done": false }));
    let out = Validator::new(&schema, &params)
        .validate(item.clone(), ValidationMode::Strict)
        .await
        .unwrap();
    assert_eq!(out, item);
}

#[tokio::test]
async fn strict_reports_first_missing_required_field() {
    let schema = SchemaDef::compile("a: {required}, b: {required}").unwrap();
    let params = params();
    let err = Validator::new(&schema, &params)
        .validate(doc(json!({ "b": 1 })), ValidationMode::Strict)
        .await
        .unwrap_err();
    assert!(matches!(err, ValidationError::MissingField { ref field } if field == "a"));
}

#[tokio::test]
async fn unknown_key_is_invalid_field() {
    let schema = SchemaDef::compile("a").unwrap();
    let params = params();
    let err = Validator::new(&schema, &params)
        .validate(doc(json!({ "a": 1, "zz": 2 })), ValidationMode::Strict)
        .await
        .unwrap_err();
    assert_eq!(err.field(), "zz");
    assert!(matches!(err, ValidationError::InvalidField { .. }));
}

#[tokio::test]
async fn list_reference_is_always_allowed() {
    let schema = SchemaDef::compile("a").unwrap();
    let params = params();
    let out = Validator::new(&schema, &params)
        .validate(doc(json!({ "listid": "L1", "a": 1 })), ValidationMode::Strict)
        .await
        .unwrap();
    assert_eq!(out.get("listid"), Some(&json!("L1")));
}

#[tokio::test]
async fn wrong_type_is_rejected() {
    let schema = SchemaDef::compile("n: number").unwrap();
    let params = params();
    let err = Validator::new(&schema, &params)
        .validate(doc(json!({ "n": "seven" })), ValidationMode::Strict)
        .await
        .unwrap_err();
    match err {
        ValidationError::WrongType { field, expected, found } => {
            assert_eq!((field.as_str(), expected, found), ("n", "number", "string"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn untyped_field_accepts_anything() {
    let schema = SchemaDef::compile("x").unwrap();
    let params = params();
    for value in [json!(1), json!("s"), json!([1]), json!({ "k": null })] {
        let out = Validator::new(&schema, &params)
            .validate(doc(json!({ "x": value.clone() })), ValidationMode::Strict)
            .await
            .unwrap();
        assert_eq!(out["x"], value);
    }
}

// ── Transforms ───────────────────────────────────────────────────

#[tokio::test]
async fn lower_and_upper_fold_case() {
    let schema = SchemaDef::compile("email: {type: string, lower}, code: {upper}").unwrap();
    let params = params();
    let out = Validator::new(&schema, &params)
        .validate(
            doc(json!({ "email": "Ann@Example.COM", "code": "ab-1" })),
            ValidationMode::Strict,
        )
        .await
        .unwrap();
    assert_eq!(out["email"], json!("ann@example.com"));
    assert_eq!(out["code"], json!("AB-1"));
}

#[tokio::test]
async fn case_folding_a_number_is_wrong_type() {
    let schema = SchemaDef::compile("code: {upper}").unwrap();
    let params = params();
    let err = Validator::new(&schema, &params)
        .validate(doc(json!({ "code": 5 })), ValidationMode::Strict)
        .await
        .unwrap_err();
    assert!(matches!(err, ValidationError::WrongType { expected: "string", .. }));
}

#[tokio::test]
async fn encrypted_fields_are_hashed() {
    let schema = SchemaDef::compile("user: string, pass: {type: string, encrypt}").unwrap();
    let params = params();
    let out = Validator::new(&schema, &params)
        .validate(doc(json!({ "user": "ann", "pass": "hunter2" })), ValidationMode::Strict)
        .await
        .unwrap();
    let stored = out["pass"].as_str().unwrap();
    assert_ne!(stored, "hunter2");
    assert!(verify_value("hunter2", stored).unwrap());
    assert!(!verify_value("hunter3", stored).unwrap());
    assert_eq!(out["user"], json!("ann"));
}

#[tokio::test]
async fn encrypted_string_type_hashes_without_type_check() {
    let schema = SchemaDef::compile("pin: encrypted_string").unwrap();
    let params = params();
    let out = Validator::new(&schema, &params)
        .validate(doc(json!({ "pin": 1234 })), ValidationMode::Strict)
        .await
        .unwrap();
    assert!(verify_value("1234", out["pin"].as_str().unwrap()).unwrap());
}

#[tokio::test]
async fn lower_runs_before_encrypt() {
    let schema = SchemaDef::compile("tag: {lower, encrypt}").unwrap();
    let params = params();
    let out = Validator::new(&schema, &params)
        .validate(doc(json!({ "tag": "ABC" })), ValidationMode::Strict)
        .await
        .unwrap();
    assert!(verify_value("abc", out["tag"].as_str().unwrap()).unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_validators_hash_independently() {
    let schema = SchemaDef::compile("secret: encrypted_string").unwrap();
    let params = params();
    let validator = Validator::new(&schema, &params);
    let (a, b) = tokio::join!(
        validator.validate(doc(json!({ "secret": "one" })), ValidationMode::Strict),
        validator.validate(doc(json!({ "secret": "two" })), ValidationMode::Strict),
    );
    assert!(verify_value("one", a.unwrap()["secret"].as_str().unwrap()).unwrap());
    assert!(verify_value("two", b.unwrap()["secret"].as_str().unwrap()).unwrap());
}

// ── Uniqueness ───────────────────────────────────────────────────

#[tokio::test]
async fn taken_unique_value_is_rejected() {
    let schema = SchemaDef::compile("email: {type: string, unique, lower}").unwrap();
    let params = params();
    let lookup = TakenValues::new(&[("email", json!("ann@x.io"), "item-1")]);
    let err = Validator::new(&schema, &params)
        .with_lookup("L1", &lookup)
        .validate(doc(json!({ "email": "ANN@x.io" })), ValidationMode::Strict)
        .await
        .unwrap_err();
    match err {
        ValidationError::NotUnique { field, value } => {
            assert_eq!(field, "email");
            assert_eq!(value, json!("ann@x.io"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn updating_an_item_ignores_its_own_value() {
    let schema = SchemaDef::compile("email: {unique}").unwrap();
    let params = params();
    let lookup = TakenValues::new(&[("email", json!("ann@x.io"), "item-1")]);
    let out = Validator::new(&schema, &params)
        .with_lookup("L1", &lookup)
        .excluding("item-1")
        .validate(doc(json!({ "email": "ann@x.io" })), ValidationMode::Partial)
        .await
        .unwrap();
    assert_eq!(out["email"], json!("ann@x.io"));
    assert_eq!(*lookup.calls.lock().unwrap(), vec![Some("item-1".to_string())]);
}

#[tokio::test]
async fn lookup_failure_is_reported() {
    let schema = SchemaDef::compile("email: {unique}").unwrap();
    let params = params();
    let err = Validator::new(&schema, &params)
        .with_lookup("L1", &BrokenLookup)
        .validate(doc(json!({ "email": "a" })), ValidationMode::Strict)
        .await
        .unwrap_err();
    assert!(matches!(err, ValidationError::Lookup { ref reason, .. } if reason == "store offline"));
}

// ── Partial mode ─────────────────────────────────────────────────

#[tokio::test]
async fn partial_skips_required_check() {
    let schema = SchemaDef::compile("a: {required}, b: number").unwrap();
    let params = params();
    let out = Validator::new(&schema, &params)
        .validate(doc(json!({ "b": 2 })), ValidationMode::Partial)
        .await
        .unwrap();
    assert_eq!(out, doc(json!({ "b": 2 })));
}

#[tokio::test]
async fn partial_still_checks_supplied_fields() {
    let schema = SchemaDef::compile("b: number").unwrap();
    let params = params();
    let err = Validator::new(&schema, &params)
        .validate(doc(json!({ "b": "x" })), ValidationMode::Partial)
        .await
        .unwrap_err();
    assert!(matches!(err, ValidationError::WrongType { .. }));
}

#[tokio::test]
async fn strict_counts_null_as_present() {
    let schema = SchemaDef::compile("a: {required}").unwrap();
    let params = params();
    let out = Validator::new(&schema, &params)
        .validate(doc(json!({ "a": null })), ValidationMode::Strict)
        .await
        .unwrap();
    assert_eq!(out["a"], Value::Null);
}

// ── Batches ──────────────────────────────────────────────────────

#[tokio::test]
async fn batch_validates_every_entry() {
    let schema = SchemaDef::compile("name: {type: string, upper}").unwrap();
    let params = params();
    let out = Validator::new(&schema, &params)
        .validate_batch(
            vec![doc(json!({ "name": "a" })), doc(json!({ "name": "b" }))],
            ValidationMode::Strict,
        )
        .await
        .unwrap();
    assert_eq!(out[0]["name"], json!("A"));
    assert_eq!(out[1]["name"], json!("B"));
}

#[tokio::test]
async fn batch_fails_on_first_bad_entry() {
    let schema = SchemaDef::compile("n: number").unwrap();
    let params = params();
    let err = Validator::new(&schema, &params)
        .validate_batch(
            vec![
                doc(json!({ "n": 1 })),
                doc(json!({ "n": "two" })),
                doc(json!({ "bogus": 3 })),
            ],
            ValidationMode::Strict,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ValidationError::WrongType { .. }));
}

#[tokio::test]
async fn batch_rejects_duplicates_within_itself() {
    let schema = SchemaDef::compile("code: {unique, lower}").unwrap();
    let params = params();
    let err = Validator::new(&schema, &params)
        .validate_batch(
            vec![doc(json!({ "code": "X" })), doc(json!({ "code": "x" }))],
            ValidationMode::Strict,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ValidationError::NotUnique { ref field, .. } if field == "code"));
}
