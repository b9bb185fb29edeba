use sonlist_crypto::{hash_value, is_hashed, verify_value, CryptoError, HashParams};

fn fast() -> HashParams {
    HashParams::insecure_fast()
}

// ── hash_value ───────────────────────────────────────────────────

#[test]
fn hash_differs_from_plaintext() {
    let hash = hash_value("hunter2", &fast()).unwrap();
    assert_ne!(hash, "hunter2");
    assert!(!hash.contains("hunter2"));
}

#[test]
fn hashing_is_salted() {
    let a = hash_value("same", &fast()).unwrap();
    let b = hash_value("same", &fast()).unwrap();
    assert_ne!(a, b);
}

#[test]
fn empty_string_can_be_hashed() {
    let hash = hash_value("", &fast()).unwrap();
    assert!(verify_value("", &hash).unwrap());
}

#[test]
fn hash_is_recognised() {
    let hash = hash_value("x", &fast()).unwrap();
    assert!(is_hashed(&hash));
    assert!(!is_hashed("x"));
    assert!(!is_hashed("$argon2id$garbage"));
}

// ── verify_value ─────────────────────────────────────────────────

#[test]
fn verify_accepts_original() {
    let hash = hash_value("correct horse", &fast()).unwrap();
    assert!(verify_value("correct horse", &hash).unwrap());
}

#[test]
fn verify_rejects_other_value() {
    let hash = hash_value("correct horse", &fast()).unwrap();
    assert!(!verify_value("battery staple", &hash).unwrap());
}

#[test]
fn verify_is_case_sensitive() {
    let hash = hash_value("Secret", &fast()).unwrap();
    assert!(!verify_value("secret", &hash).unwrap());
}

#[test]
fn verify_works_across_parameter_sets() {
    let params = HashParams {
        memory_cost: 2048,
        time_cost: 2,
        parallelism: 1,
    };
    let hash = hash_value("pw", &params).unwrap();
    assert!(verify_value("pw", &hash).unwrap());
}

#[test]
fn verify_rejects_malformed_hash() {
    assert!(matches!(
        verify_value("pw", "not a hash"),
        Err(CryptoError::MalformedHash(_))
    ));
}

// ── HashParams ───────────────────────────────────────────────────

#[test]
fn default_params_match_owasp() {
    let params = HashParams::default();
    assert_eq!(params.memory_cost, 19 * 1024);
    assert_eq!(params.time_cost, 2);
    assert_eq!(params.parallelism, 1);
}
