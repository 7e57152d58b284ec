use serde_json::{Value, json};
use std::path::Path;
use swagger_brake::normalize::load_document;
use swagger_brake::spec::{ApiSpec, Compatibility};

fn read_api(file_name: &str) -> Value {
    load_document(&Path::new("tests/data").join(file_name)).expect("Could not read test API file")
}

fn spec(document: &Value) -> ApiSpec {
    ApiSpec::from_document(document).unwrap()
}

#[test]
fn test_fingerprint_consistency_for_identical_files() {
    let hash1 = spec(&read_api("users_v1.yaml")).fingerprint;
    let hash2 = spec(&read_api("users_v1.yaml")).fingerprint;

    assert_eq!(hash1, hash2);
    assert_eq!(hash1.len(), 64);
}

#[test]
fn test_fingerprint_ignores_documentation_and_key_order() {
    let hash_a = spec(&read_api("users_v1.yaml")).fingerprint;
    let hash_cosmetic = spec(&read_api("users_v1_cosmetic.yaml")).fingerprint;

    assert_eq!(
        hash_a, hash_cosmetic,
        "Cosmetic changes should not alter the fingerprint"
    );
}

#[test]
fn test_fingerprint_detects_semantic_change_type() {
    let base = read_api("users_v1.yaml");
    let mut changed = base.clone();
    changed["components"]["schemas"]["User"]["properties"]["id"]["format"] = json!("int32");

    assert_ne!(spec(&base).fingerprint, spec(&changed).fingerprint);
}

#[test]
fn test_fingerprint_detects_added_operation() {
    let base = read_api("users_v1.yaml");
    let mut changed = base.clone();
    changed["paths"]["/users"]["get"] = json!({ "responses": { "200": { "description": "ok" } } });

    assert_ne!(spec(&base).fingerprint, spec(&changed).fingerprint);
}

#[test]
fn test_fingerprint_from_path_matches_document() {
    let from_path = ApiSpec::from_path(Path::new("tests/data/petstore_swagger2.json")).unwrap();
    let from_document = spec(&read_api("petstore_swagger2.json"));
    assert_eq!(from_path.fingerprint, from_document.fingerprint);
    assert_eq!(from_path.specification.operation_count(), 2);
}

#[test]
fn test_compatibility_verdicts() {
    let base = read_api("users_v1.yaml");
    let old_spec = spec(&base);

    // Identical semantics
    let cosmetic = spec(&read_api("users_v1_cosmetic.yaml"));
    assert_eq!(old_spec.compare_with(&cosmetic).unwrap(), Compatibility::Green);

    // Backward-compatible addition
    let mut extended = base.clone();
    extended["components"]["schemas"]["User"]["properties"]["nickname"] =
        json!({ "type": "string" });
    assert_eq!(
        old_spec.compare_with(&spec(&extended)).unwrap(),
        Compatibility::Yellow
    );

    // Breaking removal
    let mut reduced = base.clone();
    reduced["paths"]
        .as_object_mut()
        .unwrap()
        .remove("/users");
    let reduced_spec = spec(&reduced);
    assert_eq!(
        old_spec.compare_with(&reduced_spec).unwrap(),
        Compatibility::Red
    );

    let result = old_spec.check_breaking_changes(&reduced_spec).unwrap();
    assert_eq!(result.changes.len(), 1);
    assert_eq!(result.changes[0].location.to_string(), "POST /users");
}
