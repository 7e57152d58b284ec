//! Behavioural guarantees of the break checker that hold for any input pair

use serde_json::{Value, json};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use swagger_brake::Specification;
use swagger_brake::compat::rule_registry::get_builtin_rules;
use swagger_brake::compat::{
    BreakChecker, BreakingCategory, BreakingConfig, BreakingKind, BreakingRule, CheckError,
    RuleContext, RuleResult, Side,
};
use swagger_brake::normalize::{OpenApiTransformer, Transformer, load_document};

fn load(file_name: &str) -> Value {
    load_document(&Path::new("tests/data").join(file_name)).expect("Could not load test document")
}

fn transform(document: &Value) -> Specification {
    OpenApiTransformer.transform(document).unwrap()
}

/// A new version that breaks the users API in several unrelated ways at once.
fn heavily_changed_users_api() -> Value {
    let mut new = load("users_v1.yaml");
    let user_by_id = new
        .pointer_mut("/paths/~1users~1{id}")
        .and_then(Value::as_object_mut)
        .unwrap();
    user_by_id.remove("delete");
    user_by_id["get"]["parameters"] = json!([
        { "name": "expand", "in": "query", "required": true, "schema": { "type": "string" } }
    ]);
    user_by_id["get"]["responses"]
        .as_object_mut()
        .unwrap()
        .remove("404");

    let user = &mut new["components"]["schemas"]["User"];
    user["properties"]
        .as_object_mut()
        .unwrap()
        .remove("email");
    user["properties"]["id"] = json!({ "type": "string", "format": "uuid" });
    user["properties"]["status"]["enum"] = json!(["active"]);

    let new_user = &mut new["components"]["schemas"]["NewUser"];
    new_user["required"] = json!(["name", "email"]);
    new_user["properties"]["email"]["format"] = json!("idn-email");
    new
}

fn pairs() -> Vec<(Specification, Specification)> {
    let users = transform(&load("users_v1.yaml"));
    let changed = transform(&heavily_changed_users_api());
    let pets = transform(&load("petstore_swagger2.json"));
    let empty = Specification::default();
    vec![
        (users.clone(), changed.clone()),
        (changed.clone(), users.clone()),
        (users.clone(), pets.clone()),
        (pets.clone(), users.clone()),
        (empty.clone(), users.clone()),
        (users, empty.clone()),
        (empty.clone(), empty),
    ]
}

/// Counts invocations and reports nothing.
struct CountingRule {
    calls: Arc<AtomicUsize>,
}

impl BreakingRule for CountingRule {
    fn id(&self) -> &str {
        "COUNTING"
    }

    fn category(&self) -> BreakingCategory {
        BreakingCategory::Operation
    }

    fn kinds(&self) -> &[BreakingKind] {
        &[]
    }

    fn check(
        &self,
        _old: &Specification,
        _new: &Specification,
        _context: &RuleContext,
    ) -> RuleResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }
}

#[test]
fn test_totality() {
    let checker = BreakChecker::with_builtin_rules();
    for (old, new) in pairs() {
        let result = checker.compare(&old, &new);
        assert!(result.is_ok(), "check failed: {:?}", result.err());
        assert_eq!(result.unwrap().executed_rules.len(), 9);
    }
}

#[test]
fn test_determinism() {
    let sequential = BreakChecker::with_builtin_rules();
    let parallel = BreakChecker::with_builtin_rules().with_parallel(true);
    for (old, new) in pairs() {
        let first = sequential.compare(&old, &new).unwrap();
        let second = sequential.compare(&old, &new).unwrap();
        let concurrent = parallel.compare(&old, &new).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, concurrent);
    }
}

#[test]
fn test_identity_has_no_breaking_changes() {
    let checker = BreakChecker::with_builtin_rules();
    for document in [
        load("users_v1.yaml"),
        load("petstore_swagger2.json"),
        heavily_changed_users_api(),
    ] {
        let spec = transform(&document);
        let result = checker.compare(&spec, &spec).unwrap();
        assert!(result.changes.is_empty(), "{:#?}", result.changes);

        // Two independently built copies compare the same way.
        let copy = transform(&document);
        assert!(checker.compare(&spec, &copy).unwrap().changes.is_empty());
    }
}

#[test]
fn test_every_builtin_rule_reports_on_the_changed_api() {
    let old = transform(&load("users_v1.yaml"));
    let new = transform(&heavily_changed_users_api());
    let result = BreakChecker::with_builtin_rules().compare(&old, &new).unwrap();

    for rule in get_builtin_rules() {
        assert!(
            result.changes.iter().any(|change| change.rule_id == rule.id),
            "rule {} reported nothing",
            rule.id
        );
    }
}

#[test]
fn test_rule_independence() {
    let old = transform(&load("users_v1.yaml"));
    let new = transform(&heavily_changed_users_api());
    let full = BreakChecker::with_builtin_rules().compare(&old, &new).unwrap();

    for removed in get_builtin_rules() {
        let config = BreakingConfig {
            except_rules: vec![removed.id.to_string()],
            ..Default::default()
        };
        let partial = BreakChecker::from_config(&config)
            .unwrap()
            .compare(&old, &new)
            .unwrap();

        let expected: Vec<_> = full
            .changes
            .iter()
            .filter(|change| !removed.kinds.contains(&change.kind))
            .cloned()
            .collect();
        assert_eq!(partial.changes, expected, "removing {} changed other rules", removed.id);
    }
}

#[test]
fn test_records_follow_configuration_order() {
    let old = transform(&load("users_v1.yaml"));
    let new = transform(&heavily_changed_users_api());
    let result = BreakChecker::with_builtin_rules().compare(&old, &new).unwrap();

    let order: Vec<usize> = result
        .changes
        .iter()
        .map(|change| {
            get_builtin_rules()
                .iter()
                .position(|rule| rule.id == change.rule_id)
                .unwrap()
        })
        .collect();
    let mut sorted = order.clone();
    sorted.sort();
    assert_eq!(order, sorted);
}

#[test]
fn test_missing_input_fails_before_any_rule_runs() {
    let calls = Arc::new(AtomicUsize::new(0));
    let checker = BreakChecker::new(Vec::new()).with_rule(Box::new(CountingRule {
        calls: Arc::clone(&calls),
    }));
    let spec = transform(&load("users_v1.yaml"));

    let err = checker.check(None, Some(&spec)).unwrap_err();
    assert!(matches!(err, CheckError::MissingSpecification(Side::Old)));
    assert_eq!(err.to_string(), "oldApi must be provided");

    let err = checker.check(Some(&spec), None).unwrap_err();
    assert!(matches!(err, CheckError::MissingSpecification(Side::New)));
    assert_eq!(err.to_string(), "newApi must be provided");

    assert!(checker.check(None, None).is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    checker.check(Some(&spec), Some(&spec)).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_third_party_rule_runs_after_builtins() {
    let calls = Arc::new(AtomicUsize::new(0));
    let checker = BreakChecker::with_builtin_rules().with_rule(Box::new(CountingRule {
        calls: Arc::clone(&calls),
    }));
    assert_eq!(checker.rule_ids().last(), Some(&"COUNTING"));

    let spec = transform(&load("petstore_swagger2.json"));
    let result = checker.compare(&spec, &spec).unwrap();
    assert_eq!(result.executed_rules.len(), 10);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
