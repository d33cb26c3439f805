//! Value model and scope chain through the public API

use cwscript::*;
use pretty_assertions::assert_eq;

// ═══════════════════════════════════════════════════════════════════════
// Equality vs Identity
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_fresh_empty_containers_equal_but_not_same() {
    let mut ids = IdGenerator::new();
    let a = ids.list_value(Vec::new());
    let b = ids.list_value(Vec::new());
    assert!(a.is_equal(&b));
    assert!(!a.is_same(&b));
    assert!(a.is_same(&a.clone()));

    let x = Value::Object(ids.empty_object());
    let y = Value::Object(ids.empty_object());
    assert!(x.is_equal(&y));
    assert!(!x.is_same(&y));
}

#[test]
fn test_cyclic_objects_compare_structurally() {
    let mut ids = IdGenerator::new();
    let make = |ids: &mut IdGenerator, n: i64| {
        let obj = ids.empty_object();
        obj.set("n", Value::Int(n));
        obj.set("me", Value::Object(obj.clone()));
        Value::Object(obj)
    };
    let a = make(&mut ids, 1);
    let b = make(&mut ids, 1);
    let c = make(&mut ids, 2);
    assert!(a.is_equal(&b));
    assert!(!a.is_equal(&c));
    assert_eq!(a.to_display(true), "{n: 1, me: {...}}");
}

#[test]
fn test_numeric_equality_crosses_tags() {
    assert!(Value::Int(1).is_equal(&Value::Float(1.0)));
    assert!(Value::Bool(true).is_equal(&Value::Int(1)));
    assert!(!Value::Int(1).is_equal(&Value::string("1")));
    assert!(!Value::Null.is_equal(&Value::Int(0)));
}

#[test]
fn test_primitives_have_no_identity() {
    assert!(!Value::Int(1).is_same(&Value::Int(1)));
}

#[test]
fn test_ids_are_unique_and_increasing() {
    let mut ids = IdGenerator::new();
    let first = ids.list(Vec::new()).id();
    let second = ids.empty_object().id();
    assert!(second.get() > first.get());
}

// ═══════════════════════════════════════════════════════════════════════
// Truthiness and Display
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_truthiness() {
    let mut ids = IdGenerator::new();
    assert!(!Value::Null.to_bool());
    assert!(!Value::Int(0).to_bool());
    assert!(!Value::Float(0.0).to_bool());
    assert!(!Value::string("").to_bool());
    assert!(!ids.list_value(Vec::new()).to_bool());
    assert!(Value::string("0").to_bool());
    assert!(ids.list_value(vec![Value::Null]).to_bool());
}

#[test]
fn test_display_isolated_vs_nested() {
    let mut ids = IdGenerator::new();
    let list = ids.list_value(vec![Value::string("a"), Value::Float(1.0), Value::Null]);
    assert_eq!(Value::string("a").to_display(true), "a");
    assert_eq!(Value::string("a").to_display(false), "\"a\"");
    assert_eq!(list.to_display(true), "[\"a\", 1.0, null]");
    assert_eq!(Value::Float(1e20).to_display(true), "1e+20");
}

// ═══════════════════════════════════════════════════════════════════════
// Container Access
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_negative_indices_count_from_end() {
    let mut ids = IdGenerator::new();
    let list = ids.list(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    assert!(matches!(list.get(-1), Ok(Value::Int(3))));
    assert!(matches!(list.get(-3), Ok(Value::Int(1))));
    assert!(matches!(
        list.get(-4),
        Err(EvalError::IndexOutOfBounds { index: -4, len: 3 })
    ));
    assert!(list.get(3).is_err());
}

#[test]
fn test_missing_object_key() {
    let mut ids = IdGenerator::new();
    let obj = ids.empty_object();
    assert!(matches!(obj.get("x"), Err(EvalError::MissingKey { .. })));
}

#[test]
fn test_scalar_payload_rejects_containers() {
    let mut ids = IdGenerator::new();
    assert!(ids.list_value(Vec::new()).get_value().is_err());
    assert!(Value::Null.get_value().is_err());
    assert!(Value::Int(3).get_value().is_ok());
}

#[test]
fn test_variable_ref_writes_through() {
    let mut ids = IdGenerator::new();
    let obj = ids.empty_object();
    let var = ids.variable(Container::Object(obj.clone()), FieldKey::Name("k".into()));
    assert!(var.get().is_err());
    var.set(Value::Int(5)).unwrap();
    assert!(matches!(obj.get("k"), Ok(Value::Int(5))));
}

// ═══════════════════════════════════════════════════════════════════════
// Scope Chain
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_scope_chain_limits_depth() {
    let mut ids = IdGenerator::new();
    let mut scopes = ScopeChain::new(ids.empty_object(), 2);
    scopes.push(ids.empty_object()).unwrap();
    scopes.push(ids.empty_object()).unwrap();
    assert!(matches!(
        scopes.push(ids.empty_object()),
        Err(EvalError::RecursionLimit { max: 2 })
    ));
    assert_eq!(scopes.depth(), 2);
}

#[test]
fn test_global_scope_is_never_popped() {
    let mut ids = IdGenerator::new();
    let mut scopes = ScopeChain::new(ids.empty_object(), 4);
    assert!(scopes.pop().is_none());
    assert!(scopes.is_global_scope());
}

#[test]
fn test_resolve_nested_path() {
    let mut ids = IdGenerator::new();
    let scopes = ScopeChain::new(ids.empty_object(), 4);
    let inner = ids.empty_object();
    scopes.global().set("o", Value::Object(inner.clone()));

    let path = vec!["o".to_string(), "v".to_string()];
    let var = scopes.resolve(true, &path, &mut ids).unwrap();
    var.set(Value::Int(1)).unwrap();
    assert!(matches!(inner.get("v"), Ok(Value::Int(1))));

    let bad = vec!["missing".to_string(), "v".to_string()];
    assert!(scopes.resolve(false, &bad, &mut ids).is_err());
}
