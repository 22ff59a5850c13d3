//! Dispatch Tests
//!
//! Calls against instance mirrors:
//! - Private field reads and writes, instance and static
//! - Overload selection by exact unwrapped signature
//! - Inherited and static hidden members
//! - Resolution and access failures surfacing as invocation errors
//! - Member resolution memoization
//!
//! # Running Tests
//! ```bash
//! cargo test --test dispatch_tests
//! ```

mod common;

use common::{builder, engine, engine_with, hidden, HIDDEN};
use mirror_engine::{EngineConfig, MirrorError};
use mirror_sdk::{Contract, ContractMethod, Proxy, TypeRef, Value};

fn mirror(x: i32) -> Proxy {
    let engine = engine();
    engine.create_mirror("Hidden", hidden(&engine, x, "m")).unwrap()
}

fn invocation_root(result: Result<Value, MirrorError>) -> MirrorError {
    match result {
        Err(error @ MirrorError::Invocation { .. }) => error.root().clone(),
        other => panic!("expected an invocation error, got {:?}", other),
    }
}

fn field_access_root(result: Result<Value, MirrorError>) -> MirrorError {
    match result {
        Err(error @ MirrorError::FieldAccess { .. }) => error.root().clone(),
        other => panic!("expected a field access error, got {:?}", other),
    }
}

// ===== Field access =====

#[test]
fn test_private_field_getter() {
    assert_eq!(mirror(42).call("x", &[]).unwrap(), Value::I32(42));
}

#[test]
fn test_private_field_setter_then_getter() {
    let engine = engine();
    let raw = hidden(&engine, 42, "m");
    let mirror = engine.create_mirror("Hidden", raw.clone()).unwrap();

    assert!(mirror.call("setX", &[Value::I32(7)]).unwrap().is_null());
    assert_eq!(mirror.call("x", &[]).unwrap(), Value::I32(7));
    // The write lands on the target itself
    assert_eq!(raw.get("x"), Some(Value::I32(7)));
}

#[test]
fn test_inherited_private_field() {
    assert_eq!(
        mirror(1).call("inherited", &[]).unwrap(),
        Value::from("from base")
    );
}

#[test]
fn test_static_field_is_shared_between_mirrors() {
    let engine = engine();
    let first = engine.create_mirror("Hidden", hidden(&engine, 1, "a")).unwrap();
    let second = engine.create_mirror("Hidden", hidden(&engine, 2, "b")).unwrap();

    assert_eq!(first.call("counter", &[]).unwrap(), Value::I32(7));
    first.call("setCounter", &[Value::I32(11)]).unwrap();
    assert_eq!(second.call("counter", &[]).unwrap(), Value::I32(11));
}

#[test]
fn test_setter_rejects_wrong_value_kind() {
    let mirror = mirror(1);
    let set_x = mirror.contract().methods_named("setX").next().unwrap().clone();
    let root = field_access_root(mirror.invoke(&set_x, &[Value::from("seven")]));
    assert!(matches!(root, MirrorError::IllegalArgument(_)));
}

#[test]
fn test_setter_arity_is_checked_at_call_time() {
    let mirror = mirror(1);
    let set_x = mirror.contract().methods_named("setX").next().unwrap().clone();

    let root = field_access_root(mirror.invoke(&set_x, &[]));
    assert!(matches!(root, MirrorError::IllegalArgument(_)));

    let root = field_access_root(mirror.invoke(&set_x, &[Value::I32(1), Value::I32(2)]));
    assert!(matches!(root, MirrorError::IllegalArgument(_)));
    assert_eq!(mirror.call("x", &[]).unwrap(), Value::I32(1));
}

#[test]
fn test_getter_takes_no_arguments() {
    let mirror = mirror(1);
    let x = mirror.contract().methods_named("x").next().unwrap().clone();
    let root = field_access_root(mirror.invoke(&x, &[Value::I32(1)]));
    assert!(matches!(root, MirrorError::IllegalArgument(_)));
}

#[test]
fn test_missing_field_is_a_field_access_error() {
    let engine = builder()
        .contract(
            Contract::mirror("HiddenGhost", HIDDEN)
                .method(ContractMethod::new("ghost").returns(TypeRef::I32).get_field("ghost")),
        )
        .build();
    let mirror = engine.create_mirror("HiddenGhost", hidden(&engine, 1, "g")).unwrap();
    match mirror.call("ghost", &[]) {
        Err(MirrorError::FieldAccess { member, source }) => {
            assert_eq!(member, "HiddenGhost.ghost()");
            assert!(matches!(*source, MirrorError::NoSuchMember(_)));
        }
        other => panic!("expected a field access error, got {:?}", other),
    }
}

// ===== Method calls =====

#[test]
fn test_overload_resolution_by_exact_signature() {
    let mirror = mirror(1);
    assert_eq!(
        mirror.call("f", &[Value::I32(1)]).unwrap(),
        Value::from("f(int)")
    );
    assert_eq!(
        mirror.call("f", &[Value::I32(1), Value::F64(0.5)]).unwrap(),
        Value::from("f(int,double)")
    );
}

#[test]
fn test_no_widening_between_signatures() {
    // add(long) is declared on the contract but the hidden class only has add(int)
    let mirror = mirror(1);
    assert_eq!(mirror.call("add", &[Value::I32(2)]).unwrap(), Value::I32(3));
    let root = invocation_root(mirror.call("add", &[Value::I64(2)]));
    match root {
        MirrorError::NoSuchMember(message) => assert!(message.contains("add(long)")),
        other => panic!("expected NoSuchMember, got {:?}", other),
    }
}

#[test]
fn test_private_static_method() {
    assert_eq!(mirror(1).call("twice", &[Value::I32(21)]).unwrap(), Value::I32(42));
}

#[test]
fn test_inherited_non_public_methods() {
    let mirror = mirror(1);
    assert_eq!(
        mirror.call("describe", &[]).unwrap(),
        Value::from("base:from base")
    );
    assert_eq!(mirror.call("baseValue", &[]).unwrap(), Value::I32(1));
}

#[test]
fn test_missing_member_is_an_invocation_error() {
    let mirror = mirror(1);
    match mirror.call("missing", &[]) {
        Err(MirrorError::Invocation { member, source }) => {
            assert_eq!(member, "Hidden.missing()");
            assert!(matches!(*source, MirrorError::NoSuchMember(_)));
        }
        other => panic!("expected an invocation error, got {:?}", other),
    }
}

#[test]
fn test_unknown_contract_method() {
    let mirror = mirror(1);
    assert!(matches!(
        mirror.call("nothing", &[]),
        Err(MirrorError::NoSuchMember(_))
    ));
    assert!(matches!(
        mirror.call("f", &[Value::from("one")]),
        Err(MirrorError::IllegalArgument(_))
    ));
}

// ===== Permissions =====

#[test]
fn test_public_only_denies_private_members() {
    let config = EngineConfig::from_toml_str(
        r#"
        [mirror]
        permissions = "PUBLIC_ONLY"
        "#,
    )
    .unwrap();
    let engine = engine_with(config);
    let mirror = engine.create_mirror("Hidden", hidden(&engine, 1, "a")).unwrap();

    assert_eq!(
        mirror.call("f", &[Value::I32(1)]).unwrap(),
        Value::from("f(int)")
    );
    assert!(matches!(
        field_access_root(mirror.call("x", &[])),
        MirrorError::IllegalAccess(_)
    ));
    assert!(matches!(
        invocation_root(mirror.call("add", &[Value::I32(1)])),
        MirrorError::IllegalAccess(_)
    ));
}

#[test]
fn test_class_override_restores_access() {
    let config = EngineConfig::from_toml_str(
        r#"
        [mirror]
        permissions = "PUBLIC_ONLY"

        [mirror.classes]
        "com.acme.Hidden" = "FULL_ACCESS"
        "#,
    )
    .unwrap();
    let engine = engine_with(config);
    let mirror = engine.create_mirror("Hidden", hidden(&engine, 4, "a")).unwrap();
    assert_eq!(mirror.call("x", &[]).unwrap(), Value::I32(4));
    assert_eq!(engine.permission_for("com.acme.Other").to_string(), "PUBLIC_ONLY");
}

#[test]
fn test_read_only_permissions_deny_writes() {
    let config = EngineConfig::from_toml_str(
        r#"
        [mirror]
        permissions = "READ_ALL | INVOKE_ALL"
        "#,
    )
    .unwrap();
    let engine = engine_with(config);
    let mirror = engine.create_mirror("Hidden", hidden(&engine, 4, "a")).unwrap();
    assert_eq!(mirror.call("x", &[]).unwrap(), Value::I32(4));
    assert!(matches!(
        field_access_root(mirror.call("setX", &[Value::I32(5)])),
        MirrorError::IllegalAccess(_)
    ));
}

// ===== Resolution cache =====

#[test]
fn test_resolutions_are_memoized() {
    let engine = engine();
    let mirror = engine.create_mirror("Hidden", hidden(&engine, 1, "a")).unwrap();
    assert_eq!(engine.cached_members(), 0);

    mirror.call("x", &[]).unwrap();
    mirror.call("x", &[]).unwrap();
    mirror.call("f", &[Value::I32(1)]).unwrap();
    assert_eq!(engine.cached_members(), 2);

    // Another mirror of the same contract and class reuses the entries
    let other = engine.create_mirror("Hidden", hidden(&engine, 2, "b")).unwrap();
    assert_eq!(other.call("x", &[]).unwrap(), Value::I32(2));
    assert_eq!(engine.cached_members(), 2);
}

#[test]
fn test_foreign_method_cannot_poison_the_cache() {
    let engine = engine();
    let mirror = engine.create_mirror("Hidden", hidden(&engine, 42, "a")).unwrap();
    // Same name as a declared method, but never added to the contract
    let stray = ContractMethod::new("label").returns(TypeRef::Str);

    assert!(matches!(
        mirror.invoke(&stray, &[]),
        Err(MirrorError::IllegalArgument(_))
    ));
    assert_eq!(engine.cached_members(), 0);

    // Going around the proxy reaches the handler, which still keys by shape
    let label = mirror.handler().invoke(&mirror, &stray, &[]).unwrap();
    assert_eq!(label, Value::from("a"));

    assert_eq!(mirror.call("x", &[]).unwrap(), Value::I32(42));
    let other = engine.create_mirror("Hidden", hidden(&engine, 7, "b")).unwrap();
    assert_eq!(other.call("x", &[]).unwrap(), Value::I32(7));
    assert_eq!(other.call("label", &[]).unwrap(), Value::from("b"));
}

#[test]
fn test_cache_can_be_disabled() {
    let config = EngineConfig::from_toml_str(
        r#"
        [mirror]
        cache_members = false
        "#,
    )
    .unwrap();
    let engine = engine_with(config);
    let mirror = engine.create_mirror("Hidden", hidden(&engine, 3, "a")).unwrap();
    assert_eq!(mirror.call("x", &[]).unwrap(), Value::I32(3));
    assert_eq!(engine.cached_members(), 0);
}
