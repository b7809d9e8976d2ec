//! Tests that drive the process-wide deep checking flag
//!
//! The flag is shared by every test thread in this binary, so each test
//! holds `FLAG_LOCK` and restores the flag on exit.

use runtime_check::{
    check_type_at_run, is_deep, set_deep, Annotations, CallArgs, CheckSettings, Depth,
    Signature, TypeSpec, Value, DEEP_ENV_VAR,
};
use std::sync::{Mutex, MutexGuard};

static FLAG_LOCK: Mutex<()> = Mutex::new(());

struct DeepFlag {
    _guard: MutexGuard<'static, ()>,
}

impl DeepFlag {
    fn set(deep: bool) -> Self {
        let guard = FLAG_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        set_deep(deep);
        Self { _guard: guard }
    }
}

impl Drop for DeepFlag {
    fn drop(&mut self) {
        set_deep(false);
    }
}

fn tuple_spec() -> TypeSpec {
    TypeSpec::tuple_of([TypeSpec::int(), TypeSpec::float(), TypeSpec::str()])
}

#[test]
fn test_deep_tuple_elements() {
    let _flag = DeepFlag::set(true);
    assert_eq!(Depth::current(), Depth::Deep);

    let spec = tuple_spec();
    assert!(spec.matches(&Value::tuple([
        Value::from(0),
        Value::from(0.0),
        Value::from(""),
    ])));
    assert!(!spec.matches(&Value::tuple([
        Value::from(0),
        Value::from(0),
        Value::from(""),
    ])));
    assert!(!spec.matches(&Value::tuple([
        Value::from(0),
        Value::from(0.0),
        Value::None,
    ])));
}

#[test]
fn test_shallow_tuple_still_checks_arity() {
    let _flag = DeepFlag::set(false);
    assert_eq!(Depth::current(), Depth::Shallow);

    let spec = tuple_spec();
    assert!(spec.matches(&Value::tuple([
        Value::from(0),
        Value::from(0),
        Value::None,
    ])));
    assert!(!spec.matches(&Value::tuple([Value::from(0), Value::from(0.0)])));
}

#[test]
fn test_deep_list_and_dict() {
    let _flag = DeepFlag::set(true);

    let ints = TypeSpec::list_of(TypeSpec::int());
    assert!(ints.matches(&Value::list([Value::from(1), Value::from(2)])));
    assert!(!ints.matches(&Value::list([Value::from(1), Value::from("")])));

    let dict = TypeSpec::dict_of(TypeSpec::str(), TypeSpec::int());
    assert!(dict.matches(&Value::dict([(Value::from("a"), Value::from(1))])));
    assert!(!dict.matches(&Value::dict([
        (Value::from("a"), Value::from(1)),
        (Value::from(2), Value::from("b")),
    ])));
}

#[test]
fn test_toggle_between_calls() {
    let f = check_type_at_run(
        Signature::new("check_list").param("val_a"),
        Annotations::new().arg("val_a", TypeSpec::list_of(TypeSpec::int())),
        |args| args["val_a"].clone(),
    )
    .unwrap();
    let mixed = Value::list([Value::from(1), Value::from(2), Value::from("")]);

    let flag = DeepFlag::set(false);
    assert!(f.call(CallArgs::new().arg(mixed.clone())).is_ok());
    drop(flag);

    let _flag = DeepFlag::set(true);
    let err = f.call(CallArgs::new().arg(mixed)).unwrap_err();
    assert_eq!(err.to_string(), "Expected List[int] for argument 'val_a', got list");
}

#[test]
fn test_settings_apply() {
    let _flag = DeepFlag::set(false);

    let settings =
        CheckSettings::from_lookup(|name| (name == DEEP_ENV_VAR).then(|| "true".to_string()))
            .unwrap();
    settings.apply();
    assert!(is_deep());

    CheckSettings::default().apply();
    assert!(!is_deep());
}

#[test]
fn test_settings_from_json_document() {
    let _flag = DeepFlag::set(false);

    let settings: CheckSettings = serde_json::from_str(
        r#"{ "deep": true, "bounds": { "unit": { "low": 0.0, "high": 1.0 } } }"#,
    )
    .unwrap();
    settings.apply();
    assert!(is_deep());
    assert!(settings.bound("unit").is_some());
}
