/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use std::panic;

use dynconfig::declare_config;
use dynconfig::global;
use dynconfig_test::OverrideConfig;
use dynconfig_test::override_config;

declare_config! {
    /// Boolean setting exercised by the override tests.
    pub BOOL_VALUE: bool = true;

    pub INT_VALUE: i64 = 1;

    pub STRING_VALUE: String = "Hello world".to_string();
}

fn bool_value() -> bool {
    global::get(BOOL_VALUE).unwrap()
}

fn int_value() -> i64 {
    global::get(INT_VALUE).unwrap()
}

#[test]
fn test_default_value_is_true() {
    let _lock = global::lock();
    assert!(bool_value());
}

#[test]
#[override_config(BOOL_VALUE = false)]
fn test_override_config_on_function_changes_config_value() {
    assert!(!bool_value());
}

#[test]
#[override_config(BOOL_VALUE = false, INT_VALUE = 42, STRING_VALUE = "patched")]
fn test_override_config_with_several_keys() {
    assert!(!bool_value());
    assert_eq!(int_value(), 42);
    assert_eq!(global::get(STRING_VALUE).unwrap(), "patched");
}

#[test]
fn test_override_config_as_scope_changes_config_value() {
    let _lock = global::lock();

    OverrideConfig::new()
        .with(BOOL_VALUE, false)
        .scope(|| assert!(!bool_value()))
        .unwrap();

    assert!(bool_value());
}

#[test]
fn test_override_guard_as_let_binding() {
    let _lock = global::lock();
    {
        let _guard = OverrideConfig::new().set("BOOL_VALUE", false).enter().unwrap();
        assert!(!bool_value());
    }
    assert!(bool_value());
}

#[test]
fn test_scope_restores_after_error() {
    let _lock = global::lock();

    let result: anyhow::Result<()> = OverrideConfig::new()
        .with(BOOL_VALUE, false)
        .try_scope(|| {
            anyhow::ensure!(bool_value(), "forced failure");
            Ok(())
        });

    assert_eq!(result.unwrap_err().to_string(), "forced failure");
    assert!(bool_value());
}

#[override_config(BOOL_VALUE = false)]
fn observe_bool_value() -> bool {
    bool_value()
}

#[override_config(BOOL_VALUE = false)]
fn fail_with_override() {
    assert!(!bool_value());
    panic!("forced failure");
}

#[test]
fn test_decorated_function_restores_after_return() {
    let _lock = global::lock();
    assert!(!observe_bool_value());
    assert!(bool_value());
}

#[test]
fn test_decorated_function_restores_after_panic() {
    let _lock = global::lock();
    let result = panic::catch_unwind(fail_with_override);
    assert!(result.is_err());
    assert!(bool_value());
}

#[test]
#[should_panic(expected = "forced failure")]
#[override_config(BOOL_VALUE = false)]
fn test_failure_inside_decorated_test_is_reported_unchanged() {
    panic!("forced failure");
}

#[test]
#[override_config(INT_VALUE = 2)]
fn test_nested_overrides_restore_enclosing_value() {
    assert_eq!(int_value(), 2);

    OverrideConfig::new()
        .with(INT_VALUE, 3)
        .scope(|| {
            assert_eq!(int_value(), 3);
            OverrideConfig::new()
                .with(INT_VALUE, 4)
                .scope(|| assert_eq!(int_value(), 4))
                .unwrap();
            assert_eq!(int_value(), 3);
        })
        .unwrap();

    assert_eq!(int_value(), 2);
}

#[test]
fn test_decorated_calls_nest_on_one_thread() {
    let _lock = global::lock();
    OverrideConfig::new()
        .with(BOOL_VALUE, true)
        .with(INT_VALUE, 7)
        .scope(|| {
            // Takes the global lock again and overrides BOOL_VALUE only.
            assert!(!observe_bool_value());
            assert!(bool_value());
            assert_eq!(int_value(), 7);
        })
        .unwrap();
    assert_eq!(int_value(), 1);
}

#[test]
#[should_panic(expected = "unknown configuration key: NOT_DECLARED")]
#[override_config(NOT_DECLARED = 1)]
fn test_unknown_key_fails_with_store_error() {}

#[test]
#[should_panic(expected = "type mismatch for BOOL_VALUE: expected bool, got str")]
#[override_config(BOOL_VALUE = "no")]
fn test_mistyped_value_fails_with_store_error() {}

#[test]
fn test_failed_override_leaves_store_untouched() {
    let _lock = global::lock();
    let err = OverrideConfig::new()
        .with(INT_VALUE, 100)
        .set("NOT_DECLARED", true)
        .enter()
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        global::get_value("NOT_DECLARED").unwrap_err().to_string()
    );
    assert_eq!(int_value(), 1);
}
