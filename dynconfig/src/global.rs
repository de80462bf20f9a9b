/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! The process-wide configuration store.
//!
//! On first use the global store is a [`MemoryStore`] seeded from
//! `DYNCONFIG_<NAME>` environment variables. A different backend can
//! be installed with [`install`]; YAML files can be layered on with
//! [`init_from_yaml`].
//!
//! # Testing
//!
//! The global store is shared by every test in the process, and the
//! Rust test harness runs tests on parallel threads. Tests that
//! change global configuration should hold [`lock`] for their whole
//! duration:
//!
//! ```ignore
//! #[test]
//! fn test_my_feature() {
//!     let _lock = dynconfig::global::lock();
//!     dynconfig::global::set(SOME_KEY, test_value).unwrap();
//!     // ... test logic here ...
//!     dynconfig::global::reset_to_defaults().unwrap();
//! }
//! ```
//!
//! The lock may be taken again by the thread that already holds it,
//! so helpers that lock can be called from locked tests.

use std::path::Path;
use std::sync::Arc;
use std::sync::LazyLock;
use std::sync::RwLock;

use parking_lot::ReentrantMutex;
use parking_lot::ReentrantMutexGuard;

use crate::error::ConfigError;
use crate::load;
use crate::registry::Key;
use crate::store::ConfigStore;
use crate::store::MemoryStore;
use crate::value::ConfigValue;
use crate::value::Value;

static STORE: LazyLock<RwLock<Arc<dyn ConfigStore>>> = LazyLock::new(|| {
    let store = MemoryStore::new();
    for (name, value) in load::from_env() {
        if let Err(e) = store.set(name, value) {
            tracing::error!("failed to apply environment value for {}: {}", name, e);
        }
    }
    let store: Arc<dyn ConfigStore> = Arc::new(store);
    RwLock::new(store)
});

/// The currently installed global store.
pub fn store() -> Arc<dyn ConfigStore> {
    STORE.read().unwrap().clone()
}

/// Replace the global store, returning the previous one.
pub fn install(store: Arc<dyn ConfigStore>) -> Arc<dyn ConfigStore> {
    std::mem::replace(&mut *STORE.write().unwrap(), store)
}

/// Read a typed setting from the global store.
pub fn get<T: ConfigValue>(key: Key<T>) -> Result<T, ConfigError> {
    let value = get_value(key.name())?;
    let actual = value.kind();
    T::from_value(value).ok_or_else(|| ConfigError::TypeMismatch {
        key: key.name().to_string(),
        expected: T::KIND,
        actual,
    })
}

/// Read a setting by name from the global store.
pub fn get_value(name: &str) -> Result<Value, ConfigError> {
    store().get(name)
}

/// Write a typed setting to the global store.
pub fn set<T: ConfigValue>(key: Key<T>, value: T) -> Result<(), ConfigError> {
    set_value(key.name(), value.into_value())
}

/// Write a setting by name to the global store.
pub fn set_value(name: &str, value: Value) -> Result<(), ConfigError> {
    store().set(name, value)
}

/// Drop every explicitly written value from the global store.
pub fn reset_to_defaults() -> Result<(), ConfigError> {
    store().reset()
}

/// Re-read `DYNCONFIG_<NAME>` variables into the global store.
pub fn init_from_env() -> Result<(), ConfigError> {
    load::apply(&*store(), load::from_env())
}

/// Load a YAML file into the global store.
pub fn init_from_yaml<P: AsRef<Path>>(path: P) -> Result<(), ConfigError> {
    let values = load::from_yaml(path)?;
    load::apply(&*store(), values)
}

static LOCK: ReentrantMutex<()> = parking_lot::const_reentrant_mutex(());

/// Acquire the global configuration lock.
///
/// Serializes tests that mutate global configuration. The lock is
/// re-entrant: the holding thread may take it again, and other threads
/// stay blocked until every [`ConfigLock`] on the holding thread has
/// dropped, in any order. A test that panicked while holding the lock
/// does not poison it for later tests.
pub fn lock() -> ConfigLock {
    ConfigLock {
        _guard: LOCK.lock(),
    }
}

/// Guard returned by [`lock`].
pub struct ConfigLock {
    _guard: ReentrantMutexGuard<'static, ()>,
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::declare_config;

    declare_config! {
        /// Connection pool size used by the global store tests.
        pub GLOBAL_TEST_POOL_SIZE: usize = 16;

        /// Request timeout used by the global store tests.
        pub GLOBAL_TEST_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
    }

    #[test]
    fn test_global_config() {
        let _lock = lock();
        reset_to_defaults().unwrap();

        assert_eq!(get(GLOBAL_TEST_POOL_SIZE).unwrap(), 16);
        set(GLOBAL_TEST_POOL_SIZE, 1024).unwrap();
        assert_eq!(get(GLOBAL_TEST_POOL_SIZE).unwrap(), 1024);
        assert_eq!(get_value("GLOBAL_TEST_POOL_SIZE").unwrap(), Value::Int(1024));

        reset_to_defaults().unwrap();
        assert_eq!(get(GLOBAL_TEST_POOL_SIZE).unwrap(), 16);
    }

    #[test]
    fn test_install_replaces_backend() {
        let _lock = lock();

        let replacement = Arc::new(
            MemoryStore::with_values([(
                "GLOBAL_TEST_REQUEST_TIMEOUT",
                Value::Duration(Duration::from_secs(5)),
            )])
            .unwrap(),
        );
        let previous = install(replacement);
        assert_eq!(
            get(GLOBAL_TEST_REQUEST_TIMEOUT).unwrap(),
            Duration::from_secs(5)
        );

        install(previous);
        assert_eq!(
            get(GLOBAL_TEST_REQUEST_TIMEOUT).unwrap(),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn test_unknown_key_propagates() {
        let _lock = lock();
        assert!(matches!(
            get_value("GLOBAL_TEST_UNDECLARED"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            set_value("GLOBAL_TEST_REQUEST_TIMEOUT", Value::Bool(true)),
            Err(ConfigError::TypeMismatch { .. })
        ));
    }

    fn locked_elsewhere() -> bool {
        std::thread::spawn(|| LOCK.try_lock().is_none())
            .join()
            .unwrap()
    }

    #[test]
    fn test_lock_is_reentrant() {
        let outer = lock();
        {
            let _inner = lock();
            assert!(locked_elsewhere());
        }
        assert!(locked_elsewhere());
        drop(outer);
    }

    #[test]
    fn test_lock_held_until_last_guard_drops() {
        let outer = lock();
        let inner = lock();
        drop(outer);
        assert!(locked_elsewhere());
        drop(inner);

        // Another thread can take the lock once it is released.
        std::thread::spawn(|| {
            let _lock = lock();
        })
        .join()
        .unwrap();
    }

    #[test]
    fn test_lock_survives_panic() {
        let result = std::thread::spawn(|| {
            let _lock = lock();
            panic!("test failed while holding the lock");
        })
        .join();
        assert!(result.is_err());
        let _lock = lock();
    }

    #[test]
    fn test_init_from_yaml() {
        let _lock = lock();
        reset_to_defaults().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("global.yaml");
        std::fs::write(&path, "GLOBAL_TEST_POOL_SIZE: 2048\n").unwrap();
        init_from_yaml(&path).unwrap();
        assert_eq!(get(GLOBAL_TEST_POOL_SIZE).unwrap(), 2048);

        reset_to_defaults().unwrap();
    }
}
