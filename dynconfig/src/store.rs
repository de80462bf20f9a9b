/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Configuration store backends.
//!
//! [`ConfigStore`] is the read/write seam every consumer goes
//! through: the global accessors, the loaders and the test override
//! utilities. [`MemoryStore`] is the in-process backend: explicitly
//! written values layered over the registry defaults.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use crate::error::ConfigError;
use crate::registry;
use crate::registry::ConfigDef;
use crate::value::Value;

/// Named-value access to a configuration backend.
pub trait ConfigStore: Send + Sync {
    /// Read the effective value of `name`.
    fn get(&self, name: &str) -> Result<Value, ConfigError>;

    /// Write `value` as the effective value of `name`.
    fn set(&self, name: &str, value: Value) -> Result<(), ConfigError>;

    /// Drop all explicitly written values, so that every key reads
    /// as its declared default. Backends that cannot do this report
    /// an error.
    fn reset(&self) -> Result<(), ConfigError> {
        Err(ConfigError::Backend(anyhow::anyhow!(
            "this store does not support reset"
        )))
    }
}

/// Look up `name` in the registry and check that `value` fits the
/// declared kind, returning the (possibly widened) value to store.
pub fn check_value(name: &str, value: Value) -> Result<(&'static ConfigDef, Value), ConfigError> {
    let def = registry::lookup(name).ok_or_else(|| ConfigError::UnknownKey(name.to_string()))?;
    let expected = def.kind();
    let actual = value.kind();
    match value.coerce(expected) {
        Some(value) => Ok((def, value)),
        None => Err(ConfigError::TypeMismatch {
            key: name.to_string(),
            expected,
            actual,
        }),
    }
}

/// An in-memory store: explicit values over registry defaults.
#[derive(Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with `values`, each checked against the
    /// registry.
    pub fn with_values<I, K>(values: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let store = Self::new();
        for (name, value) in values {
            store.set(name.as_ref(), value)?;
        }
        Ok(store)
    }

    /// Snapshot of the explicitly written values (defaults excluded).
    pub fn explicit_values(&self) -> HashMap<String, Value> {
        self.values.read().unwrap().clone()
    }
}

impl ConfigStore for MemoryStore {
    fn get(&self, name: &str) -> Result<Value, ConfigError> {
        if let Some(value) = self.values.read().unwrap().get(name) {
            return Ok(value.clone());
        }
        registry::lookup(name)
            .map(ConfigDef::default_value)
            .ok_or_else(|| ConfigError::UnknownKey(name.to_string()))
    }

    fn set(&self, name: &str, value: Value) -> Result<(), ConfigError> {
        let (def, value) = check_value(name, value)?;
        self.values
            .write()
            .unwrap()
            .insert(def.name.to_string(), value);
        Ok(())
    }

    fn reset(&self) -> Result<(), ConfigError> {
        self.values.write().unwrap().clear();
        Ok(())
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("values", &*self.values.read().unwrap())
            .finish()
    }
}
